//! Install pipeline
//!
//! ```text
//! ResolveListingUrl -> FetchArchive -> LoadManifest -> PrepareOutputDirs
//!     -> DownloadAllFiles -> MergeOverrides -> [EmitLauncherConfig]
//! ```
//!
//! Stages run strictly one after another. The first failing stage ends the
//! run; whatever earlier stages wrote stays on disk and a rerun picks up from
//! there, since downloads skip files that already exist and the merge never
//! overwrites.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{
    progress::emit, DownloadSummary, FileOperation, HttpClient, IntoProgressCallback, PackError,
    ProgressCallback, ProgressEvent, Result,
};
use crate::downloader::filename::{decode, trailing_segment};
use crate::downloader::mods::ModDownloader;
use crate::downloader::redirect::RedirectResolver;
use crate::install::{emit_launcher_config, merge_overrides, ArchiveFetcher, MergeReport, ScratchSpace};
use crate::manifest::{load_manifest, Manifest};

/// Game directory inside an installation
pub const MINECRAFT_DIR_NAME: &str = "minecraft";
/// Mods directory inside [`MINECRAFT_DIR_NAME`]
pub const MODS_DIR_NAME: &str = "mods";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    ResolveListingUrl,
    FetchArchive,
    LoadManifest,
    PrepareOutputDirs,
    DownloadAllFiles,
    MergeOverrides,
    EmitLauncherConfig,
}

impl PipelineStage {
    pub fn description(&self) -> &'static str {
        match self {
            PipelineStage::ResolveListingUrl => "Resolving modpack URL",
            PipelineStage::FetchArchive => "Downloading modpack archive",
            PipelineStage::LoadManifest => "Reading manifest",
            PipelineStage::PrepareOutputDirs => "Preparing output directories",
            PipelineStage::DownloadAllFiles => "Downloading mods",
            PipelineStage::MergeOverrides => "Copying overrides",
            PipelineStage::EmitLauncherConfig => "Writing launcher config",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Raw archive name taken from the resolved URL
    pub pack_name: String,
    pub output_dir: PathBuf,
    pub manifest: Manifest,
    pub downloads: DownloadSummary,
    pub merge: MergeReport,
    pub launcher_config: Option<PathBuf>,
}

/// URL whose redirect chain ends at the newest pack archive
pub fn listing_archive_url(listing_url: &str, suffix: &str) -> String {
    let trimmed = listing_url.trim();
    let base = trimmed.strip_suffix('/').unwrap_or(trimmed);
    format!("{}{}", base, suffix)
}

/// Installation directory name for a raw pack name: decoded, `.zip` dropped
pub fn output_dir_name(pack_name: &str) -> Result<String> {
    let decoded = decode(pack_name, pack_name)?;
    let name = decoded.strip_suffix(".zip").unwrap_or(&decoded);

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(PackError::FilenamePatternMismatch {
            url: pack_name.to_string(),
            reason: format!("'{}' cannot be used as an installation directory", name),
        });
    }
    Ok(name.to_string())
}

/// Overrides tree inside the extracted archive, `None` when the manifest names none.
///
/// Only plain relative paths are accepted; absolute paths and `..` parts are
/// rejected so the merge never reads outside the archive.
pub fn overrides_source(scratch_dir: &Path, overrides: &str) -> Result<Option<PathBuf>> {
    if overrides.is_empty() {
        return Ok(None);
    }

    let relative = Path::new(overrides);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !plain {
        return Err(PackError::UnsafeManifestPath {
            field: "overrides".to_string(),
            value: overrides.to_string(),
        });
    }
    Ok(Some(scratch_dir.join(relative)))
}

/// Directory holding the running executable
pub fn default_output_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| PackError::Configuration {
        message: format!("Cannot locate the running executable: {}", e),
        field: Some("output_root".to_string()),
    })?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| PackError::Configuration {
        message: format!("Executable {} has no parent directory", exe.display()),
        field: Some("output_root".to_string()),
    })
}

/// Held while a run is active; releases the gate on drop
struct RunToken<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunToken<'a> {
    fn acquire(running: &'a AtomicBool) -> Result<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PackError::AlreadyRunning)?;
        Ok(Self { running })
    }
}

impl Drop for RunToken<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Installs modpacks from listing URLs.
///
/// Clones share the run gate, so at most one run is active across all of
/// them at any time.
#[derive(Clone)]
pub struct Installer {
    config: DownloadConfig,
    resolver: RedirectResolver,
    mods: ModDownloader,
    fetcher: ArchiveFetcher,
    scratch: Arc<ScratchSpace>,
    progress: Option<ProgressCallback>,
    running: Arc<AtomicBool>,
}

impl fmt::Debug for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Installer")
            .field("config", &self.config)
            .field("scratch", &self.scratch.root())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Installer {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        config.validate()?;

        let http = HttpClient::from_config(&config)?;
        let scratch = match &config.scratch_root {
            Some(root) => Arc::new(ScratchSpace::new(root.clone())),
            None => ScratchSpace::global(),
        };

        Ok(Self {
            resolver: RedirectResolver::new(http.clone(), config.max_redirects),
            mods: ModDownloader::new(http.clone(), &config),
            fetcher: ArchiveFetcher::new(http, scratch.clone()),
            scratch,
            progress: None,
            running: Arc::new(AtomicBool::new(false)),
            config,
        })
    }

    /// Attach a progress sink (a closure-backed callback or any [`crate::ProgressReporter`])
    pub fn with_progress<P: IntoProgressCallback>(mut self, progress: P) -> Self {
        self.progress = Some(progress.into_callback());
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Scratch space this installer extracts archives into
    pub fn scratch(&self) -> &Arc<ScratchSpace> {
        &self.scratch
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Install the newest pack behind `listing_url`.
    ///
    /// Fails with [`PackError::AlreadyRunning`] while another run on this
    /// installer (or a clone of it) is active.
    pub async fn run(&self, listing_url: &str, generate_launcher_config: bool) -> Result<InstallReport> {
        let _token = RunToken::acquire(&self.running)?;

        let result = self.run_stages(listing_url, generate_launcher_config).await;
        match &result {
            Ok(report) => {
                info!("Installed {} into {}", report.manifest.display_name(), report.output_dir.display());
                emit(
                    &self.progress,
                    ProgressEvent::info(format!("Done! Installed to {}", report.output_dir.display())),
                );
            }
            Err(e) => error!("Install failed [{}]: {}", e.category(), e),
        }
        result
    }

    /// Drive one run to completion on a private current-thread runtime.
    ///
    /// Meant for a dedicated background thread; calling it from inside an
    /// async context panics, as with any nested Tokio runtime.
    pub fn run_blocking(&self, listing_url: &str, generate_launcher_config: bool) -> Result<InstallReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PackError::BackgroundTask {
                stage: "runtime startup".to_string(),
                reason: e.to_string(),
            })?;
        runtime.block_on(self.run(listing_url, generate_launcher_config))
    }

    fn stage(&self, stage: PipelineStage) {
        info!("{}", stage.description());
        emit(&self.progress, ProgressEvent::StageStarted { stage });
    }

    async fn run_stages(&self, listing_url: &str, generate_launcher_config: bool) -> Result<InstallReport> {
        self.stage(PipelineStage::ResolveListingUrl);
        let archive_url = self
            .resolver
            .resolve(&listing_archive_url(listing_url, &self.config.listing_suffix))
            .await?;
        let pack_name = trailing_segment(archive_url.as_str())?.to_string();
        emit(&self.progress, ProgressEvent::info(format!("Modpack file is {}", pack_name)));

        self.stage(PipelineStage::FetchArchive);
        let scratch_dir = self.fetcher.fetch(&pack_name, archive_url.as_str(), &self.progress).await?;

        self.stage(PipelineStage::LoadManifest);
        let manifest = load_manifest(&scratch_dir).await?;
        emit(
            &self.progress,
            ProgressEvent::info(format!("Modpack is {} by {}", manifest.display_name(), manifest.author)),
        );
        let overrides = overrides_source(&scratch_dir, &manifest.overrides)?;

        self.stage(PipelineStage::PrepareOutputDirs);
        let output_root = match &self.config.output_root {
            Some(root) => root.clone(),
            None => default_output_root()?,
        };
        let output_dir = output_root.join(output_dir_name(&pack_name)?);
        let minecraft_dir = output_dir.join(MINECRAFT_DIR_NAME);
        tokio::fs::create_dir_all(&minecraft_dir)
            .await
            .map_err(|e| PackError::file_system(&minecraft_dir, FileOperation::CreateDir, e))?;
        emit(
            &self.progress,
            ProgressEvent::info(format!("Output directory is {}", output_dir.display())),
        );

        self.stage(PipelineStage::DownloadAllFiles);
        let downloads = self
            .mods
            .download_all(&manifest, &minecraft_dir.join(MODS_DIR_NAME), &self.progress)
            .await?;

        self.stage(PipelineStage::MergeOverrides);
        let merge = if let Some(source) = overrides {
            let dest = minecraft_dir.clone();
            let report = tokio::task::spawn_blocking(move || merge_overrides(&source, &dest))
                .await
                .map_err(|e| PackError::BackgroundTask {
                    stage: "overrides merge".to_string(),
                    reason: e.to_string(),
                })?;
            for failed in report.failures() {
                emit(
                    &self.progress,
                    ProgressEvent::warning(format!("Could not copy override {}", failed.path.display())),
                );
            }
            report
        } else {
            warn!("Manifest names no overrides directory, skipping merge");
            emit(&self.progress, ProgressEvent::warning("No overrides directory in manifest"));
            MergeReport::default()
        };

        let launcher_config = if generate_launcher_config {
            self.stage(PipelineStage::EmitLauncherConfig);
            Some(emit_launcher_config(&manifest, &output_dir, &self.config.tool_name).await?)
        } else {
            None
        };

        Ok(InstallReport {
            pack_name,
            output_dir,
            manifest,
            downloads,
            merge,
            launcher_config,
        })
    }
}
