//! Manifest file downloads
//!
//! Each entry is turned into a concrete file URL with two redirect
//! resolutions:
//!
//! ```text
//! <project base>/<projectID>          --resolve-->  canonical project page
//! <project page>/files/<fileID>/download  --resolve-->  binary URL
//! ```
//!
//! Entries are processed one at a time in manifest order.

use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{
    files::existing_file_size, progress::emit, DownloadOutcome, DownloadSummary, FileOperation,
    HttpClient, PackError, ProgressCallback, ProgressEvent, ResolvedFile, Result,
};
use crate::downloader::filename::{decode, trailing_segment};
use crate::downloader::redirect::RedirectResolver;
use crate::manifest::{FileEntry, Manifest};

/// Query left on project URLs by the cookie check during resolution
const COOKIE_TEST_QUERY: &str = "?cookieTest=1";

/// A final filename with this suffix means the server has no such file
pub const MISSING_FILE_MARKER: &str = "cookieTest=1";

/// Downloads every file listed in a manifest into a mods directory
#[derive(Debug, Clone)]
pub struct ModDownloader {
    http: HttpClient,
    resolver: RedirectResolver,
    project_base_url: String,
}

impl ModDownloader {
    pub fn new(http: HttpClient, config: &DownloadConfig) -> Self {
        let resolver = RedirectResolver::new(http.clone(), config.max_redirects);
        Self {
            http,
            resolver,
            project_base_url: config.project_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Project page URL before resolution
    pub fn project_url(&self, entry: &FileEntry) -> String {
        format!("{}/{}", self.project_base_url, entry.project_id)
    }

    /// Work out the binary URL and filename for `entry`.
    ///
    /// Returns `Ok(None)` when the server signals that the file is missing.
    pub async fn resolve_entry(&self, entry: &FileEntry) -> Result<Option<ResolvedFile>> {
        let project = self.resolver.resolve(&self.project_url(entry)).await?;
        let project = project.as_str().replace(COOKIE_TEST_QUERY, "");

        let download_url = format!("{}/files/{}/download", project.trim_end_matches('/'), entry.file_id);
        let final_url = self.resolver.resolve(&download_url).await?.to_string();

        let filename = decode(&final_url, trailing_segment(&final_url)?)?;
        if filename.ends_with(MISSING_FILE_MARKER) {
            return Ok(None);
        }
        if filename.contains(['/', '\\']) || filename == ".." {
            return Err(PackError::FilenamePatternMismatch {
                url: final_url,
                reason: format!("decoded filename '{}' is not a plain file name", filename),
            });
        }

        debug!("Entry {} resolved to {} ({})", entry, filename, final_url);
        Ok(Some(ResolvedFile {
            entry: *entry,
            final_url,
            filename,
        }))
    }

    /// Resolve and, unless already present, download one entry
    pub async fn download_entry(
        &self,
        entry: &FileEntry,
        mods_dir: &Path,
        progress_callback: &Option<ProgressCallback>,
    ) -> Result<DownloadOutcome> {
        let Some(resolved) = self.resolve_entry(entry).await? else {
            warn!("File {} is missing on the server, skipping", entry);
            emit(
                progress_callback,
                ProgressEvent::warning(format!("Missing file {}, it will be skipped!", entry)),
            );
            return Ok(DownloadOutcome::MissingSkipped { entry: *entry });
        };

        let dest_path = mods_dir.join(&resolved.filename);
        if existing_file_size(&dest_path).await?.is_some() {
            info!("{} already exists, not downloading", resolved.filename);
            emit(
                progress_callback,
                ProgressEvent::info(format!(
                    "The mod {} already exists. It will not be downloaded",
                    resolved.filename
                )),
            );
            return Ok(DownloadOutcome::AlreadyPresent { filename: resolved.filename });
        }

        emit(progress_callback, ProgressEvent::info(format!("Downloading {}", resolved.filename)));
        let bytes = self
            .http
            .download_to_file(&resolved.final_url, &dest_path, progress_callback)
            .await?;

        Ok(DownloadOutcome::Downloaded {
            filename: resolved.filename,
            bytes,
        })
    }

    /// Download every manifest entry, in document order, into `mods_dir`.
    ///
    /// A missing file is skipped with a warning; any other error stops the
    /// loop and is returned, leaving earlier downloads in place.
    pub async fn download_all(
        &self,
        manifest: &Manifest,
        mods_dir: &Path,
        progress_callback: &Option<ProgressCallback>,
    ) -> Result<DownloadSummary> {
        let total = manifest.files.len();
        info!("Manifest contains {} files to download", total);
        emit(
            progress_callback,
            ProgressEvent::info(format!("Manifest contains {} files to download", total)),
        );

        fs::create_dir_all(mods_dir)
            .await
            .map_err(|e| PackError::file_system(mods_dir, FileOperation::CreateDir, e))?;

        let mut summary = DownloadSummary::default();
        for (index, entry) in manifest.files.iter().enumerate() {
            debug!("[{}/{}] processing {}", index + 1, total, entry);
            let outcome = self.download_entry(entry, mods_dir, progress_callback).await?;
            summary.outcomes.push(outcome);
        }

        info!(
            "Mod downloads complete: {} downloaded, {} already present, {} missing",
            summary.downloaded(),
            summary.already_present(),
            summary.missing()
        );
        Ok(summary)
    }
}
