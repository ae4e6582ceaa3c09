//! Modpack Installer Library
//!
//! This library installs CurseForge-style modpacks: it follows a listing URL
//! to the newest pack archive, unpacks it, downloads every mod named in the
//! pack manifest, merges the pack's overrides and can write a launcher
//! `instance.cfg` next to the installation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use modpack_installer::{ConsoleProgressReporter, DownloadConfig, Installer};
//!
//! # async fn example() -> modpack_installer::Result<()> {
//! // Defaults, overridable through MODPACK_DL_* variables
//! let config = DownloadConfig::from_env()?;
//!
//! let installer = Installer::new(config)?.with_progress(ConsoleProgressReporter::new(false));
//!
//! // Remove extracted archives when we are done
//! let _cleanup = installer.scratch().cleanup_guard();
//!
//! let report = installer
//!     .run("https://minecraft.curseforge.com/projects/some-pack", true)
//!     .await?;
//! println!(
//!     "Installed {} ({} mods downloaded) into {}",
//!     report.manifest.display_name(),
//!     report.downloads.downloaded(),
//!     report.output_dir.display()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Redirect resolution**: bounded, hop-by-hop `Location` following
//! - **Resumable installs**: existing mods are never fetched again and overrides never overwrite
//! - **Progress tracking**: per-run stage, warning and byte-level events
//! - **Launcher config**: optional MultiMC-style `instance.cfg`

pub mod downloader;
pub mod install;
pub mod manifest;
pub mod pipeline;

// Re-export commonly used types for convenience
pub use downloader::{
    ConsoleProgressReporter, DownloadConfig, DownloadConfigBuilder, DownloadOutcome, DownloadSummary,
    IntoProgressCallback, NullProgressReporter, PackError, ProgressCallback, ProgressEvent,
    ProgressReporter, Result,
};
pub use install::{MergeOutcome, MergeReport, ScratchCleanupGuard, ScratchSpace};
pub use manifest::{FileEntry, Manifest};
pub use pipeline::{InstallReport, Installer, PipelineStage};
