//! Downloader module
//!
//! Redirect resolution, filename extraction and the per-entry mod
//! downloads, on top of the shared core types and configuration.

pub mod config;
pub mod core;
pub mod filename;
pub mod mods;
pub mod redirect;

// Re-export main types for convenience
pub use config::{DownloadConfig, DownloadConfigBuilder};
pub use core::{
    ConsoleProgressReporter, DownloadOutcome, DownloadSummary, ErrorSeverity, FileOperation,
    HttpClient, IntoProgressCallback, NetworkFailure, NullProgressReporter, PackError,
    ProgressCallback, ProgressEvent, ProgressReporter, ResolvedFile, Result,
};
pub use filename::extract_filename;
pub use mods::{ModDownloader, MISSING_FILE_MARKER};
pub use redirect::RedirectResolver;

#[cfg(test)]
mod tests;
