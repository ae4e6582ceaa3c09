//! Core types used throughout the downloader system
//!
//! This module contains the fundamental types that all other modules depend on.

pub mod error;
pub mod files;
pub mod http;
pub mod progress;

// Re-export main types for convenience
pub use error::{ErrorSeverity, FileOperation, NetworkFailure, PackError, Result};
pub use http::HttpClient;
pub use progress::{
    ConsoleProgressReporter, IntoProgressCallback, NullProgressReporter, ProgressCallback,
    ProgressEvent, ProgressReporter,
};

use crate::manifest::FileEntry;

/// A manifest entry whose download location has been worked out.
///
/// Transient: built per entry and dropped after the download attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    pub entry: FileEntry,
    pub final_url: String,
    pub filename: String,
}

/// Result of processing one manifest entry
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    /// File was fetched into the mods directory
    Downloaded { filename: String, bytes: u64 },
    /// A file with the same name was already present; nothing was fetched
    AlreadyPresent { filename: String },
    /// The server reported the file as missing; the entry was skipped
    MissingSkipped { entry: FileEntry },
}

/// Ordered outcomes of a full manifest download
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSummary {
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadSummary {
    pub fn downloaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DownloadOutcome::Downloaded { .. }))
            .count()
    }

    pub fn already_present(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DownloadOutcome::AlreadyPresent { .. }))
            .count()
    }

    pub fn missing(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DownloadOutcome::MissingSkipped { .. }))
            .count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                DownloadOutcome::Downloaded { bytes, .. } => *bytes,
                _ => 0,
            })
            .sum()
    }
}
