//! Error types for the modpack pipeline with context for logging and the CLI

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the pipeline can report.
///
/// A file the server reports as missing is not an error: it is surfaced as
/// [`crate::DownloadOutcome::MissingSkipped`] plus a warning event.
#[derive(Error, Debug)]
pub enum PackError {
    /// A URL (user input or redirect target) could not be parsed
    #[error("Malformed URL '{url}'")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The redirect chain did not terminate within the configured hop budget
    #[error("Too many redirects while resolving '{url}' (limit {limit})")]
    TooManyRedirects {
        url: String,
        limit: usize,
    },

    /// No usable filename after the last '/' of a URL
    #[error("URL '{url}' has no trailing filename: {reason}")]
    FilenamePatternMismatch {
        url: String,
        reason: String,
    },

    /// Manifest absent, unreadable, or missing its file list
    #[error("No usable manifest at '{path}': {reason}")]
    ManifestMissing {
        path: PathBuf,
        reason: String,
    },

    /// Transport-level failure or unexpected HTTP status
    #[error("Network I/O failed for '{url}'")]
    NetworkIo {
        url: String,
        #[source]
        source: NetworkFailure,
    },

    /// The downloaded pack archive could not be extracted
    #[error("Archive '{path}' is corrupt")]
    ArchiveCorrupt {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Local file system errors with file context
    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// A manifest path field points outside the extracted archive
    #[error("Manifest field '{field}' is not a plain relative path: '{value}'")]
    UnsafeManifestPath {
        field: String,
        value: String,
    },

    /// Another run is already active on this installer
    #[error("An install is already running")]
    AlreadyRunning,

    /// Configuration errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// A blocking worker (extraction, merge) panicked or was cancelled
    #[error("Background task for {stage} failed: {reason}")]
    BackgroundTask {
        stage: String,
        reason: String,
    },
}

/// Underlying cause of a [`PackError::NetworkIo`]
#[derive(Error, Debug)]
pub enum NetworkFailure {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("server answered HTTP {0}")]
    Status(u16),
}

/// Types of file operations for error context
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Read,
    Write,
    Create,
    Metadata,
    CreateDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Metadata => write!(f, "reading metadata"),
            FileOperation::CreateDir => write!(f, "creating directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackError>;

impl PackError {
    pub fn malformed_url<S: Into<String>>(url: S, source: url::ParseError) -> Self {
        PackError::MalformedUrl { url: url.into(), source }
    }

    pub fn network<S: Into<String>, E: Into<NetworkFailure>>(url: S, source: E) -> Self {
        PackError::NetworkIo { url: url.into(), source: source.into() }
    }

    pub fn file_system<P: Into<PathBuf>>(path: P, operation: FileOperation, source: std::io::Error) -> Self {
        PackError::FileSystem { path: path.into(), operation, source }
    }

    /// Get error category for logging and the CLI
    pub fn category(&self) -> &'static str {
        match self {
            PackError::MalformedUrl { .. } => "malformed_url",
            PackError::TooManyRedirects { .. } => "too_many_redirects",
            PackError::FilenamePatternMismatch { .. } => "filename_pattern_mismatch",
            PackError::ManifestMissing { .. } => "manifest_missing",
            PackError::NetworkIo { .. } => "network_io",
            PackError::ArchiveCorrupt { .. } => "archive_corrupt",
            PackError::FileSystem { .. } => "file_system",
            PackError::UnsafeManifestPath { .. } => "unsafe_manifest_path",
            PackError::AlreadyRunning => "already_running",
            PackError::Configuration { .. } => "configuration",
            PackError::BackgroundTask { .. } => "background_task",
        }
    }

    /// Get severity level for error prioritization
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PackError::AlreadyRunning => ErrorSeverity::Low,
            PackError::NetworkIo { .. } => ErrorSeverity::Medium,
            PackError::TooManyRedirects { .. } => ErrorSeverity::Medium,
            PackError::MalformedUrl { .. } => ErrorSeverity::High,
            PackError::FilenamePatternMismatch { .. } => ErrorSeverity::High,
            PackError::ManifestMissing { .. } => ErrorSeverity::High,
            PackError::UnsafeManifestPath { .. } => ErrorSeverity::Critical,
            PackError::ArchiveCorrupt { .. } => ErrorSeverity::High,
            PackError::Configuration { .. } => ErrorSeverity::High,
            PackError::BackgroundTask { .. } => ErrorSeverity::High,
            PackError::FileSystem { .. } => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            PackError::MalformedUrl { .. } => Some("Paste the full pack page URL, including http:// or https://"),
            PackError::TooManyRedirects { .. } => Some("The server keeps redirecting; try again later"),
            PackError::NetworkIo { .. } => Some("Check your internet connection and rerun; finished files are kept"),
            PackError::UnsafeManifestPath { .. } => Some("The pack manifest is not trustworthy; do not install this pack"),
            PackError::AlreadyRunning => Some("Wait for the current install to finish"),
            PackError::FileSystem { .. } => Some("Check permissions and free space in the output directory"),
            _ => None,
        }
    }
}

/// Error severity levels for prioritization
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl From<tokio::task::JoinError> for PackError {
    fn from(error: tokio::task::JoinError) -> Self {
        PackError::BackgroundTask {
            stage: "blocking worker".to_string(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn panicked_worker_becomes_background_task() {
        let handle: tokio::task::JoinHandle<()> = tokio::task::spawn_blocking(|| panic!("worker died"));
        let join_error = handle.await.unwrap_err();

        let err = PackError::from(join_error);

        assert!(matches!(err, PackError::BackgroundTask { .. }));
        assert_eq!(err.category(), "background_task");
    }

    #[test]
    fn local_damage_outranks_transient_failures() {
        let fs_error = PackError::file_system(
            "/tmp/x",
            FileOperation::Write,
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        let unsafe_path = PackError::UnsafeManifestPath {
            field: "overrides".to_string(),
            value: "/etc".to_string(),
        };

        assert_eq!(fs_error.severity(), ErrorSeverity::Critical);
        assert_eq!(unsafe_path.severity(), ErrorSeverity::Critical);
        assert!(PackError::AlreadyRunning.severity() < fs_error.severity());
        assert_eq!(fs_error.to_string(), "File operation failed on '/tmp/x' while writing");
    }
}
