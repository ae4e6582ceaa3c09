//! Progress reporting for pipeline runs
//!
//! Every run reports through an explicit callback handed to the installer, so
//! several runs can be observed independently without any global logger.

use std::fmt;
use std::sync::Arc;

use crate::pipeline::PipelineStage;

/// Progress callback for pipeline runs
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted during a run
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StageStarted {
        stage: PipelineStage,
    },
    Info {
        message: String,
    },
    Warning {
        message: String,
    },
    DownloadStarted {
        url: String,
        total_size: Option<u64>,
    },
    DownloadProgress {
        url: String,
        downloaded: u64,
        total: Option<u64>,
        speed_bps: f64,
    },
    DownloadComplete {
        url: String,
        final_size: u64,
    },
}

impl ProgressEvent {
    pub fn info<S: Into<String>>(message: S) -> Self {
        ProgressEvent::Info { message: message.into() }
    }

    pub fn warning<S: Into<String>>(message: S) -> Self {
        ProgressEvent::Warning { message: message.into() }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::StageStarted { stage } => write!(f, "{}", stage.description()),
            ProgressEvent::Info { message } => write!(f, "{}", message),
            ProgressEvent::Warning { message } => write!(f, "Warning: {}", message),
            ProgressEvent::DownloadStarted { url, total_size: Some(size) } => {
                write!(f, "Downloading {} ({} bytes)", url, size)
            }
            ProgressEvent::DownloadStarted { url, total_size: None } => write!(f, "Downloading {}", url),
            ProgressEvent::DownloadProgress { url, downloaded, total: Some(total), .. } if *total > 0 => {
                let percent = (*downloaded as f64 / *total as f64) * 100.0;
                write!(f, "{}: {:.1}% ({}/{} bytes)", url, percent, downloaded, total)
            }
            ProgressEvent::DownloadProgress { url, downloaded, .. } => {
                write!(f, "{}: {} bytes downloaded", url, downloaded)
            }
            ProgressEvent::DownloadComplete { url, final_size } => {
                write!(f, "Finished {} ({} bytes)", url, final_size)
            }
        }
    }
}

/// Send an event if a callback is attached
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}

/// Trait for progress reporting with more granular control
pub trait ProgressReporter: Send + Sync {
    fn on_stage_started(&self, _stage: PipelineStage) {}
    fn on_info(&self, _message: &str) {}
    fn on_warning(&self, _message: &str) {}
    fn on_download_started(&self, _url: &str, _total_size: Option<u64>) {}
    fn on_download_progress(&self, _url: &str, _downloaded: u64, _total: Option<u64>, _speed_bps: f64) {}
    fn on_download_complete(&self, _url: &str, _final_size: u64) {}
}

/// Extension trait to convert ProgressReporter to ProgressCallback
pub trait IntoProgressCallback {
    fn into_callback(self) -> ProgressCallback;
}

impl<T: ProgressReporter + 'static> IntoProgressCallback for T {
    fn into_callback(self) -> ProgressCallback {
        Arc::new(move |event| match event {
            ProgressEvent::StageStarted { stage } => self.on_stage_started(stage),
            ProgressEvent::Info { message } => self.on_info(&message),
            ProgressEvent::Warning { message } => self.on_warning(&message),
            ProgressEvent::DownloadStarted { url, total_size } => {
                self.on_download_started(&url, total_size);
            }
            ProgressEvent::DownloadProgress { url, downloaded, total, speed_bps } => {
                self.on_download_progress(&url, downloaded, total, speed_bps);
            }
            ProgressEvent::DownloadComplete { url, final_size } => {
                self.on_download_complete(&url, final_size);
            }
        })
    }
}

/// Line-oriented console reporter used by the CLI
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter {
    pub verbose: bool,
}

impl ConsoleProgressReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_stage_started(&self, stage: PipelineStage) {
        println!("==> {}", stage.description());
    }

    fn on_info(&self, message: &str) {
        println!("    {}", message);
    }

    fn on_warning(&self, message: &str) {
        eprintln!("    warning: {}", message);
    }

    fn on_download_started(&self, url: &str, total_size: Option<u64>) {
        if self.verbose {
            match total_size {
                Some(size) => println!("    fetching {} ({} bytes)", url, size),
                None => println!("    fetching {}", url),
            }
        }
    }

    fn on_download_progress(&self, url: &str, downloaded: u64, total: Option<u64>, speed_bps: f64) {
        if self.verbose {
            let speed_mb = speed_bps / 1_000_000.0;
            match total {
                Some(total) if total > 0 => {
                    let percent = (downloaded as f64 / total as f64) * 100.0;
                    println!("    {}: {:.1}% ({}/{} bytes, {:.1} MB/s)", url, percent, downloaded, total, speed_mb);
                }
                _ => println!("    {}: {} bytes ({:.1} MB/s)", url, downloaded, speed_mb),
            }
        }
    }

    fn on_download_complete(&self, url: &str, final_size: u64) {
        if self.verbose {
            println!("    done {} ({} bytes)", url, final_size);
        }
    }
}

/// Null progress reporter that does nothing
#[derive(Debug, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {}
