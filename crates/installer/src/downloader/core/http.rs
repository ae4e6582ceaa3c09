//! HTTP utilities
//!
//! One client per installer, built with redirect-following disabled so the
//! resolver can inspect every hop, plus a streaming copy to disk.

use futures::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{Client, redirect};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;
use url::Url;

use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{
    FileOperation, NetworkFailure, PackError, ProgressCallback, ProgressEvent, Result,
    files::{atomic_rename, create_temp_path},
    progress::emit,
};

/// HTTP client with integrated download functionality
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    buffer_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client from download configuration
    pub fn from_config(config: &DownloadConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| PackError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
            field: None,
        })?;

        Ok(Self {
            client,
            buffer_size: config.copy_buffer_size,
        })
    }

    /// Probe a single hop and return its raw `Location` header, if any.
    ///
    /// Uses HEAD so no body is transferred; the status code is not inspected.
    pub async fn location_of(&self, url: &Url) -> Result<Option<String>> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| PackError::network(url.as_str(), e))?;

        let location = response
            .headers()
            .get(LOCATION)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

        debug!("Probed {} -> {} ({:?})", url, response.status(), location);
        Ok(location)
    }

    /// Stream `url` into `dest_path`, reporting progress along the way.
    ///
    /// The body is written to a `.part` sibling and renamed into place once
    /// complete. Returns the number of bytes written.
    pub async fn download_to_file(
        &self,
        url: &str,
        dest_path: &Path,
        progress_callback: &Option<ProgressCallback>,
    ) -> Result<u64> {
        debug!("Stream downloading: {} to {}", url, dest_path.display());

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PackError::file_system(parent, FileOperation::CreateDir, e))?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PackError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PackError::network(url, NetworkFailure::Status(status.as_u16())));
        }

        let total_size = response.content_length();
        emit(progress_callback, ProgressEvent::DownloadStarted {
            url: url.to_string(),
            total_size,
        });

        let temp_path = create_temp_path(dest_path);
        let file = fs::File::create(&temp_path)
            .await
            .map_err(|e| PackError::file_system(&temp_path, FileOperation::Create, e))?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        let start_time = std::time::Instant::now();
        let mut last_progress_time = start_time;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| PackError::network(url, e))?;

            writer
                .write_all(&chunk)
                .await
                .map_err(|e| PackError::file_system(&temp_path, FileOperation::Write, e))?;

            downloaded += chunk.len() as u64;

            // Report progress at most every 100ms to avoid spam
            let now = std::time::Instant::now();
            if now.duration_since(last_progress_time).as_millis() >= 100 {
                let elapsed = start_time.elapsed().as_secs_f64();
                let speed = if elapsed > 0.0 { downloaded as f64 / elapsed } else { 0.0 };
                emit(progress_callback, ProgressEvent::DownloadProgress {
                    url: url.to_string(),
                    downloaded,
                    total: total_size,
                    speed_bps: speed,
                });
                last_progress_time = now;
            }
        }

        writer
            .flush()
            .await
            .map_err(|e| PackError::file_system(&temp_path, FileOperation::Write, e))?;
        writer
            .get_ref()
            .sync_all()
            .await
            .map_err(|e| PackError::file_system(&temp_path, FileOperation::Write, e))?;
        drop(writer);

        atomic_rename(&temp_path, dest_path).await?;

        emit(progress_callback, ProgressEvent::DownloadComplete {
            url: url.to_string(),
            final_size: downloaded,
        });

        debug!("Stream download completed: {} bytes", downloaded);
        Ok(downloaded)
    }
}
