//! Configuration types for the pipeline

use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::core::{PackError, Result};

/// Prefix shared by all environment overrides
pub const ENV_PREFIX: &str = "MODPACK_DL_";

/// Configuration for one installer
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub user_agent: String,
    /// Per-request timeout; `None` keeps the transport defaults
    pub timeout: Option<Duration>,
    /// Maximum redirect hops followed for a single resolution
    pub max_redirects: usize,
    /// Project page base; the numeric project id is appended as a path segment
    pub project_base_url: String,
    /// Appended to the listing URL to reach the newest pack archive
    pub listing_suffix: String,
    /// Root holding per-pack scratch directories; defaults to the system temp dir
    pub scratch_root: Option<PathBuf>,
    /// Where installations are created; defaults to the executable's directory
    pub output_root: Option<PathBuf>,
    /// Name written into the launcher config notes
    pub tool_name: String,
    /// Write buffer size for streamed downloads
    pub copy_buffer_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: "modpack-dl/0.1.0".to_string(),
            timeout: None,
            max_redirects: 20,
            project_base_url: "http://minecraft.curseforge.com/projects".to_string(),
            listing_suffix: "/files/latest".to_string(),
            scratch_root: None,
            output_root: None,
            tool_name: "modpack-dl".to_string(),
            copy_buffer_size: 4096,
        }
    }
}

impl DownloadConfig {
    pub fn builder() -> DownloadConfigBuilder {
        DownloadConfigBuilder::default()
    }

    /// Defaults overridden by `MODPACK_DL_*` variables (a `.env` file is honoured)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `MODPACK_DL_*` key
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = var("USER_AGENT") {
            config.user_agent = value;
        }
        if let Some(value) = var("TIMEOUT_SECS") {
            let secs = parse_number::<u64>("TIMEOUT_SECS", &value)?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(value) = var("MAX_REDIRECTS") {
            config.max_redirects = parse_number("MAX_REDIRECTS", &value)?;
        }
        if let Some(value) = var("PROJECT_BASE_URL") {
            config.project_base_url = value;
        }
        if let Some(value) = var("LISTING_SUFFIX") {
            config.listing_suffix = value;
        }
        if let Some(value) = var("COPY_BUFFER_SIZE") {
            config.copy_buffer_size = parse_number("COPY_BUFFER_SIZE", &value)?;
        }
        if let Some(value) = var("SCRATCH_ROOT") {
            config.scratch_root = Some(PathBuf::from(value));
        }
        if let Some(value) = var("OUTPUT_ROOT") {
            config.output_root = Some(PathBuf::from(value));
        }
        if let Some(value) = var("TOOL_NAME") {
            config.tool_name = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_redirects == 0 {
            return Err(PackError::Configuration {
                message: "max_redirects must be at least 1".to_string(),
                field: Some("max_redirects".to_string()),
            });
        }
        if self.copy_buffer_size == 0 {
            return Err(PackError::Configuration {
                message: "copy_buffer_size must be non-zero".to_string(),
                field: Some("copy_buffer_size".to_string()),
            });
        }
        url::Url::parse(&self.project_base_url).map_err(|e| PackError::Configuration {
            message: format!("project_base_url '{}' is not a URL: {}", self.project_base_url, e),
            field: Some("project_base_url".to_string()),
        })?;
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| PackError::Configuration {
        message: format!("{}{} must be a number, got '{}'", ENV_PREFIX, name, value),
        field: Some(name.to_lowercase()),
    })
}

/// Fluent builder for [`DownloadConfig`]
#[derive(Debug, Default)]
pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl DownloadConfigBuilder {
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    pub fn project_base_url<S: Into<String>>(mut self, base: S) -> Self {
        self.config.project_base_url = base.into();
        self
    }

    pub fn listing_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.config.listing_suffix = suffix.into();
        self
    }

    pub fn scratch_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.config.scratch_root = Some(root.into());
        self
    }

    pub fn output_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.config.output_root = Some(root.into());
        self
    }

    pub fn tool_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.tool_name = name.into();
        self
    }

    pub fn copy_buffer_size(mut self, size: usize) -> Self {
        self.config.copy_buffer_size = size;
        self
    }

    pub fn build(self) -> Result<DownloadConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
