//! Manifest document loading

use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::downloader::core::{PackError, Result};
use crate::manifest::model::Manifest;

/// Name of the manifest document at the root of a pack archive
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Parse a manifest document; `path` only labels errors
pub fn parse_manifest(json: &str, path: &Path) -> Result<Manifest> {
    serde_json::from_str(json).map_err(|e| PackError::ManifestMissing {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load `manifest.json` from `dir`
pub async fn load_manifest(dir: &Path) -> Result<Manifest> {
    let path = dir.join(MANIFEST_FILE_NAME);

    let json = match fs::read_to_string(&path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PackError::ManifestMissing {
                path,
                reason: "this pack has no manifest".to_string(),
            });
        }
        Err(e) => {
            return Err(PackError::ManifestMissing {
                path,
                reason: e.to_string(),
            });
        }
    };

    info!("Reading pack manifest {}", path.display());
    let manifest = parse_manifest(&json, &path)?;
    debug!(
        "Manifest '{}' {} lists {} files for Minecraft {}",
        manifest.name,
        manifest.version,
        manifest.files.len(),
        manifest.minecraft.version
    );
    Ok(manifest)
}
