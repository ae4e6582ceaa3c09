//! `instance.cfg` for MultiMC-style launchers

use std::path::{Path, PathBuf};
use tracing::info;

use crate::downloader::core::{FileOperation, PackError, Result};
use crate::manifest::Manifest;

pub const LAUNCHER_CONFIG_FILE_NAME: &str = "instance.cfg";

/// Render the config; every line is `key=value` and newline-terminated
pub fn render_launcher_config(manifest: &Manifest, tool_name: &str) -> String {
    let lines = [
        "InstanceType=OneSix".to_string(),
        format!("IntendedVersion={}", manifest.minecraft.version),
        "LogPrePostOutput=true".to_string(),
        "OverrideCommands=false".to_string(),
        "OverrideConsole=false".to_string(),
        "OverrideJavaArgs=false".to_string(),
        "OverrideJavaLocation=false".to_string(),
        "OverrideMemory=false".to_string(),
        "OverrideWindow=false".to_string(),
        "iconKey=default".to_string(),
        "lastLaunchTime=0".to_string(),
        format!("name={}", manifest.display_name()),
        format!(
            "notes=Modpack by {}. Generated by {}. Using Forge {}.",
            manifest.author,
            tool_name,
            manifest.forge_version()
        ),
        "totalTimePlayed=0".to_string(),
    ];

    let mut out = String::new();
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Write `instance.cfg` into `output_dir`, replacing any previous one
pub async fn emit_launcher_config(manifest: &Manifest, output_dir: &Path, tool_name: &str) -> Result<PathBuf> {
    let path = output_dir.join(LAUNCHER_CONFIG_FILE_NAME);
    tokio::fs::write(&path, render_launcher_config(manifest, tool_name))
        .await
        .map_err(|e| PackError::file_system(&path, FileOperation::Write, e))?;

    info!("Wrote launcher config {}", path.display());
    Ok(path)
}
