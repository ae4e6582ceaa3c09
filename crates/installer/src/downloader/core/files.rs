//! File operation utilities shared by the downloaders

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::downloader::core::{FileOperation, PackError, Result};

/// Return the size of whatever already sits at `dest_path`, if anything.
///
/// Presence alone counts: no size or content comparison is made, so a
/// different remote file that shares the name is never fetched. A directory
/// with the name counts as present too.
pub async fn existing_file_size(dest_path: &Path) -> Result<Option<u64>> {
    match fs::metadata(dest_path).await {
        Ok(metadata) => {
            debug!("Entry already exists: {} ({} bytes)", dest_path.display(), metadata.len());
            Ok(Some(metadata.len()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PackError::file_system(dest_path, FileOperation::Metadata, e)),
    }
}

/// Temporary sibling path used while a download is in flight
pub fn create_temp_path(dest_path: &Path) -> PathBuf {
    let mut name = dest_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest_path.with_file_name(name)
}

/// Rename a finished temporary file to its final destination
pub async fn atomic_rename(temp_path: &Path, dest_path: &Path) -> Result<()> {
    fs::rename(temp_path, dest_path)
        .await
        .map_err(|e| PackError::file_system(dest_path, FileOperation::Write, e))?;
    debug!("Renamed {} to {}", temp_path.display(), dest_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temp_path_keeps_full_name() {
        let temp = create_temp_path(Path::new("/mods/cool-mod-1.0.jar"));
        assert_eq!(temp, PathBuf::from("/mods/cool-mod-1.0.jar.part"));
    }

    #[tokio::test]
    async fn existing_file_size_reports_presence() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.jar");

        assert_eq!(existing_file_size(&file).await.unwrap(), None);
        tokio::fs::write(&file, b"abc").await.unwrap();
        assert_eq!(existing_file_size(&file).await.unwrap(), Some(3));
        assert!(existing_file_size(dir.path()).await.unwrap().is_some());
    }
}
