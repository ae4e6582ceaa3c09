//! Pack archive download and extraction

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::downloader::core::{
    progress::emit, FileOperation, HttpClient, PackError, ProgressCallback, ProgressEvent, Result,
};
use crate::install::scratch::ScratchSpace;

/// Name of the archive file kept in the pack's scratch dir
pub fn archive_file_name(pack_name: &str) -> String {
    if pack_name.ends_with(".zip") {
        pack_name.to_string()
    } else {
        format!("{}.zip", pack_name)
    }
}

/// Downloads a pack archive into scratch space and unpacks it there
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    http: HttpClient,
    scratch: Arc<ScratchSpace>,
}

impl ArchiveFetcher {
    pub fn new(http: HttpClient, scratch: Arc<ScratchSpace>) -> Self {
        Self { http, scratch }
    }

    /// Fetch `url` and extract it, returning the scratch dir holding the contents
    pub async fn fetch(
        &self,
        pack_name: &str,
        url: &str,
        progress_callback: &Option<ProgressCallback>,
    ) -> Result<PathBuf> {
        let scratch_dir = self.scratch.pack_dir(pack_name)?;
        let archive_path = scratch_dir.join(archive_file_name(pack_name));

        info!("Downloading pack archive {} to {}", url, archive_path.display());
        emit(progress_callback, ProgressEvent::info(format!("Downloading {}", pack_name)));
        self.http.download_to_file(url, &archive_path, progress_callback).await?;

        let dest = scratch_dir.clone();
        let entries = tokio::task::spawn_blocking(move || extract_archive(&archive_path, &dest)).await??;

        emit(
            progress_callback,
            ProgressEvent::info(format!("Extracted {} entries from {}", entries, pack_name)),
        );
        Ok(scratch_dir)
    }
}

/// Unpack every entry of `archive_path` under `dest`.
///
/// Entries whose names would land outside `dest` are skipped. Returns the
/// number of entries written.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .map_err(|e| PackError::file_system(archive_path, FileOperation::Read, e))?;
    let corrupt = |source| PackError::ArchiveCorrupt {
        path: archive_path.to_path_buf(),
        source,
    };
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(corrupt)?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(corrupt)?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| PackError::file_system(&out_path, FileOperation::CreateDir, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PackError::file_system(parent, FileOperation::CreateDir, e))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| PackError::file_system(&out_path, FileOperation::Create, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| corrupt(zip::result::ZipError::Io(e)))?;

        debug!("Extracted {}", out_path.display());
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::test_support::build_zip;
    use crate::DownloadConfig;
    use tempfile::tempdir;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn archive_name_appends_zip_once() {
        assert_eq!(archive_file_name("pack-1.0.zip"), "pack-1.0.zip");
        assert_eq!(archive_file_name("pack-1.0"), "pack-1.0.zip");
    }

    #[test]
    fn extracts_nested_entries() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("pack.zip");
        std::fs::write(
            &archive,
            build_zip(&[("manifest.json", b"{}"), ("overrides/config/a.cfg", b"a=1")]),
        )
        .unwrap();

        let written = extract_archive(&archive, temp.path()).unwrap();

        assert_eq!(written, 2);
        assert_eq!(std::fs::read(temp.path().join("overrides/config/a.cfg")).unwrap(), b"a=1");
        assert!(temp.path().join("manifest.json").is_file());
    }

    #[test]
    fn escaping_entries_are_skipped() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        let archive = temp.path().join("pack.zip");
        std::fs::write(&archive, build_zip(&[("../evil.txt", b"x"), ("ok.txt", b"y")])).unwrap();

        let written = extract_archive(&archive, &dest).unwrap();

        assert_eq!(written, 1);
        assert!(!temp.path().join("evil.txt").exists());
        assert!(dest.join("ok.txt").exists());
    }

    #[test]
    fn garbage_is_archive_corrupt() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("pack.zip");
        std::fs::write(&archive, b"definitely not a zip file").unwrap();

        let err = extract_archive(&archive, temp.path()).unwrap_err();
        assert!(matches!(err, PackError::ArchiveCorrupt { .. }));
    }

    #[tokio::test]
    async fn fetch_downloads_and_extracts_into_scratch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dl/cool-pack-1.0.zip"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(build_zip(&[("manifest.json", b"{\"files\":[]}")])),
            )
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let http = HttpClient::from_config(&DownloadConfig::default()).unwrap();
        let fetcher = ArchiveFetcher::new(http, Arc::new(ScratchSpace::new(temp.path())));

        let dir = fetcher
            .fetch("cool-pack-1.0.zip", &format!("{}/dl/cool-pack-1.0.zip", server.uri()), &None)
            .await
            .unwrap();

        assert_eq!(dir, temp.path().join("cool-pack-1.0.zip"));
        assert!(dir.join("cool-pack-1.0.zip").is_file());
        assert!(dir.join("manifest.json").is_file());
    }
}
