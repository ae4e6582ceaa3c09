//! Unit tests for manifest downloads against a mock project server

use super::*;
use crate::manifest::{FileEntry, Manifest, MinecraftTarget};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Helper struct to capture progress events during testing
#[derive(Debug, Default)]
struct ProgressCapture {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressCapture {
    fn new() -> Self {
        Self::default()
    }

    fn get_callback(&self) -> Option<ProgressCallback> {
        let events = self.events.clone();
        Some(Arc::new(move |event: ProgressEvent| {
            events.lock().unwrap().push(event);
        }))
    }

    fn warnings(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Warning { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn count_downloads_started(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, ProgressEvent::DownloadStarted { .. }))
            .count()
    }
}

fn downloader_for(server: &MockServer) -> ModDownloader {
    let config = DownloadConfig::builder()
        .project_base_url(format!("{}/projects", server.uri()))
        .build()
        .unwrap();
    let http = HttpClient::from_config(&config).unwrap();
    ModDownloader::new(http, &config)
}

fn manifest_with(files: Vec<FileEntry>) -> Manifest {
    Manifest {
        minecraft: MinecraftTarget::default(),
        manifest_type: "minecraftModpack".to_string(),
        manifest_version: "1".to_string(),
        name: "Test Pack".to_string(),
        version: "1.0".to_string(),
        author: "tester".to_string(),
        project_id: 1,
        files,
        overrides: "overrides".to_string(),
    }
}

fn entry(project_id: u32, file_id: u32) -> FileEntry {
    FileEntry { project_id, file_id, required: true }
}

async fn head_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("HEAD"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", to))
        .mount(server)
        .await;
}

async fn head_ok(server: &MockServer, at: &str) {
    Mock::given(method("HEAD"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Mount the project lookup for `project_id`, landing on `/mods/<slug>`
async fn mount_project(server: &MockServer, project_id: u32, slug: &str) {
    head_redirect(
        server,
        &format!("/projects/{}", project_id),
        &format!("/mods/{}?cookieTest=1", slug),
    )
    .await;
    head_ok(server, &format!("/mods/{}", slug)).await;
}

/// Mount the file lookup and the binary itself
async fn mount_file(server: &MockServer, slug: &str, file_id: u32, filename: &str) -> String {
    let binary_path = format!("/cdn/{}/{}", file_id, filename);
    head_redirect(
        server,
        &format!("/mods/{}/files/{}/download", slug, file_id),
        &format!("{}{}", server.uri(), binary_path),
    )
    .await;
    head_ok(server, &binary_path).await;
    binary_path
}

#[tokio::test]
async fn downloads_resolved_file_into_mods_dir() {
    let server = MockServer::start().await;
    mount_project(&server, 100, "cool-mod").await;
    let binary = mount_file(&server, "cool-mod", 200, "cool-mod-1.0.jar").await;
    Mock::given(method("GET"))
        .and(path(binary.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jar bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mods_dir = dir.path().join("mods");
    let progress = ProgressCapture::new();

    let summary = downloader_for(&server)
        .download_all(&manifest_with(vec![entry(100, 200)]), &mods_dir, &progress.get_callback())
        .await
        .unwrap();

    assert_eq!(
        summary.outcomes,
        vec![DownloadOutcome::Downloaded { filename: "cool-mod-1.0.jar".to_string(), bytes: 9 }]
    );
    assert_eq!(tokio::fs::read(mods_dir.join("cool-mod-1.0.jar")).await.unwrap(), b"jar bytes");
    assert!(!mods_dir.join("cool-mod-1.0.jar.part").exists());
    assert_eq!(progress.count_downloads_started(), 1);
}

#[tokio::test]
async fn resolve_entry_strips_cookie_query_and_decodes_name() {
    let server = MockServer::start().await;
    mount_project(&server, 7, "jei").await;
    mount_file(&server, "jei", 70, "Just%20Enough%20Items.jar").await;

    let resolved = downloader_for(&server)
        .resolve_entry(&entry(7, 70))
        .await
        .unwrap()
        .expect("file should resolve");

    assert_eq!(resolved.filename, "Just Enough Items.jar");
    assert!(resolved.final_url.ends_with("/cdn/70/Just%20Enough%20Items.jar"));
    assert_eq!(resolved.entry, entry(7, 70));
}

#[tokio::test]
async fn existing_file_is_left_untouched_and_not_fetched() {
    let server = MockServer::start().await;
    mount_project(&server, 100, "cool-mod").await;
    let binary = mount_file(&server, "cool-mod", 200, "cool-mod-1.0.jar").await;
    Mock::given(method("GET"))
        .and(path(binary.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new bytes".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mods_dir = dir.path().join("mods");
    tokio::fs::create_dir_all(&mods_dir).await.unwrap();
    tokio::fs::write(mods_dir.join("cool-mod-1.0.jar"), b"old bytes").await.unwrap();

    let summary = downloader_for(&server)
        .download_all(&manifest_with(vec![entry(100, 200)]), &mods_dir, &None)
        .await
        .unwrap();

    assert_eq!(summary.already_present(), 1);
    assert_eq!(tokio::fs::read(mods_dir.join("cool-mod-1.0.jar")).await.unwrap(), b"old bytes");
}

#[tokio::test]
async fn directory_with_resolved_name_counts_as_present() {
    let server = MockServer::start().await;
    mount_project(&server, 100, "cool-mod").await;
    let binary = mount_file(&server, "cool-mod", 200, "cool-mod-1.0.jar").await;
    Mock::given(method("GET"))
        .and(path(binary.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jar".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    tokio::fs::create_dir_all(dir.path().join("cool-mod-1.0.jar")).await.unwrap();

    let summary = downloader_for(&server)
        .download_all(&manifest_with(vec![entry(100, 200)]), dir.path(), &None)
        .await
        .unwrap();

    assert_eq!(
        summary.outcomes,
        vec![DownloadOutcome::AlreadyPresent { filename: "cool-mod-1.0.jar".to_string() }]
    );
    assert!(dir.path().join("cool-mod-1.0.jar").is_dir());
}

#[tokio::test]
async fn missing_file_is_skipped_with_warning_and_run_continues() {
    let server = MockServer::start().await;
    mount_project(&server, 100, "gone").await;
    head_redirect(&server, "/mods/gone/files/300/download", "/mods/gone/files?cookieTest=1").await;
    head_ok(&server, "/mods/gone/files").await;

    mount_project(&server, 101, "kept").await;
    let binary = mount_file(&server, "kept", 301, "kept.jar").await;
    Mock::given(method("GET"))
        .and(path(binary.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"kept".to_vec()))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let progress = ProgressCapture::new();
    let optional = FileEntry { project_id: 101, file_id: 301, required: false };

    let summary = downloader_for(&server)
        .download_all(
            &manifest_with(vec![entry(100, 300), optional]),
            dir.path(),
            &progress.get_callback(),
        )
        .await
        .unwrap();

    assert_eq!(
        summary.outcomes,
        vec![
            DownloadOutcome::MissingSkipped { entry: entry(100, 300) },
            DownloadOutcome::Downloaded { filename: "kept.jar".to_string(), bytes: 4 },
        ]
    );
    assert_eq!(summary.total_bytes(), 4);
    assert_eq!(progress.warnings().len(), 1);
    assert!(progress.warnings()[0].contains("100/300"));
}

#[tokio::test]
async fn unusable_final_url_aborts_and_keeps_earlier_files() {
    let server = MockServer::start().await;
    mount_project(&server, 1, "first").await;
    let binary = mount_file(&server, "first", 10, "first.jar").await;
    Mock::given(method("GET"))
        .and(path(binary.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"1".to_vec()))
        .mount(&server)
        .await;

    mount_project(&server, 2, "broken").await;
    head_redirect(&server, "/mods/broken/files/20/download", "/cdn/20/").await;
    head_ok(&server, "/cdn/20/").await;

    let dir = tempdir().unwrap();
    let err = downloader_for(&server)
        .download_all(&manifest_with(vec![entry(1, 10), entry(2, 20)]), dir.path(), &None)
        .await
        .unwrap_err();

    assert!(matches!(err, PackError::FilenamePatternMismatch { .. }));
    assert!(dir.path().join("first.jar").exists());
}

#[tokio::test]
async fn server_error_on_binary_is_network_failure() {
    let server = MockServer::start().await;
    mount_project(&server, 5, "flaky").await;
    let binary = mount_file(&server, "flaky", 50, "flaky.jar").await;
    Mock::given(method("GET"))
        .and(path(binary.as_str()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let err = downloader_for(&server)
        .download_entry(&entry(5, 50), dir.path(), &None)
        .await
        .unwrap_err();

    match err {
        PackError::NetworkIo { source: NetworkFailure::Status(code), .. } => assert_eq!(code, 500),
        other => panic!("Expected NetworkIo, got {:?}", other),
    }
    assert!(!dir.path().join("flaky.jar").exists());
}

#[test]
fn project_url_uses_configured_base() {
    let config = DownloadConfig::builder()
        .project_base_url("http://projects.test/projects/")
        .build()
        .unwrap();
    let downloader = ModDownloader::new(HttpClient::from_config(&config).unwrap(), &config);

    assert_eq!(downloader.project_url(&entry(100, 200)), "http://projects.test/projects/100");
}
