//! Connector API Tests
//!
//! Integration tests for the connector endpoint against a real
//! temporary file root.

use axum_test::TestServer;
use serde_json::Value;
use shelf::config::Config;
use shelf::web::handlers::AppState;
use shelf::web::router::{create_health_router, create_router};
use shelf::FileManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a test configuration rooted in a temp directory.
fn create_test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.storage.root = root.to_string_lossy().into_owned();
    config.storage.icon_url = "/icons/".to_string();
    config.storage.icon_dir = root
        .parent()
        .unwrap()
        .join("icons")
        .to_string_lossy()
        .into_owned();
    config
}

/// Create a test server over a fresh file root.
///
/// Returns the server, the temp dir keeping the root alive, and the
/// root path for direct filesystem assertions.
fn create_test_server() -> (TestServer, TempDir, PathBuf) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let root = temp.path().join("root");
    std::fs::create_dir(&root).expect("Failed to create root");
    std::fs::create_dir(temp.path().join("icons")).expect("Failed to create icon dir");

    let config = create_test_config(&root);
    let fm = FileManager::new(&config.storage).expect("Failed to create file manager");
    let app_state = Arc::new(AppState::new(fm));

    let router = create_router(app_state, config.storage.max_upload_size() as usize)
        .merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, temp, root)
}

const BOUNDARY: &str = "----shelf-test-boundary";

/// Build a multipart/form-data body by hand.
fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((name, filename, content)) = file {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST an upload form and return the JSON inside the textarea wrapper.
async fn post_upload(
    server: &TestServer,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Value {
    let response = server
        .post("/connector")
        .content_type(&format!("multipart/form-data; boundary={BOUNDARY}"))
        .bytes(multipart_body(fields, file).into())
        .await;

    response.assert_status_ok();

    let text = response.text();
    let json = text
        .strip_prefix("<textarea>")
        .and_then(|t| t.strip_suffix("</textarea>"))
        .unwrap_or_else(|| panic!("Response not textarea-wrapped: {text}"));
    serde_json::from_str(json).expect("Invalid JSON in textarea")
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (server, _temp, _root) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

// ============================================================================
// getinfo / getfolder
// ============================================================================

#[tokio::test]
async fn test_getinfo_file() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("notes.txt"), b"hello").unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "getinfo")
        .add_query_param("path", "/notes.txt")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["Path"], "/notes.txt");
    assert_eq!(body["Filename"], "notes.txt");
    assert_eq!(body["File Type"], "txt");
    assert_eq!(body["Preview"], "/icons/default.png");
    assert_eq!(body["Properties"]["Size"], 5);
    assert_eq!(body["Error"], "");
    assert_eq!(body["Code"], 0);
}

#[tokio::test]
async fn test_getinfo_missing_is_failure_record() {
    let (server, _temp, _root) = create_test_server();

    let response = server
        .get("/connector")
        .add_query_param("mode", "getinfo")
        .add_query_param("path", "/nope.txt")
        .await;

    // Operation failures stay HTTP 200
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["Error"], "File not found");
    assert_eq!(body["Code"], -1);
}

#[tokio::test]
async fn test_getfolder_dirs_before_files() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("a.txt"), b"a").unwrap();
    std::fs::create_dir(root.join("zdir")).unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "getfolder")
        .add_query_param("path", "/")
        .await;

    response.assert_status_ok();

    // serde_json reorders object keys, so check order on the raw text
    let text = response.text();
    let dir_pos = text.find("\"/zdir\"").expect("dir key missing");
    let file_pos = text.find("\"/a.txt\"").expect("file key missing");
    assert!(dir_pos < file_pos);

    let body: Value = response.json();
    assert_eq!(body["/zdir"]["Path"], "/zdir/");
    assert_eq!(body["/zdir"]["File Type"], "dir");
    assert_eq!(body["/a.txt"]["Path"], "/a.txt");
}

#[tokio::test]
async fn test_getfolder_traversal_rejected() {
    let (server, _temp, _root) = create_test_server();

    let response = server
        .get("/connector")
        .add_query_param("mode", "getfolder")
        .add_query_param("path", "/../../etc")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["Error"], "Attempt to view files outside root path");
    assert_eq!(body["Code"], -1);
}

// ============================================================================
// addfolder / delete
// ============================================================================

#[tokio::test]
async fn test_addfolder() {
    let (server, _temp, root) = create_test_server();

    let response = server
        .get("/connector")
        .add_query_param("mode", "addfolder")
        .add_query_param("path", "/")
        .add_query_param("name", "reports")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["Parent"], "/");
    assert_eq!(body["Name"], "reports");
    assert_eq!(body["Error"], "No error");
    assert_eq!(body["Code"], 0);
    assert!(root.join("reports").is_dir());
}

#[tokio::test]
async fn test_addfolder_duplicate() {
    let (server, _temp, root) = create_test_server();
    std::fs::create_dir(root.join("dup")).unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "addfolder")
        .add_query_param("path", "/")
        .add_query_param("name", "dup")
        .await;

    let body: Value = response.json();
    assert_eq!(body["Error"], "Folder already exists.");
    assert_eq!(body["Code"], -1);
}

#[tokio::test]
async fn test_delete_directory_recursive() {
    let (server, _temp, root) = create_test_server();
    std::fs::create_dir_all(root.join("tree").join("deep")).unwrap();
    std::fs::write(root.join("tree").join("deep").join("leaf.txt"), b"x").unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "delete")
        .add_query_param("path", "/tree")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["Error"], "No error");
    assert_eq!(body["Path"], "/tree");
    assert!(!root.join("tree").exists());
}

#[tokio::test]
async fn test_delete_traversal_no_mutation() {
    let (server, temp, _root) = create_test_server();
    std::fs::write(temp.path().join("outside.txt"), b"safe").unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "delete")
        .add_query_param("path", "/../outside.txt")
        .await;

    let body: Value = response.json();
    assert_eq!(body["Error"], "Attempt to delete file outside root path");
    assert_eq!(body["Code"], -1);
    assert!(temp.path().join("outside.txt").exists());
}

// ============================================================================
// rename / move
// ============================================================================

#[tokio::test]
async fn test_rename_preserves_extension() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("report.pdf"), b"%PDF").unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "rename")
        .add_query_param("old", "/report.pdf")
        .add_query_param("new", "summary.txt")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["Error"], "No error");
    assert_eq!(body["Old Path"], "/report.pdf");
    assert_eq!(body["Old Name"], "report.pdf");
    assert_eq!(body["New Path"], "/summary.pdf");
    assert_eq!(body["New Name"], "summary.pdf");
    assert!(root.join("summary.pdf").exists());
}

#[tokio::test]
async fn test_move_file() {
    let (server, _temp, root) = create_test_server();
    std::fs::create_dir(root.join("archive")).unwrap();
    std::fs::write(root.join("doc.pdf"), b"%PDF").unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "move")
        .add_query_param("old", "/doc.pdf")
        .add_query_param("root", "/")
        .add_query_param("new", "archive")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["Error"], "No error");
    assert_eq!(body["New Path"], "/archive/doc.pdf");
    assert!(root.join("archive").join("doc.pdf").exists());
    assert!(!root.join("doc.pdf").exists());
}

#[tokio::test]
async fn test_move_onto_existing_fails() {
    let (server, _temp, root) = create_test_server();
    std::fs::create_dir(root.join("archive")).unwrap();
    std::fs::write(root.join("doc.pdf"), b"new").unwrap();
    std::fs::write(root.join("archive").join("doc.pdf"), b"old").unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "move")
        .add_query_param("old", "/doc.pdf")
        .add_query_param("root", "/")
        .add_query_param("new", "archive")
        .await;

    let body: Value = response.json();
    assert_eq!(body["Code"], -1);
    assert_eq!(
        std::fs::read(root.join("archive").join("doc.pdf")).unwrap(),
        b"old"
    );
}

// ============================================================================
// add / replace (multipart)
// ============================================================================

#[tokio::test]
async fn test_add_upload() {
    let (server, _temp, root) = create_test_server();

    let body = post_upload(
        &server,
        &[("mode", "add"), ("currentpath", "/")],
        Some(("newfile", "notes.txt", b"hello upload")),
    )
    .await;

    assert_eq!(body["Path"], "/");
    assert_eq!(body["Name"], "notes.txt");
    assert_eq!(body["Error"], "No error");
    assert_eq!(body["Code"], 0);
    assert_eq!(std::fs::read(root.join("notes.txt")).unwrap(), b"hello upload");
}

#[tokio::test]
async fn test_add_upload_uniquifies_name() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("report.pdf"), b"first").unwrap();

    let body = post_upload(
        &server,
        &[("mode", "add"), ("currentpath", "/")],
        Some(("newfile", "report.pdf", b"second")),
    )
    .await;

    assert_eq!(body["Name"], "report_1.pdf");
    assert_eq!(std::fs::read(root.join("report_1.pdf")).unwrap(), b"second");
    // Original untouched
    assert_eq!(std::fs::read(root.join("report.pdf")).unwrap(), b"first");
}

#[tokio::test]
async fn test_add_upload_disallowed_extension() {
    let (server, _temp, root) = create_test_server();

    let body = post_upload(
        &server,
        &[("mode", "add"), ("currentpath", "/")],
        Some(("newfile", "shell.sh", b"#!/bin/sh")),
    )
    .await;

    assert_eq!(body["Error"], "Uploaded file type is not allowed.");
    assert_eq!(body["Code"], -1);
    assert!(!root.join("shell.sh").exists());
}

#[tokio::test]
async fn test_add_upload_without_file() {
    let (server, _temp, _root) = create_test_server();

    let body = post_upload(&server, &[("mode", "add"), ("currentpath", "/")], None).await;

    assert_eq!(body["Error"], "No file provided.");
    assert_eq!(body["Code"], -1);
}

#[tokio::test]
async fn test_replace_upload() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("report.pdf"), b"old bytes").unwrap();

    let body = post_upload(
        &server,
        &[("mode", "replace"), ("newfilepath", "/report.pdf")],
        Some(("fileR", "anything.pdf", b"new bytes")),
    )
    .await;

    assert_eq!(body["Path"], "/");
    assert_eq!(body["Name"], "report.pdf");
    assert_eq!(body["Error"], "No error");
    assert_eq!(std::fs::read(root.join("report.pdf")).unwrap(), b"new bytes");
}

#[tokio::test]
async fn test_replace_extension_mismatch() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("report.pdf"), b"old").unwrap();

    let body = post_upload(
        &server,
        &[("mode", "replace"), ("newfilepath", "/report.pdf")],
        Some(("fileR", "sneaky.txt", b"new")),
    )
    .await;

    assert_eq!(
        body["Error"],
        "Replacement file must have the same extension as the file being replaced."
    );
    assert_eq!(body["Code"], -1);
    assert_eq!(std::fs::read(root.join("report.pdf")).unwrap(), b"old");
}

// ============================================================================
// download
// ============================================================================

#[tokio::test]
async fn test_download_headers_and_body() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("data.txt"), b"download me").unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "download")
        .add_query_param("path", "/data.txt")
        .await;

    response.assert_status_ok();

    let disposition = response
        .headers()
        .get("content-disposition")
        .expect("Missing Content-Disposition")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"data.txt\"");

    let length = response
        .headers()
        .get("content-length")
        .expect("Missing Content-Length")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(length, "11");

    assert_eq!(response.text(), "download me");
}

#[tokio::test]
async fn test_download_missing_is_404() {
    let (server, _temp, _root) = create_test_server();

    let response = server
        .get("/connector")
        .add_query_param("mode", "download")
        .add_query_param("path", "/nope.txt")
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_download_traversal_is_404() {
    let (server, _temp, _root) = create_test_server();

    let response = server
        .get("/connector")
        .add_query_param("mode", "download")
        .add_query_param("path", "/../../etc/passwd")
        .await;

    response.assert_status_not_found();
}

// ============================================================================
// preview
// ============================================================================

#[tokio::test]
async fn test_preview_serves_image_bytes() {
    let (server, _temp, root) = create_test_server();
    image::RgbaImage::new(2, 2).save(root.join("pic.png")).unwrap();
    let expected = std::fs::read(root.join("pic.png")).unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "preview")
        .add_query_param("path", "/pic.png")
        .await;

    response.assert_status_ok();

    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing Content-Type")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(content_type, "image/png");

    assert_eq!(response.as_bytes().to_vec(), expected);
}

#[tokio::test]
async fn test_preview_missing_is_404() {
    let (server, _temp, _root) = create_test_server();

    let response = server
        .get("/connector")
        .add_query_param("mode", "preview")
        .add_query_param("path", "/nope.png")
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_preview_traversal_is_404() {
    let (server, _temp, _root) = create_test_server();

    let response = server
        .get("/connector")
        .add_query_param("mode", "preview")
        .add_query_param("path", "/../../etc/hostname")
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_getfolder_skips_unreadable_child() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("good.txt"), b"x").unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink(root.join("missing.txt"), root.join("broken.txt")).unwrap();

    let response = server
        .get("/connector")
        .add_query_param("mode", "getfolder")
        .add_query_param("path", "/")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["/good.txt"].is_object());
    assert!(body.get("/broken.txt").is_none());
}

// ============================================================================
// unknown mode
// ============================================================================

#[tokio::test]
async fn test_unknown_mode_is_failure_record() {
    let (server, _temp, _root) = create_test_server();

    let response = server
        .get("/connector")
        .add_query_param("mode", "teleport")
        .add_query_param("path", "/")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["Code"], -1);
    assert!(body["Error"].as_str().unwrap().contains("teleport"));
}
