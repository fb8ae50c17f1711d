//! Connector handlers for the Web API.
//!
//! A single `/connector` endpoint dispatches on the `mode` parameter:
//! read and mutate operations arrive as GET query strings, uploads as
//! POST multipart forms. Operation failures become Failure records in
//! an HTTP 200 body so legacy clients can render them; only download
//! uses HTTP status codes.

use axum::{
    body::Body,
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::file::response::{textarea_wrap, FailureRecord};
use crate::file::{FileManager, Upload};
use crate::Result;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Operation executor over the confined root.
    pub fm: FileManager,
}

impl AppState {
    pub fn new(fm: FileManager) -> Self {
        Self { fm }
    }
}

/// Query parameters accepted by the connector endpoint.
///
/// Which ones are meaningful depends on `mode`; the rest are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectorQuery {
    pub mode: Option<String>,
    pub path: Option<String>,
    pub old: Option<String>,
    pub new: Option<String>,
    pub root: Option<String>,
    pub name: Option<String>,
}

impl ConnectorQuery {
    fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }

    fn old(&self) -> &str {
        self.old.as_deref().unwrap_or("")
    }

    fn new(&self) -> &str {
        self.new.as_deref().unwrap_or("")
    }

    fn root(&self) -> &str {
        self.root.as_deref().unwrap_or("")
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

fn serialize<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| r#"{"Error":"Response serialization failed","Code":-1}"#.to_string())
}

fn json_response(json: String) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        json,
    )
        .into_response()
}

/// Plain JSON response; failures become Failure records.
fn respond<T: Serialize>(result: Result<T>) -> Response {
    let json = match result {
        Ok(value) => serialize(&value),
        Err(e) => {
            tracing::debug!(error = %e, "connector operation failed");
            serialize(&FailureRecord::from(&e))
        }
    };
    json_response(json)
}

/// Textarea-wrapped response for the form-upload transport.
fn textarea_respond<T: Serialize>(result: Result<T>) -> Response {
    let json = match result {
        Ok(value) => serialize(&value),
        Err(e) => {
            tracing::debug!(error = %e, "connector upload failed");
            serialize(&FailureRecord::from(&e))
        }
    };
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        textarea_wrap(&json),
    )
        .into_response()
}

/// GET /connector - read and mutate operations.
pub async fn connector_get(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ConnectorQuery>,
) -> Response {
    match q.mode.as_deref().unwrap_or("") {
        "getinfo" => respond(state.fm.get_info(q.path())),
        "getfolder" => respond(state.fm.get_folder(q.path())),
        "rename" => respond(state.fm.rename(q.old(), q.new())),
        "move" => respond(state.fm.move_item(q.old(), q.root(), q.new())),
        "delete" => respond(state.fm.delete(q.path())),
        "addfolder" => respond(state.fm.add_folder(q.path(), q.name())),
        "download" => download_response(&state, q.path()),
        "preview" => preview_response(&state, q.path()),
        other => {
            tracing::debug!(mode = other, "unknown connector mode");
            json_response(serialize(&FailureRecord::new(format!(
                "Unknown mode '{other}'"
            ))))
        }
    }
}

/// POST /connector - multipart upload operations (add, replace).
pub async fn connector_post(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ConnectorQuery>,
    mut multipart: Multipart,
) -> Response {
    let mut mode = q.mode.unwrap_or_default();
    let mut current_path = String::new();
    let mut new_file_path = String::new();
    let mut upload = Upload::new("", Vec::new());

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // Oversize bodies and malformed multipart both land here;
            // answer with a Failure record so the client can show it.
            Err(e) => {
                tracing::debug!(error = %e, "failed to read multipart field");
                return textarea_respond::<()>(Err(crate::ShelfError::InvalidUpload(format!(
                    "Upload failed: {e}"
                ))));
            }
        };

        if let Some(filename) = field.file_name() {
            let filename = filename.to_string();
            match field.bytes().await {
                Ok(bytes) => upload = Upload::new(filename, bytes.to_vec()),
                Err(e) => {
                    tracing::debug!(error = %e, "failed to read upload body");
                    return textarea_respond::<()>(Err(crate::ShelfError::InvalidUpload(
                        format!("Upload failed: {e}"),
                    )));
                }
            }
            continue;
        }

        let name = field.name().unwrap_or("").to_string();
        let value = field.text().await.unwrap_or_default();
        match name.as_str() {
            "mode" => mode = value,
            "currentpath" => current_path = value,
            "newfilepath" => new_file_path = value,
            _ => {}
        }
    }

    match mode.as_str() {
        "add" => textarea_respond(state.fm.add_file(&current_path, &upload)),
        "replace" => textarea_respond(state.fm.replace_file(&new_file_path, &upload)),
        other => {
            tracing::debug!(mode = other, "unknown connector upload mode");
            textarea_respond::<()>(Err(crate::ShelfError::InvalidUpload(format!(
                "Unknown mode '{other}'"
            ))))
        }
    }
}

/// Build the download response: bytes with attachment headers, or 404.
fn download_response(state: &AppState, path: &str) -> Response {
    let payload = match state.fm.download(path) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "download failed");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    let content_type = mime_guess::from_path(&payload.filename)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&payload.filename),
        )
        .header(header::CONTENT_LENGTH, payload.content.len())
        .body(Body::from(payload.content))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build download response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Serve image bytes for the Preview links emitted in entry records.
///
/// Inline (no attachment disposition); missing or escaping paths are
/// 404 like download.
fn preview_response(state: &AppState, path: &str) -> Response {
    let payload = match state.fm.download(path) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "preview failed");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    let ext = crate::file::naming::extension_of(&payload.filename);
    let content_type = if ext.is_empty() {
        "application/octet-stream".to_string()
    } else {
        format!("image/{}", ext.trim_start_matches('.'))
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, payload.content.len())
        .body(Body::from(payload.content))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build preview response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are removed to prevent header injection; quotes
/// and backslashes are replaced. Non-ASCII names additionally carry an
/// RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' => '_',
            '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}
