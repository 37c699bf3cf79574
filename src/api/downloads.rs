use crate::api::middleware::AccessToken;
use crate::api::AppState;
use crate::error::Result;
use crate::services::publisher::{validate_filename, CSV_CONTENT_TYPE};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use std::sync::Arc;

pub fn download_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/spotify/download/:filename", get(download_spotify_library))
        .route("/apple/download/:filename", get(download_apple_music_library))
        .route("/exports/:filename", get(fetch_export))
}

async fn download_spotify_library(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    AccessToken(token): AccessToken,
) -> Result<Response> {
    validate_filename(&filename)?;
    let csv = state.exporter.export_spotify(&filename, &token).await?;
    Ok(csv_attachment(&filename, csv))
}

async fn download_apple_music_library(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    AccessToken(user_token): AccessToken,
) -> Result<Response> {
    validate_filename(&filename)?;
    let csv = state.exporter.export_apple_music(&filename, &user_token).await?;
    Ok(csv_attachment(&filename, csv))
}

/// Serves a previously published export straight from the content store.
async fn fetch_export(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response> {
    validate_filename(&filename)?;
    let csv = state.exporter.fetch(&filename).await?;
    Ok(csv_attachment(&filename, csv))
}

fn csv_attachment(filename: &str, csv: Bytes) -> Response {
    (
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        csv,
    )
        .into_response()
}

/// `attachment` disposition with a quoted ASCII `filename` and, for non-ASCII
/// names, an RFC 5987 `filename*` carrying the exact UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    let quoted = fallback.replace('\\', "\\\\").replace('"', "\\\"");

    if filename.is_ascii() {
        format!("attachment; filename=\"{}\"", quoted)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            quoted,
            urlencoding::encode(filename)
        )
    }
}
