//! HTTP handlers for the media pipeline: batch upload, gallery listing,
//! inline media serving, and the download relay.

use crate::{
    errors::AppError,
    models::asset::GalleryItem,
    services::{BoardError, media_service::{IngestReport, LocalFile}},
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, header},
    response::Response,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Response for `POST /api/uploads`: the batch report plus the freshly
/// re-materialized gallery.
#[derive(Serialize)]
pub struct UploadResponse {
    pub report: IngestReport,
    pub gallery: Vec<GalleryItem>,
    pub notice: Option<String>,
}

/// Response for `GET /api/gallery`. `uploading` mirrors the in-flight
/// flag so the client can keep its upload control disabled across
/// refreshes.
#[derive(Serialize)]
pub struct GalleryResponse {
    pub items: Vec<GalleryItem>,
    pub uploading: bool,
    pub notice: Option<String>,
}

/// `POST /api/uploads` — ingest a multipart batch, then reconcile.
///
/// The whole batch is collected before ingestion starts; nothing is
/// persisted speculatively. Per-file store failures land in the report,
/// not in the HTTP status. Refused with 409 while another batch is in
/// flight.
pub async fn upload_media(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let _guard = app.board.begin_upload().ok_or(BoardError::UploadInFlight)?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("malformed upload body: {}", err)))?
    {
        let Some(display_name) = field.file_name().map(str::to_string) else {
            continue; // non-file form fields are ignored
        };
        if display_name.is_empty() {
            continue;
        }
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".into());
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("malformed upload body: {}", err)))?;
        files.push(LocalFile {
            display_name,
            mime_type,
            bytes,
        });
    }

    let cancel = CancellationToken::new();
    let report = app.media.ingest(files, &cancel).await;

    // reconcile: the response reflects exactly what is persisted now
    let (gallery, notice) = app.board.apply_gallery(app.media.list_gallery().await).await;

    Ok(Json(UploadResponse {
        report,
        gallery,
        notice,
    }))
}

/// `GET /api/gallery` — materialize the gallery.
///
/// Always 200: a fetch failure serves the retained snapshot with a notice
/// instead of flashing an empty board.
pub async fn list_gallery(State(app): State<AppState>) -> Json<GalleryResponse> {
    let (items, notice) = app.board.apply_gallery(app.media.list_gallery().await).await;
    Json(GalleryResponse {
        items,
        uploading: app.board.is_uploading(),
        notice,
    })
}

/// `GET /api/assets/{id}/download` — download relay.
///
/// Re-fetches the payload keyed by the asset's storage path and hands it
/// out as an attachment named after the original file.
pub async fn download_asset(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (asset, bytes) = app.media.download(id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&asset.display_name)
    );

    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&asset.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    Ok(response)
}

/// `GET /media/{*path}` — the public-URL target; serves payloads inline.
pub async fn serve_media(
    State(app): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let (mime_type, bytes) = app.media.serve_media(&path).await?;

    let mut response = Response::new(Body::from(bytes));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    Ok(response)
}

/// Keep download filenames header-safe: quotes, control bytes, and
/// backslashes are replaced.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == '"' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}
