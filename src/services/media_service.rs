//! Media pipeline: batch ingestion, gallery materialization, and the
//! download relay, composed over the object store and SQLite.

use crate::{
    models::asset::{Asset, GalleryItem, MediaKind},
    services::{BoardError, BoardResult, object_store::ObjectStore, timed_io, timed_sql},
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::{io::ErrorKind, path::Path, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// One file handed over by the upload form: raw bytes plus the name and
/// MIME type the client reported.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub display_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// A per-file ingestion failure, with the user-visible notice.
#[derive(Debug, Serialize)]
pub struct IngestFailure {
    pub display_name: String,
    pub notice: String,
}

/// Outcome of one ingestion batch.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    fn record_failure(&mut self, display_name: &str, reason: impl std::fmt::Display) {
        self.failed += 1;
        self.failures.push(IngestFailure {
            display_name: display_name.to_string(),
            notice: format!("failed to upload `{}`: {}", display_name, reason),
        });
    }
}

/// Media operations over the two stores.
///
/// Stateless request/response: the only process-wide mutable state lives in
/// the board snapshot owned by the presentation layer.
#[derive(Clone)]
pub struct MediaService {
    db: Arc<SqlitePool>,
    store: Arc<dyn ObjectStore>,
    store_timeout: Duration,
}

impl MediaService {
    pub fn new(db: Arc<SqlitePool>, store: Arc<dyn ObjectStore>, store_timeout: Duration) -> Self {
        Self {
            db,
            store,
            store_timeout,
        }
    }

    /// Ingest a batch of uploaded files, strictly one at a time in input
    /// order.
    ///
    /// Each file is written to the object store first and indexed only
    /// after the write succeeded. A failure at either step is recorded for
    /// that file and the batch continues; one file never aborts the rest.
    /// Once `cancel` fires, the remaining files are reported as failures
    /// without any further store calls.
    ///
    /// The caller re-materializes the gallery after the batch so the
    /// displayed state reflects exactly what is persisted.
    pub async fn ingest(&self, files: Vec<LocalFile>, cancel: &CancellationToken) -> IngestReport {
        let mut report = IngestReport::default();

        for file in &files {
            if cancel.is_cancelled() {
                warn!("upload cancelled, skipping `{}`", file.display_name);
                report.record_failure(&file.display_name, "upload cancelled");
                continue;
            }

            match self.ingest_one(file).await {
                Ok(asset) => {
                    debug!(
                        "ingested `{}` as {} ({} bytes)",
                        asset.display_name, asset.storage_path, asset.size_bytes
                    );
                    report.succeeded += 1;
                }
                Err(err) => {
                    warn!("failed to upload `{}`: {}", file.display_name, err);
                    report.record_failure(&file.display_name, err);
                }
            }
        }

        report
    }

    /// Write one payload, then index it. Write-then-index ordering is the
    /// invariant that keeps every asset record backed by a stored payload.
    async fn ingest_one(&self, file: &LocalFile) -> BoardResult<Asset> {
        let storage_path = generate_storage_path(&file.display_name);

        let stored = timed_io(
            self.store_timeout,
            self.store.put(&storage_path, file.bytes.clone()),
        )
        .await
        .map_err(BoardError::Write)?;

        timed_sql(
            self.store_timeout,
            sqlx::query_as::<_, Asset>(
                "INSERT INTO assets (id, display_name, storage_path, mime_type, size_bytes, etag, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 RETURNING id, display_name, storage_path, mime_type, size_bytes, etag, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(&file.display_name)
            .bind(&storage_path)
            .bind(&file.mime_type)
            .bind(stored.size_bytes)
            .bind(&stored.etag)
            .bind(Utc::now())
            .fetch_one(&*self.db),
        )
        .await
        .map_err(BoardError::Insert)
    }

    /// Materialize the gallery: all assets newest first, each resolved to a
    /// fetchable URL and classified by media kind.
    ///
    /// Side-effect-free; safe to call on every mutation. On failure the
    /// caller keeps the previously materialized list.
    pub async fn list_gallery(&self) -> BoardResult<Vec<GalleryItem>> {
        let assets = timed_sql(
            self.store_timeout,
            sqlx::query_as::<_, Asset>(
                "SELECT id, display_name, storage_path, mime_type, size_bytes, etag, created_at
                 FROM assets ORDER BY created_at DESC, rowid DESC",
            )
            .fetch_all(&*self.db),
        )
        .await
        .map_err(|err| BoardError::Fetch(err.to_string()))?;

        Ok(assets
            .into_iter()
            .map(|asset| GalleryItem {
                url: self.store.public_url(&asset.storage_path),
                kind: MediaKind::from_mime(&asset.mime_type),
                asset,
            })
            .collect())
    }

    /// Download relay: re-fetch an asset's bytes keyed by its storage path,
    /// never by the cached public URL.
    pub async fn download(&self, id: Uuid) -> BoardResult<(Asset, Bytes)> {
        let asset = timed_sql(
            self.store_timeout,
            sqlx::query_as::<_, Asset>(
                "SELECT id, display_name, storage_path, mime_type, size_bytes, etag, created_at
                 FROM assets WHERE id = ?",
            )
            .bind(id)
            .fetch_one(&*self.db),
        )
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => BoardError::AssetNotFound(id),
            other => BoardError::Fetch(other.to_string()),
        })?;

        let bytes = timed_io(self.store_timeout, self.store.get(&asset.storage_path))
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => BoardError::MediaNotFound(asset.storage_path.clone()),
                _ => BoardError::Fetch(format!(
                    "payload read failed for `{}`: {}",
                    asset.storage_path, err
                )),
            })?;

        Ok((asset, bytes))
    }

    /// Serve a payload for inline display. Only paths with an asset record
    /// are served, so unindexed or malformed paths fall out as not-found.
    pub async fn serve_media(&self, path: &str) -> BoardResult<(String, Bytes)> {
        let mime: Option<(String,)> = timed_sql(
            self.store_timeout,
            sqlx::query_as("SELECT mime_type FROM assets WHERE storage_path = ?")
                .bind(path)
                .fetch_optional(&*self.db),
        )
        .await
        .map_err(|err| BoardError::Fetch(err.to_string()))?;

        let (mime_type,) = mime.ok_or_else(|| BoardError::MediaNotFound(path.to_string()))?;

        let bytes = timed_io(self.store_timeout, self.store.get(path))
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound | ErrorKind::InvalidInput => {
                    BoardError::MediaNotFound(path.to_string())
                }
                _ => BoardError::Fetch(format!("payload read failed for `{}`: {}", path, err)),
            })?;

        Ok((mime_type, bytes))
    }
}

/// Derive a storage path unique per call: millisecond timestamp plus a
/// random token, keeping the original extension when it is plain
/// alphanumeric.
fn generate_storage_path(display_name: &str) -> String {
    let stamp = Utc::now().timestamp_millis();
    let token = Uuid::new_v4().simple().to_string();
    let base = format!("{}-{}", stamp, &token[..12]);

    match Path::new(display_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        Some(ext) => format!("{}.{}", base, ext.to_ascii_lowercase()),
        None => base,
    }
}
