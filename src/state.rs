//! Presentation-owned state: the last materialized lists and the upload
//! flag.
//!
//! The core operations are stateless; this snapshot is the only
//! process-wide mutable state. Lists are replaced wholesale on every
//! successful fetch and retained untouched when a fetch fails, so a
//! transient read error degrades to stale-but-present data instead of an
//! empty board.

use crate::{
    models::{asset::GalleryItem, message::Message},
    services::{
        BoardResult, media_service::MediaService, message_service::MessageService,
    },
};
use sqlx::SqlitePool;
use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::RwLock;
use tracing::warn;

/// Shared handles the HTTP layer carries into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    /// Root of the payload directory, probed by the readiness check.
    pub media_dir: PathBuf,
    pub media: MediaService,
    pub messages: MessageService,
    pub board: Arc<BoardState>,
}

/// The materialized board: last successful gallery and message fetches,
/// plus the in-flight upload flag.
#[derive(Default)]
pub struct BoardState {
    gallery: RwLock<Vec<GalleryItem>>,
    messages: RwLock<Vec<Message>>,
    uploading: Arc<AtomicBool>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a gallery fetch into the snapshot.
    ///
    /// `Ok` replaces the held list; `Err` retains it and returns a
    /// user-visible notice alongside the stale data.
    pub async fn apply_gallery(
        &self,
        result: BoardResult<Vec<GalleryItem>>,
    ) -> (Vec<GalleryItem>, Option<String>) {
        match result {
            Ok(items) => {
                *self.gallery.write().await = items.clone();
                (items, None)
            }
            Err(err) => {
                warn!("gallery refresh failed, serving retained snapshot: {}", err);
                (
                    self.gallery.read().await.clone(),
                    Some("could not refresh the gallery; showing the last loaded version".into()),
                )
            }
        }
    }

    /// Same retention policy as `apply_gallery`, for the message board.
    pub async fn apply_messages(
        &self,
        result: BoardResult<Vec<Message>>,
    ) -> (Vec<Message>, Option<String>) {
        match result {
            Ok(items) => {
                *self.messages.write().await = items.clone();
                (items, None)
            }
            Err(err) => {
                warn!("message refresh failed, serving retained snapshot: {}", err);
                (
                    self.messages.read().await.clone(),
                    Some("could not refresh messages; showing the last loaded version".into()),
                )
            }
        }
    }

    /// Claim the upload flag. Returns `None` while another batch is in
    /// flight. The flag resets when the returned guard drops, on success
    /// and failure alike.
    pub fn begin_upload(&self) -> Option<UploadGuard> {
        self.uploading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| UploadGuard {
                flag: Arc::clone(&self.uploading),
            })
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }
}

/// RAII handle for the upload flag.
pub struct UploadGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::BoardError;

    fn item(name: &str) -> Message {
        Message {
            id: uuid::Uuid::new_v4(),
            author_name: name.to_string(),
            body: "hello".to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn fetch_failure_retains_previous_snapshot() {
        let board = BoardState::new();

        let (messages, notice) = board.apply_messages(Ok(vec![item("Sam")])).await;
        assert_eq!(messages.len(), 1);
        assert!(notice.is_none());

        let (messages, notice) = board
            .apply_messages(Err(BoardError::Fetch("boom".into())))
            .await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author_name, "Sam");
        assert!(notice.is_some());
    }

    #[tokio::test]
    async fn successful_fetch_replaces_snapshot_wholesale() {
        let board = BoardState::new();

        board.apply_messages(Ok(vec![item("Sam"), item("Ana")])).await;
        let (messages, _) = board.apply_messages(Ok(vec![item("Ben")])).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author_name, "Ben");
    }

    #[test]
    fn upload_guard_blocks_reentry_and_resets_on_drop() {
        let board = BoardState::new();

        let guard = board.begin_upload().expect("flag was free");
        assert!(board.is_uploading());
        assert!(board.begin_upload().is_none());

        drop(guard);
        assert!(!board.is_uploading());
        assert!(board.begin_upload().is_some());
    }
}
