//! Guestbook pipeline: post a message, list the board newest first.

use crate::{
    models::message::Message,
    services::{BoardError, BoardResult, timed_sql},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

#[derive(Clone)]
pub struct MessageService {
    db: Arc<SqlitePool>,
    store_timeout: Duration,
}

impl MessageService {
    pub fn new(db: Arc<SqlitePool>, store_timeout: Duration) -> Self {
        Self { db, store_timeout }
    }

    /// Persist a guest message.
    ///
    /// Either field empty after trimming is rejected before any store call;
    /// the caller keeps the draft intact for retry. Values are stored as
    /// submitted. The caller re-runs `list_messages` after a successful
    /// post.
    pub async fn post_message(&self, author_name: &str, body: &str) -> BoardResult<Message> {
        if author_name.trim().is_empty() {
            return Err(BoardError::Validation("name must not be empty"));
        }
        if body.trim().is_empty() {
            return Err(BoardError::Validation("message must not be empty"));
        }

        timed_sql(
            self.store_timeout,
            sqlx::query_as::<_, Message>(
                "INSERT INTO messages (id, author_name, body, created_at)
                 VALUES (?, ?, ?, ?)
                 RETURNING id, author_name, body, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(author_name)
            .bind(body)
            .bind(Utc::now())
            .fetch_one(&*self.db),
        )
        .await
        .map_err(BoardError::Insert)
    }

    /// List all messages newest first. On failure the caller retains the
    /// previously materialized list.
    pub async fn list_messages(&self) -> BoardResult<Vec<Message>> {
        timed_sql(
            self.store_timeout,
            sqlx::query_as::<_, Message>(
                "SELECT id, author_name, body, created_at
                 FROM messages ORDER BY created_at DESC, rowid DESC",
            )
            .fetch_all(&*self.db),
        )
        .await
        .map_err(|err| BoardError::Fetch(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::apply_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn service() -> (Arc<SqlitePool>, MessageService) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        apply_schema(&pool).await.unwrap();
        let db = Arc::new(pool);
        (db.clone(), MessageService::new(db, TIMEOUT))
    }

    #[tokio::test]
    async fn post_then_list_returns_the_exact_message() {
        let (_db, service) = service().await;
        let before = Utc::now();

        service.post_message("Sam", "Congrats!").await.unwrap();

        let messages = service.list_messages().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author_name, "Sam");
        assert_eq!(messages[0].body, "Congrats!");
        assert!(messages[0].created_at >= before);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_before_any_insert() {
        let (db, service) = service().await;

        for (name, body) in [("", "hi"), ("   ", "hi"), ("Sam", ""), ("Sam", " \t ")] {
            assert!(matches!(
                service.post_message(name, body).await,
                Err(BoardError::Validation(_))
            ));
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&*db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn messages_list_newest_first() {
        let (_db, service) = service().await;

        service.post_message("Ana", "first").await.unwrap();
        service.post_message("Ben", "second").await.unwrap();

        let messages = service.list_messages().await.unwrap();
        assert_eq!(messages[0].body, "second");
        assert_eq!(messages[1].body, "first");
    }

    #[tokio::test]
    async fn values_are_stored_as_submitted() {
        let (_db, service) = service().await;

        // trimming is a validity check, not a normalization
        service.post_message("  Sam  ", " hello ").await.unwrap();
        let messages = service.list_messages().await.unwrap();
        assert_eq!(messages[0].author_name, "  Sam  ");
        assert_eq!(messages[0].body, " hello ");
    }

    #[tokio::test]
    async fn list_reports_fetch_failure_after_pool_closes() {
        let (db, service) = service().await;
        db.close().await;

        assert!(matches!(
            service.list_messages().await,
            Err(BoardError::Fetch(_))
        ));
    }
}
