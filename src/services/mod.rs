//! Service layer: the two stores and the pipelines composed over them.
//!
//! `object_store` holds raw payload bytes keyed by generated paths;
//! `media_service` and `message_service` move records between the HTTP
//! boundary and SQLite, re-materializing display lists after each mutation.

use sqlx::SqlitePool;
use std::{future::Future, io, time::Duration};
use thiserror::Error;
use tokio::time::timeout;
use uuid::Uuid;

pub mod media_service;
pub mod message_service;
pub mod object_store;

/// Failure taxonomy for board operations.
///
/// `Write`/`Insert` are caught per file during ingestion and never abort a
/// batch; `Fetch` on a list path degrades to the previously materialized
/// snapshot; `Validation` is rejected before any store call.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("object store write failed: {0}")]
    Write(io::Error),
    #[error("record insert failed: {0}")]
    Insert(sqlx::Error),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("{0}")]
    Validation(&'static str),
    #[error("asset `{0}` not found")]
    AssetNotFound(Uuid),
    #[error("no media at `{0}`")]
    MediaNotFound(String),
    #[error("another upload is already in progress")]
    UploadInFlight,
}

pub type BoardResult<T> = Result<T, BoardError>;

/// Run an object-store call under the configured deadline.
///
/// Deadline expiry is reported as a timed-out I/O error so it surfaces
/// through the same per-call failure path as any other store error.
pub(crate) async fn timed_io<T>(
    limit: Duration,
    fut: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "object store call timed out",
        )),
    }
}

/// Run a record-store call under the configured deadline.
pub(crate) async fn timed_sql<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, sqlx::Error> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(sqlx::Error::PoolTimedOut),
    }
}

const SCHEMA_SQL: &str = include_str!("../../migrations/0001_init.sql");

/// Apply the embedded schema statement-by-statement.
///
/// Used by the `--migrate` run mode and by tests against in-memory SQLite.
pub async fn apply_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = SCHEMA_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty());

    for stmt in statements {
        tracing::debug!("executing schema SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}
