//! Represents one guestbook entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted guestbook message.
///
/// Both text fields are validated non-empty (after trimming) before any
/// store call. Messages are append-only and immutable once created.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Message {
    /// Identifier assigned at insert time.
    pub id: Uuid,

    /// Name the guest signed with.
    pub author_name: String,

    /// The message text.
    pub body: String,

    /// Server-assigned creation time; listing is newest first.
    pub created_at: DateTime<Utc>,
}
