//! Represents one uploaded media item and its gallery projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata for a single persisted media upload.
///
/// An asset row is only ever written after the payload bytes are durably
/// stored, so every record points at a non-empty payload. Assets are
/// append-only: once created they are never updated or deleted.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Asset {
    /// Identifier assigned at insert time.
    pub id: Uuid,

    /// Original filename, kept for display and re-download naming.
    pub display_name: String,

    /// Generated key under which the payload lives. Never reused.
    pub storage_path: String,

    /// MIME type as reported by the uploading client.
    pub mime_type: String,

    /// Payload size recorded from the object write.
    pub size_bytes: i64,

    /// MD5 of the payload, computed while writing.
    pub etag: String,

    /// Server-assigned creation time; gallery ordering is newest first.
    pub created_at: DateTime<Utc>,
}

/// Media classification derived from the MIME type.
///
/// The token before `/` decides: `video` is video, everything else is
/// treated as an image.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type.split('/').next() {
            Some("video") => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

/// One gallery entry: an asset resolved into display-ready form.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GalleryItem {
    #[serde(flatten)]
    pub asset: Asset,

    /// Fetchable URL for the payload, resolved from the storage path.
    pub url: String,

    pub kind: MediaKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_first_token_decides_kind() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("video/quicktime"), MediaKind::Video);
        // anything that is not video defaults to image
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime(""), MediaKind::Image);
    }
}
