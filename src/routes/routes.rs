//! Route table for the event board.
//!
//! ## Structure
//! - **Health**
//!   - `GET  /healthz` — liveness
//!   - `GET  /readyz`  — readiness (SQLite + media dir probes)
//!
//! - **API**
//!   - `GET  /api/schedule` — static event program
//!   - `GET  /api/gallery` — materialized gallery, newest first
//!   - `POST /api/uploads` — multipart batch ingestion
//!   - `GET  /api/messages` / `POST /api/messages` — guestbook
//!   - `GET  /api/assets/{id}/download` — download relay
//!
//! - **Media**
//!   - `GET  /media/{*path}` — public-URL target for stored payloads
//!
//! The wildcard `*path` carries the generated storage path.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        media_handlers::{download_asset, list_gallery, serve_media, upload_media},
        message_handlers::{list_messages, post_message},
        schedule_handlers::get_schedule,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Uploads carry whole video files; the axum default of 2 MiB is far too
/// small.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Build and return the router for the whole HTTP surface.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // API
        .route("/api/schedule", get(get_schedule))
        .route("/api/gallery", get(list_gallery))
        .route(
            "/api/uploads",
            post(upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/messages", get(list_messages).post(post_message))
        .route("/api/assets/{id}/download", get(download_asset))
        // public media payloads
        .route("/media/{*path}", get(serve_media))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{
            apply_schema, media_service::MediaService, message_service::MessageService,
            object_store::FsObjectStore,
        },
        state::BoardState,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use sqlx::sqlite::SqlitePoolOptions;
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;

    async fn setup_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        apply_schema(&pool).await.unwrap();

        let db = Arc::new(pool);
        let store = Arc::new(FsObjectStore::new(dir.path(), "/media"));
        let timeout = Duration::from_secs(5);
        let state = AppState {
            db: db.clone(),
            media_dir: dir.path().to_path_buf(),
            media: MediaService::new(db.clone(), store, timeout),
            messages: MessageService::new(db, timeout),
            board: Arc::new(BoardState::new()),
        };

        (dir, routes().with_state(state))
    }

    fn multipart_body(parts: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
        let boundary = "keepsake-test-boundary";
        let mut body = Vec::new();
        for (name, mime, bytes) in parts {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                    name
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime).as_bytes());
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", boundary),
            body,
        )
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_and_readiness_pass() {
        let (_dir, app) = setup_app().await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn schedule_lists_the_full_program() {
        let (_dir, app) = setup_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/schedule")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json.as_array().map(Vec::len), Some(6));
        assert_eq!(
            json[0].get("title").and_then(|v| v.as_str()),
            Some("Guest Arrival & Welcome")
        );
    }

    #[tokio::test]
    async fn upload_gallery_download_roundtrip() {
        let (_dir, app) = setup_app().await;

        let (content_type, body) = multipart_body(&[
            ("a.jpg", "image/jpeg", b"jpeg bytes" as &[u8]),
            ("b.mp4", "video/mp4", b"mp4 bytes" as &[u8]),
        ]);
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/uploads")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json.pointer("/report/succeeded"), Some(&serde_json::json!(2)));
        assert_eq!(json.pointer("/report/failed"), Some(&serde_json::json!(0)));

        // reconciled gallery comes back with the upload, newest first
        let gallery = json.pointer("/gallery").and_then(|v| v.as_array()).unwrap();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery[0].get("kind").and_then(|v| v.as_str()), Some("video"));
        assert_eq!(
            gallery[0].get("display_name").and_then(|v| v.as_str()),
            Some("b.mp4")
        );
        assert_eq!(gallery[1].get("kind").and_then(|v| v.as_str()), Some("image"));

        // a fresh GET sees the same list
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/gallery")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = json_body(response).await;
        assert_eq!(
            listed.pointer("/items").and_then(|v| v.as_array()).map(Vec::len),
            Some(2)
        );

        // inline serving through the resolved public URL
        let url = gallery[1].get("url").and_then(|v| v.as_str()).unwrap().to_string();
        let response = app
            .clone()
            .oneshot(Request::builder().uri(url.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/jpeg"
        );

        // download relay re-serves the original bytes as an attachment
        let id = gallery[0].get("id").and_then(|v| v.as_str()).unwrap().to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/assets/{}/download", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("b.mp4"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"mp4 bytes");
    }

    #[tokio::test]
    async fn message_board_roundtrip_and_validation() {
        let (_dir, app) = setup_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"author_name":"Sam","body":"Congrats!"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let messages = json.pointer("/messages").and_then(|v| v.as_array()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].get("author_name").and_then(|v| v.as_str()),
            Some("Sam")
        );
        assert_eq!(messages[0].get("body").and_then(|v| v.as_str()), Some("Congrats!"));
        assert!(messages[0].get("created_at").is_some());

        // blank body is refused before any store call
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"author_name":"Sam","body":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/messages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(
            json.pointer("/messages").and_then(|v| v.as_array()).map(Vec::len),
            Some(1)
        );
    }

    #[tokio::test]
    async fn unknown_asset_download_is_404() {
        let (_dir, app) = setup_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/assets/{}/download", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn media_route_refuses_unindexed_paths() {
        let (_dir, app) = setup_app().await;

        for uri in ["/media/../secret", "/media/not-there.jpg"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {}", uri);
        }
    }
}
