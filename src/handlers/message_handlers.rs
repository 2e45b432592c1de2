//! HTTP handlers for the guestbook.

use crate::{errors::AppError, models::message::Message, state::AppState};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PostMessageReq {
    pub author_name: String,
    pub body: String,
}

/// Response for both message endpoints: the materialized board.
#[derive(Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
    pub notice: Option<String>,
}

/// `POST /api/messages` — post, then reconcile.
///
/// Empty fields are rejected with 422 before any store call, so the client
/// keeps its draft. A 2xx means the message is persisted; the returned
/// list is the fresh materialization (possibly stale with a notice if the
/// follow-up fetch failed).
pub async fn post_message(
    State(app): State<AppState>,
    Json(req): Json<PostMessageReq>,
) -> Result<Json<MessagesResponse>, AppError> {
    app.messages
        .post_message(&req.author_name, &req.body)
        .await?;

    let (messages, notice) = app
        .board
        .apply_messages(app.messages.list_messages().await)
        .await;
    Ok(Json(MessagesResponse { messages, notice }))
}

/// `GET /api/messages` — same retention policy as the gallery: a fetch
/// failure serves the retained snapshot with a notice.
pub async fn list_messages(State(app): State<AppState>) -> Json<MessagesResponse> {
    let (messages, notice) = app
        .board
        .apply_messages(app.messages.list_messages().await)
        .await;
    Json(MessagesResponse { messages, notice })
}
