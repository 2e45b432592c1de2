//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks DB connectivity and disk I/O

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::{collections::HashMap, path::Path};
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Runs a lightweight query against SQLite (`SELECT 1`).
/// 2. Performs a write/read/delete round trip in the media directory.
///
/// Returns JSON describing each check. HTTP 200 when all checks pass,
/// HTTP 503 when any check fails.
pub async fn readyz(State(app): State<AppState>) -> impl IntoResponse {
    let sqlite_check = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*app.db)
        .await
    {
        Ok(1) => CheckStatus { ok: true, error: None },
        Ok(v) => CheckStatus {
            ok: false,
            error: Some(format!("unexpected result: {}", v)),
        },
        Err(e) => CheckStatus {
            ok: false,
            error: Some(format!("error: {}", e)),
        },
    };

    let disk_check = match probe_media_dir(&app.media_dir).await {
        Ok(()) => CheckStatus { ok: true, error: None },
        Err(reason) => CheckStatus {
            ok: false,
            error: Some(reason),
        },
    };

    let overall_ok = sqlite_check.ok && disk_check.ok;

    let mut checks = HashMap::new();
    checks.insert("sqlite", sqlite_check);
    checks.insert("disk", disk_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Write, read back, and remove a probe file under the media directory.
async fn probe_media_dir(media_dir: &Path) -> Result<(), String> {
    let tmp_path = media_dir.join(format!(".readyz-{}", Uuid::new_v4()));

    fs::write(&tmp_path, b"readyz")
        .await
        .map_err(|e| format!("could not write probe file: {}", e))?;

    let outcome = match fs::read(&tmp_path).await {
        Ok(bytes) if bytes == b"readyz" => Ok(()),
        Ok(_) => Err("probe file content mismatch".to_string()),
        Err(e) => Err(format!("could not read probe file: {}", e)),
    };

    let _ = fs::remove_file(&tmp_path).await; // best-effort cleanup
    outcome
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
