//! The static event program.

use crate::models::schedule::{self, ScheduleEntry};
use axum::Json;

/// `GET /api/schedule` — the fixed program, in display order.
pub async fn get_schedule() -> Json<&'static [ScheduleEntry]> {
    Json(schedule::program())
}
