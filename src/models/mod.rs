//! Core data models for the event board.
//!
//! `Asset` and `Message` map to database rows via `sqlx::FromRow` and
//! serialize naturally as JSON via `serde`. The schedule is static
//! presentation data with no store involvement.

pub mod asset;
pub mod message;
pub mod schedule;
