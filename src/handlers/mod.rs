pub mod health_handlers;
pub mod media_handlers;
pub mod message_handlers;
pub mod schedule_handlers;
