//! Inbound surface: HTTP handlers and one-shot trigger events, both
//! forwarding to the scheduler.

pub mod error;
pub mod events;
pub mod routes;

pub use error::ApiError;
pub use routes::{AppState, router};
