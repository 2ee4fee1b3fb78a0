//! Client for the order-management API: login and order listing.

pub mod auth;
pub mod client;
pub mod error;
pub mod orders;

pub use auth::{AuthResult, Authenticator, BearerToken};
pub use client::{UpstreamClient, UpstreamConfig};
pub use error::UpstreamError;
pub use orders::OrderFeed;
