//! Push delivery: the new-orders notifier and the gateways behind it.

pub mod error;
pub mod fcm;
pub mod gateway;
pub mod notifier;

pub use error::PushError;
pub use fcm::{FcmGateway, ServiceAccount};
pub use gateway::{LoggingGateway, PushGateway, PushMessage};
pub use notifier::Notifier;
