use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::PushError;

/// A notification addressed to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LoggingGateway;

#[async_trait]
impl PushGateway for LoggingGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        tracing::info!(
            target: "push",
            token = %message.token,
            title = %message.title,
            body = %message.body,
            "push notification (not delivered)"
        );
        Ok(())
    }
}
