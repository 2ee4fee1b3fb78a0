use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::PushError;
use crate::gateway::{PushGateway, PushMessage};

pub const NEW_ORDERS_TITLE: &str = "New Orders Available";

/// Turns a new-order count into a push notification.
#[derive(Clone)]
pub struct Notifier {
    gateway: Arc<dyn PushGateway>,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn PushGateway>) -> Self {
        Self { gateway }
    }

    pub fn new_orders_message(push_token: &str, count: usize) -> PushMessage {
        let mut data = BTreeMap::new();
        data.insert("orderCount".to_string(), count.to_string());

        PushMessage {
            token: push_token.to_string(),
            title: NEW_ORDERS_TITLE.to_string(),
            body: format!("You have {} new order(s) waiting", count),
            data,
        }
    }

    /// Deliver the new-orders notification. Failures are logged, never returned.
    pub async fn notify(&self, push_token: &str, count: usize) {
        let message = Self::new_orders_message(push_token, count);

        match self.gateway.send(&message).await {
            Ok(()) => info!(push_token, count, "new-orders notification sent"),
            Err(PushError::InvalidToken) => {
                warn!(push_token, "push token rejected, notification dropped")
            }
            Err(e) => warn!(push_token, "notification delivery failed: {}", e),
        }
    }
}
