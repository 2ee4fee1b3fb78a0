use std::sync::Arc;

use tracing::{debug, warn};

use orderbell_push::Notifier;
use orderbell_types::models::Credentials;
use orderbell_upstream::{AuthResult, Authenticator, OrderFeed};

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Login failed; orders were not fetched.
    AuthFailed,
    /// The order list could not be fetched or parsed.
    UpstreamFailed,
    NoNewOrders,
    /// A notification for this many new orders was handed to the gateway.
    Notified(usize),
}

/// The collaborators a tick runs through.
#[derive(Clone)]
pub struct TickPipeline {
    auth: Arc<dyn Authenticator>,
    orders: Arc<dyn OrderFeed>,
    notifier: Notifier,
}

impl TickPipeline {
    pub fn new(auth: Arc<dyn Authenticator>, orders: Arc<dyn OrderFeed>, notifier: Notifier) -> Self {
        Self {
            auth,
            orders,
            notifier,
        }
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> AuthResult {
        self.auth.authenticate(credentials).await
    }

    /// authenticate -> fetch new orders -> notify when there are any.
    ///
    /// Never fails: every error ends the tick early and is logged.
    pub async fn run_tick(&self, credentials: &Credentials, push_token: &str) -> TickOutcome {
        let token = match self.auth.authenticate(credentials).await {
            AuthResult::Authenticated(token) => token,
            AuthResult::Failed => {
                debug!(username = %credentials.username, "skipping tick, login failed");
                return TickOutcome::AuthFailed;
            }
        };

        let count = match self.orders.fetch_new_orders(&token).await {
            Ok(count) => count,
            Err(e) => {
                warn!(username = %credentials.username, "order check failed: {}", e);
                return TickOutcome::UpstreamFailed;
            }
        };

        if count == 0 {
            return TickOutcome::NoNewOrders;
        }

        self.notifier.notify(push_token, count).await;
        TickOutcome::Notified(count)
    }
}
