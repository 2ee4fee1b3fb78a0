use tracing::info;

use orderbell_scheduler::Scheduler;
use orderbell_types::events::{TriggerEvent, TriggerKind};
use orderbell_types::models::Credentials;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Registered,
    Unregistered { existed: bool },
}

pub fn parse_event(raw: &str) -> Result<TriggerEvent, ApiError> {
    serde_json::from_str(raw).map_err(|e| ApiError::BadRequest(format!("invalid event: {}", e)))
}

/// Apply a trigger event through the same scheduler operations the HTTP
/// routes use.
pub async fn handle_event(scheduler: &Scheduler, event: TriggerEvent) -> Result<EventOutcome, ApiError> {
    let payload = event.client_payload;
    info!(event_type = ?event.event_type, "handling trigger event");

    match event.event_type {
        TriggerKind::Register => {
            let (Some(username), Some(password)) = (payload.username, payload.password) else {
                return Err(ApiError::BadRequest(
                    "register event needs username and password".into(),
                ));
            };
            scheduler
                .register(Credentials::new(username, password), payload.fcm_token)
                .await?;
            Ok(EventOutcome::Registered)
        }
        TriggerKind::Unregister => {
            let existed = scheduler.unregister(&payload.fcm_token).await;
            Ok(EventOutcome::Unregistered { existed })
        }
    }
}
