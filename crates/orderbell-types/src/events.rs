use serde::Deserialize;

/// One-shot trigger payload, delivered instead of an HTTP request.
///
/// ```json
/// {"event_type": "register", "client_payload": {"username": "...", "password": "...", "fcmToken": "..."}}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerEvent {
    pub event_type: TriggerKind,
    pub client_payload: ClientPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Register,
    Unregister,
}

/// Username and password are only required for `register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub fcm_token: String,
}
