use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The device token is unknown to the gateway or has expired.
    #[error("push token rejected by gateway")]
    InvalidToken,

    #[error("gateway returned {status}: {body}")]
    Gateway { status: StatusCode, body: String },

    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway authorization failed: {0}")]
    Auth(String),

    #[error("invalid service account: {0}")]
    Credentials(String),
}
