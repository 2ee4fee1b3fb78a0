use async_trait::async_trait;
use tracing::{debug, warn};

use orderbell_types::models::{AuthenticateBody, AuthenticateReply, Credentials};

use crate::client::{AUTH_PATH, UpstreamClient};
use crate::error::UpstreamError;

/// Short-lived authorization token issued by the login endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Outcome of one login attempt. Never cached across poll cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Authenticated(BearerToken),
    Failed,
}

impl AuthResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthResult::Authenticated(_))
    }

    pub fn token(&self) -> Option<&BearerToken> {
        match self {
            AuthResult::Authenticated(token) => Some(token),
            AuthResult::Failed => None,
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a token. Every failure is folded into
    /// [`AuthResult::Failed`]; nothing is retried.
    async fn authenticate(&self, credentials: &Credentials) -> AuthResult;
}

impl UpstreamClient {
    pub async fn login(&self, credentials: &Credentials) -> Result<BearerToken, UpstreamError> {
        let body = AuthenticateBody {
            username: &credentials.username,
            password: &credentials.password,
        };
        let reply: AuthenticateReply = self.post_json(AUTH_PATH, self.base_headers()?, &body).await?;

        match reply.token {
            Some(token) if !token.is_empty() => Ok(BearerToken::new(token)),
            _ => Err(UpstreamError::Malformed("login reply has no Token".into())),
        }
    }
}

#[async_trait]
impl Authenticator for UpstreamClient {
    async fn authenticate(&self, credentials: &Credentials) -> AuthResult {
        match self.login(credentials).await {
            Ok(token) => {
                debug!(username = %credentials.username, "authenticated");
                AuthResult::Authenticated(token)
            }
            Err(e) => {
                warn!(username = %credentials.username, "authentication failed: {}", e);
                AuthResult::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = BearerToken::new("secret-token");
        assert_eq!(format!("{token:?}"), "BearerToken(<redacted>)");
        assert_eq!(token.as_str(), "secret-token");
    }

    #[test]
    fn failed_result_has_no_token() {
        assert!(!AuthResult::Failed.is_success());
        assert!(AuthResult::Failed.token().is_none());
        let ok = AuthResult::Authenticated(BearerToken::new("t"));
        assert_eq!(ok.token().map(BearerToken::as_str), Some("t"));
    }
}
