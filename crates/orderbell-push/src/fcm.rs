use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::PushError;
use crate::gateway::{PushGateway, PushMessage};

pub const FCM_BASE_URL: &str = "https://fcm.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Refresh the access token this long before it expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// The fields of a Google service account key file that FCM needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccount {
    /// Parse key file JSON. Accepts the form with escaped quotes (`{\"type\": ...}`)
    /// that some deploy environments store in variables.
    pub fn from_json(raw: &str) -> Result<Self, PushError> {
        match serde_json::from_str(raw) {
            Ok(account) => Ok(account),
            Err(first) => serde_json::from_str(&raw.replace("\\\"", "\""))
                .map_err(|_| PushError::Credentials(first.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenReply {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: WireMessage<'a>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    token: &'a str,
    notification: WireNotification<'a>,
    data: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct WireNotification<'a> {
    title: &'a str,
    body: &'a str,
}

/// Firebase Cloud Messaging, HTTP v1 API.
pub struct FcmGateway {
    http: Client,
    account: ServiceAccount,
    signing_key: EncodingKey,
    project_id: String,
    base_url: String,
    access_token: Mutex<Option<CachedToken>>,
}

impl FcmGateway {
    /// `project_id` overrides the one in the key file.
    pub fn new(account: ServiceAccount, project_id: Option<String>) -> Result<Self, PushError> {
        let signing_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| PushError::Credentials(format!("private_key: {}", e)))?;

        let project_id = project_id
            .filter(|p| !p.is_empty())
            .or_else(|| account.project_id.clone())
            .ok_or_else(|| PushError::Credentials("no project id".into()))?;

        Ok(Self {
            http: Client::new(),
            account,
            signing_key,
            project_id,
            base_url: FCM_BASE_URL.to_string(),
            access_token: Mutex::new(None),
        })
    }

    /// Point message sends at another host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, PushError> {
        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: MESSAGING_SCOPE,
            aud: &self.account.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| PushError::Auth(format!("signing assertion: {}", e)))
    }

    /// Cached OAuth2 access token, exchanged for a fresh one near expiry.
    async fn access_token(&self) -> Result<String, PushError> {
        let mut cached = self.access_token.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at > now {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.assertion(now)?;
        let resp = self
            .http
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PushError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let reply: TokenReply = resp
            .json()
            .await
            .map_err(|e| PushError::Auth(format!("token reply: {}", e)))?;

        debug!(expires_in = reply.expires_in, "obtained FCM access token");
        let lifetime = (reply.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0);
        *cached = Some(CachedToken {
            value: reply.access_token.clone(),
            expires_at: now + Duration::seconds(lifetime),
        });
        Ok(reply.access_token)
    }

    async fn forget_access_token(&self) {
        *self.access_token.lock().await = None;
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let access_token = self.access_token().await?;

        let body = SendRequest {
            message: WireMessage {
                token: &message.token,
                notification: WireNotification {
                    title: &message.title,
                    body: &message.body,
                },
                data: &message.data,
            },
        };

        let resp = self
            .http
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.forget_access_token().await;
        }
        Err(classify_failure(status, body))
    }
}

fn classify_failure(status: StatusCode, body: String) -> PushError {
    if status == StatusCode::NOT_FOUND || body.contains("UNREGISTERED") {
        PushError::InvalidToken
    } else {
        PushError::Gateway { status, body }
    }
}
