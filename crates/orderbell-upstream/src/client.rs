use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::UpstreamError;

pub const AUTH_PATH: &str = "Authorization/Authenticate";
pub const ORDERS_PATH: &str = "Orders/GetOrders";

const SECURITY_KEY_HEADER: HeaderName = HeaderName::from_static("securitykey");
pub(crate) const AUTHORIZATION_CODE_HEADER: HeaderName = HeaderName::from_static("authorizationcode");

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// e.g. `https://app.ghazaresan.com/api/`
    pub base_url: String,
    /// Shared static secret sent with every request.
    pub security_key: String,
    /// Sent as `Origin`, and with a trailing slash as `Referer`.
    pub portal_origin: String,
}

/// HTTP client for both upstream endpoints. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self::with_http(Client::new(), config)
    }

    pub fn with_http(http: Client, config: UpstreamConfig) -> Self {
        Self { http, config }
    }

    pub fn security_key(&self) -> &str {
        &self.config.security_key
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Header set the portal sends on every call.
    pub(crate) fn base_headers(&self) -> Result<HeaderMap, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(SECURITY_KEY_HEADER, header_value(&self.config.security_key)?);

        let origin = self.config.portal_origin.trim_end_matches('/');
        headers.insert(ORIGIN, header_value(origin)?);
        headers.insert(REFERER, header_value(&format!("{}/", origin))?);
        Ok(headers)
    }

    /// POST a JSON body and decode the JSON reply. Single attempt.
    pub(crate) async fn post_json<B, T>(
        &self,
        path: &str,
        headers: HeaderMap,
        body: &B,
    ) -> Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(self.url(path))
            .headers(headers)
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue, UpstreamError> {
    HeaderValue::from_str(value)
        .map_err(|_| UpstreamError::Malformed(format!("value not valid in a header: {:?}", value)))
}
