use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

pub const DEFAULT_API_BASE_URL: &str = "https://app.ghazaresan.com/api/";
pub const DEFAULT_PORTAL_ORIGIN: &str = "https://portal.ghazaresan.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub api_base_url: String,
    pub portal_origin: String,
    pub security_key: String,
    /// Service account JSON. Without it notifications are only logged.
    pub firebase_credentials: Option<String>,
    pub firebase_project_id: Option<String>,
    /// Apply this trigger event instead of serving HTTP.
    pub event_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let security_key = match get("SECURITY_KEY") {
            Some(key) => key,
            None => bail!("SECURITY_KEY is unset; the order API rejects every request without it"),
        };

        let host = get("ORDERBELL_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            addr,
            api_base_url: get("ORDERBELL_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into()),
            portal_origin: get("ORDERBELL_PORTAL_ORIGIN").unwrap_or_else(|| DEFAULT_PORTAL_ORIGIN.into()),
            security_key,
            firebase_credentials: get("FIREBASE_CREDENTIALS"),
            firebase_project_id: get("FIREBASE_PROJECT_ID"),
            event_path: get("ORDERBELL_EVENT_PATH").map(PathBuf::from),
        })
    }
}
