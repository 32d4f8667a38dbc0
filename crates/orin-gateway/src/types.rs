use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{Context, Result};

use orin_agent::Responder;
use orin_extract::UploadedDocument;

use crate::oauth_client::GoogleOAuthConfig;

const OAUTH_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
/// Public struct `GatewayConfig` used across Orin components.
pub struct GatewayConfig {
    pub bind: String,
    pub oauth: GoogleOAuthConfig,
    pub session_secret: String,
    pub session_ttl_seconds: u64,
}

/// Public struct `ServerState` used across Orin components.
///
/// Shared across handlers behind one `Arc`. Pending uploads are held in
/// memory keyed by the signed-in identity until the next chat message
/// consumes them; they do not survive a restart.
pub struct ServerState {
    pub responder: Responder,
    pub http: reqwest::Client,
    pub oauth: GoogleOAuthConfig,
    pub session_secret: String,
    pub session_ttl_seconds: u64,
    pub pending_uploads: Mutex<BTreeMap<String, UploadedDocument>>,
}

impl ServerState {
    pub fn new(
        responder: Responder,
        oauth: GoogleOAuthConfig,
        session_secret: String,
        session_ttl_seconds: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(OAUTH_HTTP_TIMEOUT_SECS))
            .build()
            .context("failed to build identity provider http client")?;

        Ok(Self {
            responder,
            http,
            oauth,
            session_secret,
            session_ttl_seconds,
            pending_uploads: Mutex::new(BTreeMap::new()),
        })
    }
}
