//! Endpoint liveness probing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::config::ProbeConfig;
use crate::error::Result;

/// Answers "is this endpoint reachable right now?".
///
/// Implementations must not fail: any error is an unreachable endpoint.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &str) -> bool;
}

/// HTTP prober backed by `reqwest`.
///
/// Reachable means the GET completed (after redirects) with a status below
/// 500. Connection errors, timeouts and unparsable URLs are unreachable.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Build a prober with an explicit timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.timeout_secs), &config.user_agent)
    }
}

/// Parse an endpoint, assuming `https://` when no scheme is given.
pub fn probe_url(endpoint: &str) -> Option<Url> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return None;
    }
    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };
    let url = Url::parse(&candidate).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &str) -> bool {
        let Some(url) = probe_url(endpoint) else {
            debug!(endpoint = %endpoint, "Unprobeable endpoint");
            return false;
        };

        match self.client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                debug!(endpoint = %endpoint, status = %status, "Probe response");
                !status.is_server_error()
            }
            Err(e) => {
                debug!(endpoint = %endpoint, error = %e, "Probe failed");
                false
            }
        }
    }
}
