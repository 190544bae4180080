//! Outbound liveness probes used by lock maintenance
//!
//! A probe asks the node that requested a lock whether it still considers the
//! acquisition live. Transport failures never count as evidence of staleness.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::LockHolder;

/// Answer of a liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The requester still holds the lock
    Live,
    /// The requester no longer recognizes the request id
    Expired,
    /// No authoritative answer (timeout, refusal, bad reply); retry next cycle
    Inconclusive,
}

#[async_trait]
pub trait LivenessVerifier: Send + Sync {
    async fn probe(&self, name: &str, holder: &LockHolder) -> ProbeOutcome;
}

/// Probe body sent to the requester's callback route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredProbe {
    pub resource_name: String,
    pub request_id: String,
}

#[derive(Debug, Deserialize)]
struct ProbeReply {
    code: i32,
    data: bool,
}

/// Configuration for the HTTP verifier
#[derive(Clone, Debug)]
pub struct HttpVerifierConfig {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for HttpVerifierConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2000,
            timeout_ms: 5000,
        }
    }
}

/// Liveness verifier that POSTs to `http://{requester_node}{callback_path}`
pub struct HttpLivenessVerifier {
    client: Client,
}

impl HttpLivenessVerifier {
    pub fn new(config: HttpVerifierConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client })
    }

    /// Callback URL for a holder
    pub fn callback_url(holder: &LockHolder) -> String {
        let node = holder.requester_node.trim_end_matches('/');
        let base = if node.starts_with("http://") || node.starts_with("https://") {
            node.to_string()
        } else {
            format!("http://{}", node)
        };
        if holder.callback_path.starts_with('/') {
            format!("{}{}", base, holder.callback_path)
        } else {
            format!("{}/{}", base, holder.callback_path)
        }
    }
}

#[async_trait]
impl LivenessVerifier for HttpLivenessVerifier {
    async fn probe(&self, name: &str, holder: &LockHolder) -> ProbeOutcome {
        let url = Self::callback_url(holder);
        let body = ExpiredProbe {
            resource_name: name.to_string(),
            request_id: holder.request_id.clone(),
        };

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Liveness probe failed");
                return ProbeOutcome::Inconclusive;
            }
        };

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Liveness probe rejected");
            return ProbeOutcome::Inconclusive;
        }

        match response.json::<ProbeReply>().await {
            Ok(reply) if reply.code == 0 => {
                if reply.data {
                    ProbeOutcome::Expired
                } else {
                    ProbeOutcome::Live
                }
            }
            Ok(reply) => {
                debug!(url = %url, code = reply.code, "Liveness probe returned error code");
                ProbeOutcome::Inconclusive
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Liveness probe reply undecodable");
                ProbeOutcome::Inconclusive
            }
        }
    }
}
