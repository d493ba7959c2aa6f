use async_trait::async_trait;
use dcl_auth_core::{ChainValidator, ProviderConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Signature-validation endpoint exposed by every trusted server.
pub const VALIDATE_SIGNATURE_PATH: &str = "/crypto/validate-signature";

/// Per-server call budget. One slow server must not consume the whole
/// attempt; it gets skipped and the next server is tried.
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// What one trusted server said about a chain. Transient, never persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VerificationVerdict {
    #[serde(default)]
    pub valid: bool,
    #[serde(default, rename = "ownerAddress")]
    pub owner_address: Option<String>,
}

impl VerificationVerdict {
    /// Conclusive means explicitly valid together with a non-empty owner
    /// address; anything else has no opinion on the chain.
    fn into_conclusive_owner(self) -> Option<String> {
        if !self.valid {
            return None;
        }
        self.owner_address.filter(|owner| !owner.is_empty())
    }
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    #[serde(rename = "authChain")]
    auth_chain: &'a Value,
    timestamp: &'a Value,
}

/// `ChainValidator` implementation that delegates to trusted Catalyst
/// servers, consulting them strictly in configured order.
pub struct CatalystChainValidator {
    client: reqwest::Client,
    trusted_servers: Vec<String>,
}

impl CatalystChainValidator {
    /// Builds a validator over an ordered server list. URLs are expected to
    /// be pre-normalized (no trailing slash), as `ProviderConfig` produces.
    pub fn new(trusted_servers: Vec<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            client,
            trusted_servers,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.trusted_servers.clone())
    }

    async fn query_server(
        &self,
        server: &str,
        request: &ValidateRequest<'_>,
    ) -> Result<VerificationVerdict, reqwest::Error> {
        let url = format!("{}{}", server, VALIDATE_SIGNATURE_PATH);
        let response = self.client.post(&url).json(request).send().await?;
        response.error_for_status()?.json().await
    }
}

#[async_trait]
impl ChainValidator for CatalystChainValidator {
    async fn validate(&self, timestamp: &Value, auth_chain: &Value) -> Option<String> {
        let request = ValidateRequest {
            auth_chain,
            timestamp,
        };

        for server in &self.trusted_servers {
            match self.query_server(server, &request).await {
                Ok(verdict) => {
                    if let Some(owner) = verdict.into_conclusive_owner() {
                        return Some(owner);
                    }
                    debug!(%server, "trusted server returned an inconclusive verdict");
                }
                Err(error) => {
                    warn!(%server, %error, "failed to reach trusted server");
                }
            }
        }
        None
    }

    fn max_attempt_duration(&self) -> Duration {
        CALL_TIMEOUT * self.trusted_servers.len() as u32
    }
}
