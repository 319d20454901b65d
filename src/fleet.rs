//! Fleet API collaborator.
//!
//! The pipeline only talks to the fleet through [`FleetApi`], so tests can swap
//! in a recording fake. [`HttpFleetClient`] is the production implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{LeaseRequest, LeaseResult, Server, Stack};

#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn stacks(&self) -> Result<Vec<Stack>>;

    /// Servers of one stack, in fleet listing order.
    async fn servers(&self, stack_uid: &str) -> Result<Vec<Server>>;

    /// Private key material that authenticates against `server_uid`.
    async fn server_private_key(&self, stack_uid: &str, server_uid: &str) -> Result<String>;

    /// Open the firewall and wait until the fleet confirms or refuses.
    async fn lease(&self, request: &LeaseRequest) -> Result<LeaseResult>;
}

/// All responses are wrapped in `{"response": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct SshKeyBody {
    ssh_key: String,
}

#[derive(Debug, Deserialize)]
struct GenericBody {
    ok: bool,
}

#[derive(Debug, Clone)]
pub struct HttpFleetClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpFleetClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("leasecp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::api(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::api(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(Error::api(format!("{}: {}", status, body.trim())));
        }

        decode_envelope(&body)
    }
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(|envelope| envelope.response)
        .map_err(|e| Error::api(format!("Failed to decode response: {}", e)))
}

#[async_trait]
impl FleetApi for HttpFleetClient {
    async fn stacks(&self) -> Result<Vec<Stack>> {
        tracing::debug!("listing stacks");
        self.send(self.client.get(self.url("stacks.json"))).await
    }

    async fn servers(&self, stack_uid: &str) -> Result<Vec<Server>> {
        tracing::debug!(stack = %stack_uid, "listing servers");
        let url = self.url(&format!("stacks/{}/servers.json", stack_uid));
        self.send(self.client.get(url)).await
    }

    async fn server_private_key(&self, stack_uid: &str, server_uid: &str) -> Result<String> {
        tracing::debug!(server = %server_uid, "downloading ssh key");
        let url = self.url(&format!(
            "stacks/{}/servers/{}/ssh_key.json",
            stack_uid, server_uid
        ));
        let body: SshKeyBody = self.send(self.client.get(url)).await?;
        Ok(body.ssh_key)
    }

    async fn lease(&self, request: &LeaseRequest) -> Result<LeaseResult> {
        tracing::debug!(?request, "requesting lease");
        let url = self.url(&format!(
            "stacks/{}/firewalls/lease_sync.json",
            request.stack_uid
        ));
        let body: GenericBody = self
            .send(self.client.post(url).json(request))
            .await
            .map_err(|e| Error::Lease {
                message: e.to_string(),
            })?;
        Ok(LeaseResult { granted: body.ok })
    }
}
