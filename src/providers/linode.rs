//! Linode adapter (`GET /v4/linode/instances`)

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use super::{parse_timestamp, InstanceSnapshot, PowerState, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://api.linode.com";

pub struct LinodeAdapter {
    base_url: String,
}

impl LinodeAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for LinodeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListInstancesResponse {
    data: Vec<LinodeInstance>,
}

#[derive(Debug, Deserialize)]
struct LinodeInstance {
    status: String,
    created: String,
    #[serde(default)]
    ipv4: Vec<String>,
}

#[async_trait]
impl ProviderAdapter for LinodeAdapter {
    fn name(&self) -> &'static str {
        "linode"
    }

    async fn fetch_instances(
        &self,
        client: &reqwest::Client,
        token: &str,
    ) -> anyhow::Result<Vec<InstanceSnapshot>> {
        let url = format!("{}/v4/linode/instances", self.base_url);
        trace!("listing Linode instances");

        let response = client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("failed to reach Linode API")?;

        if !response.status().is_success() {
            anyhow::bail!("Linode API returned {}", response.status());
        }

        let body: ListInstancesResponse = response
            .json()
            .await
            .context("failed to parse Linode instance list")?;

        let instances = body
            .data
            .into_iter()
            .filter_map(|instance| {
                // First ipv4 entry is the public address.
                let ip = instance.ipv4.first().cloned()?;
                let created_at = parse_timestamp(&instance.created)?;
                let state = match instance.status.as_str() {
                    "running" => PowerState::Running,
                    "offline" | "stopped" => PowerState::Stopped,
                    _ => PowerState::Unknown,
                };

                Some(InstanceSnapshot {
                    public_ip: ip,
                    state,
                    created_at,
                })
            })
            .collect();

        Ok(instances)
    }
}
