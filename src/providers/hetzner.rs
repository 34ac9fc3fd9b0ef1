//! Hetzner Cloud adapter (`GET /v1/servers`)

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use super::{parse_timestamp, InstanceSnapshot, PowerState, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://api.hetzner.cloud";

pub struct HetznerAdapter {
    base_url: String,
}

impl HetznerAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for HetznerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListServersResponse {
    servers: Vec<HetznerServer>,
}

#[derive(Debug, Deserialize)]
struct HetznerServer {
    status: String,
    created: String,
    public_net: PublicNet,
}

#[derive(Debug, Deserialize)]
struct PublicNet {
    ipv4: Option<Ipv4>,
}

#[derive(Debug, Deserialize)]
struct Ipv4 {
    ip: String,
}

#[async_trait]
impl ProviderAdapter for HetznerAdapter {
    fn name(&self) -> &'static str {
        "hetzner"
    }

    async fn fetch_instances(
        &self,
        client: &reqwest::Client,
        token: &str,
    ) -> anyhow::Result<Vec<InstanceSnapshot>> {
        let url = format!("{}/v1/servers", self.base_url);
        trace!("listing Hetzner servers");

        let response = client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("failed to reach Hetzner API")?;

        if !response.status().is_success() {
            anyhow::bail!("Hetzner API returned {}", response.status());
        }

        let body: ListServersResponse = response
            .json()
            .await
            .context("failed to parse Hetzner server list")?;

        let instances = body
            .servers
            .into_iter()
            .filter_map(|server| {
                let ip = server.public_net.ipv4.map(|v4| v4.ip)?;
                let created_at = parse_timestamp(&server.created)?;
                let state = match server.status.as_str() {
                    "running" => PowerState::Running,
                    "off" | "stopping" => PowerState::Stopped,
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
