//! Scaleway adapter (`GET /instance/v1/zones/{zone}/servers`)
//!
//! Scaleway authenticates with an `X-Auth-Token` header instead of a
//! bearer token; the adapter hides that difference.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use super::{parse_timestamp, InstanceSnapshot, PowerState, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://api.scaleway.com";
const DEFAULT_ZONE: &str = "fr-par-1";

pub struct ScalewayAdapter {
    base_url: String,
    zone: String,
}

impl ScalewayAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            zone: DEFAULT_ZONE.to_string(),
        }
    }
}

impl Default for ScalewayAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListServersResponse {
    servers: Vec<ScalewayServer>,
}

#[derive(Debug, Deserialize)]
struct ScalewayServer {
    state: String,
    creation_date: String,
    public_ip: Option<PublicIp>,
}

#[derive(Debug, Deserialize)]
struct PublicIp {
    address: String,
}

#[async_trait]
impl ProviderAdapter for ScalewayAdapter {
    fn name(&self) -> &'static str {
        "scaleway"
    }

    async fn fetch_instances(
        &self,
        client: &reqwest::Client,
        token: &str,
    ) -> anyhow::Result<Vec<InstanceSnapshot>> {
        let url = format!("{}/instance/v1/zones/{}/servers", self.base_url, self.zone);
        trace!("listing Scaleway servers in {}", self.zone);

        let response = client
            .get(&url)
            .header("X-Auth-Token", token)
            .send()
            .await
            .context("failed to reach Scaleway API")?;

        if !response.status().is_success() {
            anyhow::bail!("Scaleway API returned {}", response.status());
        }

        let body: ListServersResponse = response
            .json()
            .await
            .context("failed to parse Scaleway server list")?;

        let instances = body
            .servers
            .into_iter()
            .filter_map(|server| {
                let ip = server.public_ip.map(|p| p.address)?;
                let created_at = parse_timestamp(&server.creation_date)?;
                let state = match server.state.as_str() {
                    "running" => PowerState::Running,
                    "stopped" | "stopped in place" => PowerState::Stopped,
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
