//! DigitalOcean adapter (`GET /v2/droplets`)

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use super::{parse_timestamp, InstanceSnapshot, PowerState, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://api.digitalocean.com";

pub struct DigitalOceanAdapter {
    base_url: String,
}

impl DigitalOceanAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for DigitalOceanAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListDropletsResponse {
    droplets: Vec<Droplet>,
}

#[derive(Debug, Deserialize)]
struct Droplet {
    status: String,
    created_at: String,
    networks: Networks,
}

#[derive(Debug, Deserialize)]
struct Networks {
    #[serde(default)]
    v4: Vec<V4Network>,
}

#[derive(Debug, Deserialize)]
struct V4Network {
    ip_address: String,
    #[serde(rename = "type")]
    kind: String,
}

#[async_trait]
impl ProviderAdapter for DigitalOceanAdapter {
    fn name(&self) -> &'static str {
        "digitalocean"
    }

    async fn fetch_instances(
        &self,
        client: &reqwest::Client,
        token: &str,
    ) -> anyhow::Result<Vec<InstanceSnapshot>> {
        let url = format!("{}/v2/droplets", self.base_url);
        trace!("listing DigitalOcean droplets");

        let response = client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("failed to reach DigitalOcean API")?;

        if !response.status().is_success() {
            anyhow::bail!("DigitalOcean API returned {}", response.status());
        }

        let body: ListDropletsResponse = response
            .json()
            .await
            .context("failed to parse DigitalOcean droplet list")?;

        let instances = body
            .droplets
            .into_iter()
            .filter_map(|droplet| {
                let ip = droplet
                    .networks
                    .v4
                    .iter()
                    .find(|net| net.kind == "public")
                    .map(|net| net.ip_address.clone())?;
                let created_at = parse_timestamp(&droplet.created_at)?;
                let state = match droplet.status.as_str() {
                    "active" => PowerState::Running,
                    "off" => PowerState::Stopped,
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
