//! Vultr adapter (`GET /v2/instances`)

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use super::{parse_timestamp, InstanceSnapshot, PowerState, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://api.vultr.com";

pub struct VultrAdapter {
    base_url: String,
}

impl VultrAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for VultrAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListInstancesResponse {
    instances: Vec<VultrInstance>,
}

#[derive(Debug, Deserialize)]
struct VultrInstance {
    main_ip: String,
    power_status: String,
    date_created: String,
}

#[async_trait]
impl ProviderAdapter for VultrAdapter {
    fn name(&self) -> &'static str {
        "vultr"
    }

    async fn fetch_instances(
        &self,
        client: &reqwest::Client,
        token: &str,
    ) -> anyhow::Result<Vec<InstanceSnapshot>> {
        let url = format!("{}/v2/instances", self.base_url);
        trace!("listing Vultr instances");

        let response = client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("failed to reach Vultr API")?;

        if !response.status().is_success() {
            anyhow::bail!("Vultr API returned {}", response.status());
        }

        let body: ListInstancesResponse = response
            .json()
            .await
            .context("failed to parse Vultr instance list")?;

        let instances = body
            .instances
            .into_iter()
            .filter_map(|instance| {
                let created_at = parse_timestamp(&instance.date_created)?;
                let state = match instance.power_status.as_str() {
                    "running" => PowerState::Running,
                    "stopped" => PowerState::Stopped,
                    _ => PowerState::Unknown,
                };

                Some(InstanceSnapshot {
                    public_ip: instance.main_ip,
                    state,
                    created_at,
                })
            })
            .collect();

        Ok(instances)
    }
}
