//! Metrics collector
//!
//! Produces one [`ResourceSnapshot`] per server. When the server has a
//! bound provider credential, the provider's instance list is fetched
//! and the server is matched by public IP; metrics are then synthesized
//! within plausible ranges conditioned on the instance's power state
//! (the APIs expose no real utilization). With no credential, no match
//! or any upstream error the collector degrades to a fully synthetic
//! snapshot.
//!
//! `collect` never fails: upstream failures are logged and swallowed,
//! and the caller always receives a well-formed result.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::providers::{self, InstanceSnapshot, PowerState};
use crate::store::schema::{Provider, ProviderCredential, Server};

/// One collected resource snapshot, real or synthetic
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    /// CPU usage percentage (0-100)
    pub cpu: f64,

    /// Memory usage percentage (0-100)
    pub memory: f64,

    /// Disk usage percentage (0-100)
    pub disk: f64,

    /// Formatted uptime, e.g. "3d 7h" or "5h 12m"
    pub uptime: String,

    /// Whether the snapshot was derived from a live provider instance
    pub real: bool,
}

/// Collects telemetry for registered servers
pub struct MetricsCollector {
    /// HTTP client (reused across requests, carries the timeout policy)
    client: reqwest::Client,

    /// Per-provider base URL overrides (tests point these at mocks)
    base_overrides: HashMap<Provider, String>,
}

impl MetricsCollector {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_overrides: HashMap::new(),
        }
    }

    /// Override a provider's API base URL.
    pub fn with_base_url(mut self, provider: Provider, base_url: impl Into<String>) -> Self {
        self.base_overrides.insert(provider, base_url.into());
        self
    }

    /// Collect a snapshot for one server.
    #[instrument(skip_all, fields(server = %server.name, provider = %server.provider))]
    pub async fn collect(
        &self,
        server: &Server,
        credential: Option<&ProviderCredential>,
    ) -> ResourceSnapshot {
        if let Some(credential) = credential {
            let adapter = match self.base_overrides.get(&server.provider) {
                Some(base) => providers::adapter_with_base(server.provider, base),
                None => providers::adapter_for(server.provider),
            };

            if let Some(adapter) = adapter {
                match adapter.fetch_instances(&self.client, &credential.token).await {
                    Ok(instances) => {
                        if let Some(instance) =
                            instances.iter().find(|i| i.public_ip == server.address)
                        {
                            debug!("matched provider instance by IP {}", server.address);
                            return Self::from_instance(instance);
                        }
                        debug!(
                            "no instance matching {} among {} returned, using synthetic data",
                            server.address,
                            instances.len()
                        );
                    }
                    Err(e) => {
                        warn!("provider fetch failed, degrading to synthetic data: {e:#}");
                    }
                }
            }
        }

        Self::synthetic(server)
    }

    /// Snapshot derived from a matched provider instance. The power
    /// state drives the plausible ranges; disk is never "off" and is
    /// always synthesized 15-75%.
    fn from_instance(instance: &InstanceSnapshot) -> ResourceSnapshot {
        let mut rng = rand::rng();

        let (cpu, memory) = match instance.state {
            PowerState::Running | PowerState::Unknown => (
                rng.random_range(10.0..40.0),
                rng.random_range(20.0..70.0),
            ),
            PowerState::Stopped => (rng.random_range(0.0..2.0), rng.random_range(0.0..5.0)),
        };

        ResourceSnapshot {
            cpu,
            memory,
            disk: rng.random_range(15.0..75.0),
            uptime: format_uptime(instance.created_at, Utc::now()),
            real: true,
        }
    }

    /// Fully synthetic snapshot; uptime falls back to the server's own
    /// registration timestamp.
    fn synthetic(server: &Server) -> ResourceSnapshot {
        let mut rng = rand::rng();

        ResourceSnapshot {
            cpu: rng.random_range(0.0..100.0),
            memory: rng.random_range(0.0..100.0),
            disk: rng.random_range(0.0..100.0),
            uptime: format_uptime(server.created_at, Utc::now()),
            real: false,
        }
    }
}

/// Format the elapsed time since `since` as `"<d>d <h>h"` when at
/// least one full day has passed, otherwise `"<h>h <m>m"`.
pub fn format_uptime(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - since).max(chrono::Duration::zero());

    let days = elapsed.num_days();
    if days > 0 {
        let hours = elapsed.num_hours() - days * 24;
        format!("{days}d {hours}h")
    } else {
        let hours = elapsed.num_hours();
        let minutes = elapsed.num_minutes() - hours * 60;
        format!("{hours}h {minutes}m")
    }
}

/// Synthesize network counters (bytes). No provider API used here
/// exposes real traffic, so readings always carry synthetic values.
pub fn synthetic_network_bytes() -> (i64, i64) {
    let mut rng = rand::rng();
    (
        rng.random_range(100_000..50_000_000),
        rng.random_range(100_000..50_000_000),
    )
}
