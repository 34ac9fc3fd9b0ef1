//! Cloud provider adapters
//!
//! One adapter per supported provider, each implementing the read-only
//! "list compute instances" call behind [`ProviderAdapter`]. The
//! adapters only normalize the provider payload into
//! [`InstanceSnapshot`]s; matching against registered servers and
//! uptime computation live in the collector.
//!
//! None of the provider APIs used here expose real resource
//! utilization, so the collector synthesizes cpu/memory/disk values
//! conditioned on the reported power state. That approximation is
//! deliberate.

pub mod digitalocean;
pub mod hetzner;
pub mod linode;
pub mod scaleway;
pub mod vultr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::store::schema::Provider;

pub use digitalocean::DigitalOceanAdapter;
pub use hetzner::HetznerAdapter;
pub use linode::LinodeAdapter;
pub use scaleway::ScalewayAdapter;
pub use vultr::VultrAdapter;

/// Reported power state of a provider instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Running,
    Stopped,
    Unknown,
}

/// Normalized view of one compute instance as returned by a provider's
/// list endpoint
#[derive(Debug, Clone)]
pub struct InstanceSnapshot {
    /// Public IPv4 address, used to match against registered servers
    pub public_ip: String,

    pub state: PowerState,

    /// Instance creation time, basis for uptime computation
    pub created_at: DateTime<Utc>,
}

/// Read-only provider API surface.
///
/// `fetch_instances` performs exactly one HTTP request; callers own the
/// client (and therefore the timeout policy) and the error handling.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_instances(
        &self,
        client: &reqwest::Client,
        token: &str,
    ) -> anyhow::Result<Vec<InstanceSnapshot>>;
}

/// Adapter for a provider at its default API endpoint. `Other` and any
/// future unrecognized provider get `None` and fall through to
/// synthetic telemetry.
pub fn adapter_for(provider: Provider) -> Option<Box<dyn ProviderAdapter>> {
    match provider {
        Provider::Hetzner => Some(Box::new(HetznerAdapter::new())),
        Provider::DigitalOcean => Some(Box::new(DigitalOceanAdapter::new())),
        Provider::Vultr => Some(Box::new(VultrAdapter::new())),
        Provider::Linode => Some(Box::new(LinodeAdapter::new())),
        Provider::Scaleway => Some(Box::new(ScalewayAdapter::new())),
        Provider::Other => None,
    }
}

/// Adapter with an overridden base URL (tests point this at a mock
/// server).
pub fn adapter_with_base(provider: Provider, base_url: &str) -> Option<Box<dyn ProviderAdapter>> {
    match provider {
        Provider::Hetzner => Some(Box::new(HetznerAdapter::with_base_url(base_url))),
        Provider::DigitalOcean => Some(Box::new(DigitalOceanAdapter::with_base_url(base_url))),
        Provider::Vultr => Some(Box::new(VultrAdapter::with_base_url(base_url))),
        Provider::Linode => Some(Box::new(LinodeAdapter::with_base_url(base_url))),
        Provider::Scaleway => Some(Box::new(ScalewayAdapter::with_base_url(base_url))),
        Provider::Other => None,
    }
}

/// Parse a provider timestamp. Most providers return RFC 3339; Linode
/// omits the offset, so a naive fallback is kept.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
