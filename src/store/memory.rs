//! In-memory data store (no persistence)
//!
//! Backs the integration tests and local experiments without a
//! database. Besides the plain [`DataStore`] implementation it exposes
//! seeding helpers and targeted failure injection so persistence
//! failures can be exercised deterministically.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::{DataStore, HealthStatus};
use super::error::{StoreError, StoreResult};
use super::schema::{
    AlertRule, MessagingInstance, MetricReading, NotificationRecord, ProviderCredential, Server,
    UserProfile, SYSTEM_CHANNEL,
};

/// Cap on stored readings per server, to bound memory in long test runs.
const MAX_READINGS_PER_SERVER: usize = 1000;

#[derive(Default)]
struct Inner {
    servers: Vec<Server>,
    credentials: HashMap<i64, ProviderCredential>,
    readings: HashMap<i64, Vec<MetricReading>>,
    rules: Vec<AlertRule>,
    notifications: Vec<NotificationRecord>,
    instances: Vec<MessagingInstance>,
    profiles: Vec<UserProfile>,
}

/// In-memory store with interior mutability.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,

    /// Server ids whose reading inserts should fail.
    reading_failures: RwLock<HashSet<i64>>,

    /// When set, every rule lookup fails.
    fail_rule_lookups: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_server(&self, server: Server) {
        self.inner.write().await.servers.push(server);
    }

    pub async fn add_credential(&self, credential: ProviderCredential) {
        self.inner
            .write()
            .await
            .credentials
            .insert(credential.id, credential);
    }

    pub async fn add_rule(&self, rule: AlertRule) {
        self.inner.write().await.rules.push(rule);
    }

    pub async fn add_profile(&self, profile: UserProfile) {
        self.inner.write().await.profiles.push(profile);
    }

    pub async fn add_instance(&self, instance: MessagingInstance) {
        self.inner.write().await.instances.push(instance);
    }

    /// Make `insert_reading` fail for the given server.
    pub async fn fail_readings_for(&self, server_id: i64) {
        self.reading_failures.write().await.insert(server_id);
    }

    /// Make every `active_rules_for_server` call fail.
    pub fn fail_rule_lookups(&self, fail: bool) {
        self.fail_rule_lookups.store(fail, Ordering::SeqCst);
    }

    pub async fn readings_for(&self, server_id: i64) -> Vec<MetricReading> {
        self.inner
            .read()
            .await
            .readings
            .get(&server_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn notifications(&self) -> Vec<NotificationRecord> {
        self.inner.read().await.notifications.clone()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn active_servers(&self) -> StoreResult<Vec<Server>> {
        let inner = self.inner.read().await;
        Ok(inner
            .servers
            .iter()
            .filter(|s| s.status == super::schema::ServerStatus::Active)
            .cloned()
            .collect())
    }

    async fn server(&self, id: i64) -> StoreResult<Option<Server>> {
        let inner = self.inner.read().await;
        Ok(inner.servers.iter().find(|s| s.id == id).cloned())
    }

    async fn credential(&self, id: i64) -> StoreResult<Option<ProviderCredential>> {
        let inner = self.inner.read().await;
        Ok(inner.credentials.get(&id).cloned())
    }

    async fn insert_reading(&self, reading: MetricReading) -> StoreResult<()> {
        if self
            .reading_failures
            .read()
            .await
            .contains(&reading.server_id)
        {
            return Err(StoreError::QueryFailed(format!(
                "injected insert failure for server {}",
                reading.server_id
            )));
        }

        let mut inner = self.inner.write().await;
        let readings = inner.readings.entry(reading.server_id).or_default();
        readings.push(reading);

        if readings.len() > MAX_READINGS_PER_SERVER {
            readings.remove(0);
        }

        Ok(())
    }

    async fn active_rules_for_server(&self, server_id: i64) -> StoreResult<Vec<AlertRule>> {
        if self.fail_rule_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::QueryFailed(
                "injected rule lookup failure".to_string(),
            ));
        }

        let inner = self.inner.read().await;
        Ok(inner
            .rules
            .iter()
            .filter(|r| r.active && r.server_id == Some(server_id))
            .cloned()
            .collect())
    }

    async fn alert_rule(&self, id: i64) -> StoreResult<Option<AlertRule>> {
        let inner = self.inner.read().await;
        Ok(inner.rules.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_notification(&self, record: NotificationRecord) -> StoreResult<()> {
        debug!(
            "recording notification: channel={} status={}",
            record.channel,
            record.status.as_str()
        );
        self.inner.write().await.notifications.push(record);
        Ok(())
    }

    async fn last_alert_notification(&self, rule_id: i64) -> StoreResult<Option<DateTime<Utc>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .notifications
            .iter()
            .filter(|n| n.channel == SYSTEM_CHANNEL && n.alerta_id == Some(rule_id))
            .map(|n| n.created_at)
            .max())
    }

    async fn user_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn profile_by_token(&self, token: &str) -> StoreResult<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .iter()
            .find(|p| p.api_token.as_deref() == Some(token))
            .cloned())
    }

    async fn fallback_profile(&self) -> StoreResult<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .iter()
            .find(|p| p.is_admin)
            .or_else(|| inner.profiles.first())
            .cloned())
    }

    async fn connected_instance(&self, user_id: &str) -> StoreResult<Option<MessagingInstance>> {
        let inner = self.inner.read().await;
        Ok(inner
            .instances
            .iter()
            .find(|i| i.user_id == user_id && i.is_connected())
            .cloned())
    }

    async fn health_check(&self) -> StoreResult<HealthStatus> {
        let inner = self.inner.read().await;
        Ok(HealthStatus {
            healthy: true,
            message: "in-memory store operational".to_string(),
            metadata: std::collections::HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("servers".to_string(), inner.servers.len().to_string()),
                (
                    "notifications".to_string(),
                    inner.notifications.len().to_string(),
                ),
            ]),
        })
    }
}
