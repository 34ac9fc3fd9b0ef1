//! Data store trait definition
//!
//! This module defines the [`DataStore`] trait that all store
//! implementations must implement. Every write in the pipeline is an
//! independent insert, so no locking discipline is required of
//! implementations beyond ordinary connection safety.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StoreResult;
use super::schema::{
    AlertRule, MessagingInstance, MetricReading, NotificationRecord, ProviderCredential, Server,
    UserProfile,
};

/// Health status of the data store
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// CRUD surface the monitoring pipeline needs from the relational
/// store. Implementations must be `Send + Sync` - the same store is
/// shared across the batch runner and the dispatch endpoint.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// All servers with `status = 'active'`, the batch runner's work list.
    async fn active_servers(&self) -> StoreResult<Vec<Server>>;

    /// Look up a single server.
    async fn server(&self, id: i64) -> StoreResult<Option<Server>>;

    /// Look up a stored provider credential.
    async fn credential(&self, id: i64) -> StoreResult<Option<ProviderCredential>>;

    /// Append one metric reading. Readings are never updated or deleted
    /// by the pipeline.
    async fn insert_reading(&self, reading: MetricReading) -> StoreResult<()>;

    /// All `active = true` alert rules bound to the given server.
    async fn active_rules_for_server(&self, server_id: i64) -> StoreResult<Vec<AlertRule>>;

    /// Look up a single alert rule.
    async fn alert_rule(&self, id: i64) -> StoreResult<Option<AlertRule>>;

    /// Append one notification/audit record.
    async fn insert_notification(&self, record: NotificationRecord) -> StoreResult<()>;

    /// Timestamp of the most recent *system-channel* record for a rule.
    /// Used by the evaluator's cooldown window.
    async fn last_alert_notification(&self, rule_id: i64) -> StoreResult<Option<DateTime<Utc>>>;

    /// Look up a user profile by id.
    async fn user_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    /// Resolve a bearer API token to its profile (test-mode dispatch).
    async fn profile_by_token(&self, token: &str) -> StoreResult<Option<UserProfile>>;

    /// Arbitrary profile used as last resort for unauthenticated
    /// test-mode dispatch; admins are preferred.
    async fn fallback_profile(&self) -> StoreResult<Option<UserProfile>>;

    /// The user's `connected` messaging instance, if any.
    async fn connected_instance(&self, user_id: &str) -> StoreResult<Option<MessagingInstance>>;

    /// Lightweight probe verifying the store is operational.
    async fn health_check(&self) -> StoreResult<HealthStatus>;
}
