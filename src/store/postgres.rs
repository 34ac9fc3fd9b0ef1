//! PostgreSQL data store implementation
//!
//! Production backend for the hosted multi-tenant database. Connection
//! pooling and schema migrations are handled by sqlx; every pipeline
//! write is an independent insert.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info, instrument};

use super::backend::{DataStore, HealthStatus};
use super::error::{StoreError, StoreResult};
use super::schema::{
    AlertRule, MessagingInstance, MetricReading, NotificationRecord, ProviderCredential, Server,
    UserProfile, SYSTEM_CHANNEL,
};

/// PostgreSQL-backed data store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and run pending migrations.
    #[instrument(skip_all)]
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        info!("connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations complete");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests running against a scratch
    /// database).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn active_servers(&self) -> StoreResult<Vec<Server>> {
        let servers = sqlx::query_as::<_, Server>(
            r#"
            SELECT id, user_id, name, address, provider, credential_id, status, created_at
            FROM servers
            WHERE status = 'active'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(servers)
    }

    async fn server(&self, id: i64) -> StoreResult<Option<Server>> {
        let server = sqlx::query_as::<_, Server>(
            r#"
            SELECT id, user_id, name, address, provider, credential_id, status, created_at
            FROM servers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(server)
    }

    async fn credential(&self, id: i64) -> StoreResult<Option<ProviderCredential>> {
        let credential = sqlx::query_as::<_, ProviderCredential>(
            r#"
            SELECT id, user_id, provider, token, label
            FROM provider_credentials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    #[instrument(skip(self, reading), fields(server_id = reading.server_id))]
    async fn insert_reading(&self, reading: MetricReading) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO metric_readings (
                server_id, cpu, memory, disk, network_in, network_out,
                uptime, real_data, collected_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(reading.server_id)
        .bind(reading.cpu)
        .bind(reading.memory)
        .bind(reading.disk)
        .bind(reading.network_in)
        .bind(reading.network_out)
        .bind(&reading.uptime)
        .bind(reading.real_data)
        .bind(reading.collected_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn active_rules_for_server(&self, server_id: i64) -> StoreResult<Vec<AlertRule>> {
        let rules = sqlx::query_as::<_, AlertRule>(
            r#"
            SELECT id, user_id, server_id, application_id, kind, threshold,
                   active, channels, instance_id, cooldown_minutes
            FROM alert_rules
            WHERE server_id = $1 AND active = TRUE
            ORDER BY id
            "#,
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    async fn alert_rule(&self, id: i64) -> StoreResult<Option<AlertRule>> {
        let rule = sqlx::query_as::<_, AlertRule>(
            r#"
            SELECT id, user_id, server_id, application_id, kind, threshold,
                   active, channels, instance_id, cooldown_minutes
            FROM alert_rules
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    #[instrument(skip(self, record), fields(channel = %record.channel))]
    async fn insert_notification(&self, record: NotificationRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_records (
                user_id, channel, destinatario, mensagem, status, alerta_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.channel)
        .bind(&record.destinatario)
        .bind(&record.mensagem)
        .bind(record.status.as_str())
        .bind(record.alerta_id)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn last_alert_notification(&self, rule_id: i64) -> StoreResult<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            r#"
            SELECT created_at
            FROM notification_records
            WHERE alerta_id = $1 AND channel = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(rule_id)
        .bind(SYSTEM_CHANNEL)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("created_at")))
    }

    async fn user_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, email, notification_email, whatsapp, email_template,
                   plan, is_admin, api_token
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn profile_by_token(&self, token: &str) -> StoreResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, email, notification_email, whatsapp, email_template,
                   plan, is_admin, api_token
            FROM user_profiles
            WHERE api_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn fallback_profile(&self) -> StoreResult<Option<UserProfile>> {
        // Admins first, then any profile at all.
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, email, notification_email, whatsapp, email_template,
                   plan, is_admin, api_token
            FROM user_profiles
            ORDER BY is_admin DESC, id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn connected_instance(&self, user_id: &str) -> StoreResult<Option<MessagingInstance>> {
        let instance = sqlx::query_as::<_, MessagingInstance>(
            r#"
            SELECT id, user_id, name, api_url, api_key, status, message_template
            FROM messaging_instances
            WHERE user_id = $1 AND status = 'connected'
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(instance)
    }

    async fn health_check(&self) -> StoreResult<HealthStatus> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM servers")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");

        Ok(HealthStatus {
            healthy: true,
            message: "PostgreSQL store operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "postgres".to_string()),
                ("servers".to_string(), count.to_string()),
            ]),
        })
    }
}
