//! Entity definitions shared by all store backends
//!
//! String-typed database columns are normalized to canonical enums at
//! ingestion (`#[sqlx(try_from = "String")]`), so the rest of the
//! pipeline never branches on raw string variants. The one deliberate
//! exception is [`AlertRule::kind`]: rules with an unknown metric kind
//! must be *skipped with a warning* during evaluation, not fail the
//! whole rule query, so the raw string survives until the evaluator
//! calls [`MetricKind::parse`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported cloud providers.
///
/// Each variant except `Other` has a read-only "list compute instances"
/// adapter in `crate::providers`. `Other` always degrades to synthetic
/// telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Hetzner,
    DigitalOcean,
    Vultr,
    Linode,
    Scaleway,
    Other,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Hetzner => "hetzner",
            Provider::DigitalOcean => "digitalocean",
            Provider::Vultr => "vultr",
            Provider::Linode => "linode",
            Provider::Scaleway => "scaleway",
            Provider::Other => "other",
        }
    }
}

impl TryFrom<String> for Provider {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "hetzner" => Ok(Provider::Hetzner),
            "digitalocean" | "digital_ocean" => Ok(Provider::DigitalOcean),
            "vultr" => Ok(Provider::Vultr),
            "linode" => Ok(Provider::Linode),
            "scaleway" => Ok(Provider::Scaleway),
            "other" => Ok(Provider::Other),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Server lifecycle status. Only `active` servers are swept by the
/// batch runner; servers are soft-disabled rather than deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Active,
    Inactive,
    Maintenance,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Active => "active",
            ServerStatus::Inactive => "inactive",
            ServerStatus::Maintenance => "maintenance",
        }
    }
}

impl TryFrom<String> for ServerStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(ServerStatus::Active),
            "inactive" => Ok(ServerStatus::Inactive),
            "maintenance" => Ok(ServerStatus::Maintenance),
            other => Err(format!("unknown server status: {other}")),
        }
    }
}

/// A registered server. Owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Server {
    pub id: i64,
    pub user_id: String,
    pub name: String,

    /// Public network address, used to match the server against the
    /// provider's instance list.
    pub address: String,

    #[sqlx(try_from = "String")]
    pub provider: Provider,

    /// Optional reference to a stored provider credential.
    pub credential_id: Option<i64>,

    #[sqlx(try_from = "String")]
    pub status: ServerStatus,

    pub created_at: DateTime<Utc>,
}

/// Opaque bearer token scoped to one provider, owned by one user.
/// Never exposed in full after creation except to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProviderCredential {
    pub id: i64,
    pub user_id: String,

    #[sqlx(try_from = "String")]
    pub provider: Provider,

    pub token: String,
    pub label: Option<String>,
}

/// One point-in-time resource snapshot for a server. Append-only; the
/// latest reading per server is the one consulted for alerting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReading {
    pub server_id: i64,

    /// CPU usage percentage (0-100)
    pub cpu: f64,

    /// Memory usage percentage (0-100)
    pub memory: f64,

    /// Disk usage percentage (0-100)
    pub disk: f64,

    /// Network traffic in bytes. Always synthesized - no provider API
    /// used here exposes real network counters.
    pub network_in: i64,
    pub network_out: i64,

    /// Formatted uptime, e.g. "3d 7h" or "5h 12m"
    pub uptime: String,

    /// Whether cpu/memory/disk were derived from a live provider
    /// instance (`true`) or fully synthesized (`false`).
    pub real_data: bool,

    pub collected_at: DateTime<Utc>,
}

/// Canonical metric kind for alert rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
}

impl MetricKind {
    /// Parse a rule kind, accepting both the short and the
    /// `_usage`-suffixed synonyms found in stored rules.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "cpu" | "cpu_usage" => Some(MetricKind::Cpu),
            "memory" | "memory_usage" | "ram" => Some(MetricKind::Memory),
            "disk" | "disk_usage" => Some(MetricKind::Disk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::Disk => "disk",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification channel requested by an alert rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Whatsapp,
}

impl Channel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "email" => Some(Channel::Email),
            "whatsapp" => Some(Channel::Whatsapp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Whatsapp => "whatsapp",
        }
    }
}

/// Default thresholds applied when a server is first configured.
pub const DEFAULT_CPU_THRESHOLD: f64 = 80.0;
pub const DEFAULT_MEMORY_THRESHOLD: f64 = 85.0;
pub const DEFAULT_DISK_THRESHOLD: f64 = 90.0;

/// A user-configured threshold rule, bound to a server or an
/// application (mutually exclusive).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlertRule {
    pub id: i64,
    pub user_id: String,
    pub server_id: Option<i64>,
    pub application_id: Option<i64>,

    /// Raw metric kind as stored. Normalized via [`MetricKind::parse`]
    /// at evaluation; unknown kinds are skipped there with a warning.
    pub kind: String,

    /// Threshold percentage. The rule fires when the live value is
    /// greater than *or equal to* this.
    pub threshold: f64,

    pub active: bool,

    /// Raw channel names. See [`AlertRule::channels`].
    pub channels: Vec<String>,

    /// Messaging instance bound for the WhatsApp channel.
    pub instance_id: Option<i64>,

    /// Re-notification window. Zero means the rule re-fires on every
    /// collection cycle while the threshold stays breached.
    pub cooldown_minutes: i32,
}

impl AlertRule {
    /// Requested channels, defaulting to email when none are set.
    /// Unknown channel names are ignored.
    pub fn requested_channels(&self) -> Vec<Channel> {
        let parsed: Vec<Channel> = self
            .channels
            .iter()
            .filter_map(|raw| Channel::parse(raw))
            .collect();

        if parsed.is_empty() {
            vec![Channel::Email]
        } else {
            parsed
        }
    }

    /// System default rules created the first time a server is
    /// configured: CPU 80%, memory 85%, disk 90%.
    pub fn defaults_for_server(user_id: &str, server_id: i64) -> Vec<AlertRule> {
        let defaults = [
            (MetricKind::Cpu, DEFAULT_CPU_THRESHOLD),
            (MetricKind::Memory, DEFAULT_MEMORY_THRESHOLD),
            (MetricKind::Disk, DEFAULT_DISK_THRESHOLD),
        ];

        defaults
            .into_iter()
            .map(|(kind, threshold)| AlertRule {
                id: 0,
                user_id: user_id.to_string(),
                server_id: Some(server_id),
                application_id: None,
                kind: kind.as_str().to_string(),
                threshold,
                active: true,
                channels: vec![Channel::Email.as_str().to_string()],
                instance_id: None,
                cooldown_minutes: 0,
            })
            .collect()
    }
}

/// Outcome status recorded on every notification attempt and batch run.
/// The wire values are kept verbatim: the user-facing history reads
/// this column directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "enviado")]
    Enviado,
    #[serde(rename = "erro_envio")]
    ErroEnvio,
    #[serde(rename = "erro_critico")]
    ErroCritico,
    #[serde(rename = "sucesso")]
    Sucesso,
    #[serde(rename = "parcial_sucesso")]
    ParcialSucesso,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Enviado => "enviado",
            DeliveryStatus::ErroEnvio => "erro_envio",
            DeliveryStatus::ErroCritico => "erro_critico",
            DeliveryStatus::Sucesso => "sucesso",
            DeliveryStatus::ParcialSucesso => "parcial_sucesso",
        }
    }
}

impl TryFrom<String> for DeliveryStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "enviado" => Ok(DeliveryStatus::Enviado),
            "erro_envio" => Ok(DeliveryStatus::ErroEnvio),
            "erro_critico" => Ok(DeliveryStatus::ErroCritico),
            "sucesso" => Ok(DeliveryStatus::Sucesso),
            "parcial_sucesso" => Ok(DeliveryStatus::ParcialSucesso),
            other => Err(format!("unknown delivery status: {other}")),
        }
    }
}

/// Channel tag for system-generated audit entries (batch summaries,
/// per-rule dispatch logs), distinct from user-facing channel entries.
pub const SYSTEM_CHANNEL: &str = "sistema";

/// Append-only audit entry: one row per attempted delivery or per
/// system/batch event. Doubles as application log and user-facing
/// notification history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub user_id: Option<String>,

    /// "email", "whatsapp" or [`SYSTEM_CHANNEL`]
    pub channel: String,

    pub destinatario: String,
    pub mensagem: String,
    pub status: DeliveryStatus,

    /// Alert rule this entry belongs to, when applicable.
    pub alerta_id: Option<i64>,

    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn system(destinatario: &str, mensagem: String, status: DeliveryStatus) -> Self {
        Self {
            user_id: None,
            channel: SYSTEM_CHANNEL.to_string(),
            destinatario: destinatario.to_string(),
            mensagem,
            status,
            alerta_id: None,
            created_at: Utc::now(),
        }
    }
}

/// A provisioned WhatsApp gateway session.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessagingInstance {
    pub id: i64,
    pub user_id: String,
    pub name: String,

    /// Base URL of the self-hosted gateway serving this instance.
    pub api_url: String,
    pub api_key: String,

    /// Gateway connection status; only "connected" instances are usable.
    pub status: String,

    /// Custom message template with `{{placeholder}}` variables.
    pub message_template: Option<String>,
}

impl MessagingInstance {
    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }
}

/// User identity and contact preferences.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: String,

    /// Authentication email.
    pub email: String,

    /// Distinct notification address; falls back to `email` when unset.
    pub notification_email: Option<String>,

    /// WhatsApp number, free-form (digits are extracted before sending).
    pub whatsapp: Option<String>,

    /// Custom alert email template (HTML with `{{placeholder}}` vars).
    pub email_template: Option<String>,

    pub plan: String,
    pub is_admin: bool,

    /// API token used to resolve test-mode dispatch requests.
    pub api_token: Option<String>,
}

impl UserProfile {
    /// Address alerts are delivered to.
    pub fn alert_email(&self) -> &str {
        self.notification_email.as_deref().unwrap_or(&self.email)
    }
}
