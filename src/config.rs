use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

const DATABASE_URL: &str = "DATABASE_URL";

const BIND_ADDR: &str = "VIGIA_BIND_ADDR";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

const JOB_NAME: &str = "VIGIA_JOB_NAME";
const DEFAULT_JOB_NAME: &str = "monitor-servidores";

const EMAIL_API_URL: &str = "EMAIL_API_URL";
const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com";

const EMAIL_API_KEY: &str = "EMAIL_API_KEY";

const EMAIL_FROM: &str = "EMAIL_FROM";
const DEFAULT_EMAIL_FROM: &str = "Vigia Alertas <alertas@vigia.app>";

const HTTP_TIMEOUT_SECS: &str = "VIGIA_HTTP_TIMEOUT_SECS";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Transactional email provider settings.
///
/// The API key is optional on purpose: a missing key does not prevent the
/// hub from starting, it only turns every email attempt into a per-channel
/// failure that is reported back to the caller.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
}

/// Runtime configuration, assembled once from the environment and injected
/// into every component. Business logic never reads env vars directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Name used as `destinatario` on batch run audit records.
    pub job_name: String,
    pub email: EmailConfig,
    /// Timeout applied to every outbound HTTP call (providers, email,
    /// WhatsApp gateway).
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var(DATABASE_URL)
            .with_context(|| format!("{DATABASE_URL} must be set"))?;

        let bind_addr = env_or(BIND_ADDR, DEFAULT_BIND_ADDR)
            .parse()
            .with_context(|| format!("invalid {BIND_ADDR}"))?;

        let timeout_secs = std::env::var(HTTP_TIMEOUT_SECS)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Ok(Self {
            database_url,
            bind_addr,
            job_name: env_or(JOB_NAME, DEFAULT_JOB_NAME),
            email: EmailConfig {
                api_url: env_or(EMAIL_API_URL, DEFAULT_EMAIL_API_URL),
                api_key: std::env::var(EMAIL_API_KEY).ok(),
                from: env_or(EMAIL_FROM, DEFAULT_EMAIL_FROM),
            },
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Shared HTTP client for all outbound calls.
    ///
    /// Single-shot requests with a hard timeout; unresponsive upstreams can
    /// never stall a batch run indefinitely.
    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .expect("failed to build HTTP client")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
