//! Helper functions for integration tests

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use vigia::api::{spawn_api_server, ApiConfig, ApiState};
use vigia::collector::MetricsCollector;
use vigia::config::EmailConfig;
use vigia::notify::senders::{EmailSender, WhatsAppSender};
use vigia::notify::AlertDispatcher;
use vigia::pipeline::{AlertEvaluator, BatchRunner, ServerProcessor};
use vigia::store::memory::MemoryStore;
use vigia::store::schema::{AlertRule, Provider, Server, ServerStatus, UserProfile};
use vigia::store::DataStore;

pub const JOB_NAME: &str = "monitor-servidores";

pub fn test_server(id: i64) -> Server {
    Server {
        id,
        user_id: "user-1".to_string(),
        name: format!("srv-{id}"),
        address: format!("10.0.0.{id}"),
        provider: Provider::Other,
        credential_id: None,
        status: ServerStatus::Active,
        created_at: Utc::now(),
    }
}

pub fn test_profile() -> UserProfile {
    UserProfile {
        id: "user-1".to_string(),
        email: "auth@example.com".to_string(),
        notification_email: Some("alerts@example.com".to_string()),
        whatsapp: None,
        email_template: None,
        plan: "pro".to_string(),
        is_admin: false,
        api_token: Some("tok-1".to_string()),
    }
}

pub fn test_rule(id: i64, server_id: i64, kind: &str, threshold: f64, channels: &[&str]) -> AlertRule {
    AlertRule {
        id,
        user_id: "user-1".to_string(),
        server_id: Some(server_id),
        application_id: None,
        kind: kind.to_string(),
        threshold,
        active: true,
        channels: channels.iter().map(|c| c.to_string()).collect(),
        instance_id: None,
        cooldown_minutes: 0,
    }
}

pub fn email_config(base: &str, key: Option<&str>) -> EmailConfig {
    EmailConfig {
        api_url: base.to_string(),
        api_key: key.map(String::from),
        from: "Vigia Alertas <alertas@vigia.app>".to_string(),
    }
}

pub fn build_dispatcher(store: Arc<MemoryStore>, email: EmailConfig) -> Arc<AlertDispatcher> {
    let client = reqwest::Client::new();
    let store: Arc<dyn DataStore> = store;
    Arc::new(AlertDispatcher::new(
        store.clone(),
        EmailSender::new(client.clone(), email, store.clone()),
        WhatsAppSender::new(client, store),
    ))
}

pub fn build_runner(store: Arc<MemoryStore>, dispatcher: Arc<AlertDispatcher>) -> Arc<BatchRunner> {
    let client = reqwest::Client::new();
    let store: Arc<dyn DataStore> = store;
    let processor = ServerProcessor::new(
        store.clone(),
        MetricsCollector::new(client),
        AlertEvaluator::new(store.clone(), dispatcher),
    );
    Arc::new(BatchRunner::new(store, processor, JOB_NAME.to_string()))
}

/// Spin up the full stack against an in-memory store and return the
/// API's local address.
pub async fn spawn_test_api(store: Arc<MemoryStore>, email: EmailConfig) -> SocketAddr {
    let dispatcher = build_dispatcher(store.clone(), email);
    let runner = build_runner(store.clone(), dispatcher.clone());
    let state = ApiState::new(store, runner, dispatcher);

    spawn_api_server(
        ApiConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
        },
        state,
    )
    .await
    .expect("api server should bind")
}
