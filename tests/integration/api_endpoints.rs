//! HTTP surface behavior.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};
use vigia::store::memory::MemoryStore;
use vigia::store::schema::DeliveryStatus;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers;

#[tokio::test]
async fn test_health_endpoint() {
    let store = Arc::new(MemoryStore::new());
    let addr = helpers::spawn_test_api(
        store,
        helpers::email_config("http://unused.invalid", None),
    )
    .await;

    let response = reqwest::get(format!("http://{addr}/api/v1/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["status"], json!("ok"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_monitor_job_trigger_reports_summary() {
    let store = Arc::new(MemoryStore::new());
    for id in 1..=2 {
        store.add_server(helpers::test_server(id)).await;
    }

    let addr = helpers::spawn_test_api(
        store.clone(),
        helpers::email_config("http://unused.invalid", None),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/jobs/monitor"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["processed"], json!(2));
    assert_eq!(body["status"], json!("sucesso"));
    assert_eq!(store.readings_for(1).await.len(), 1);
}

// Per-server failures still answer 200 with a parcial_sucesso summary.
#[tokio::test]
async fn test_monitor_job_partial_failure_still_answers_200() {
    let store = Arc::new(MemoryStore::new());
    for id in 1..=3 {
        store.add_server(helpers::test_server(id)).await;
    }
    store.fail_readings_for(2).await;

    let addr = helpers::spawn_test_api(
        store,
        helpers::email_config("http://unused.invalid", None),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/jobs/monitor"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["processed"], json!(3));
    assert_eq!(body["errors"], json!(1));
    assert_eq!(body["status"], json!("parcial_sucesso"));
}

#[tokio::test]
async fn test_send_alert_success() {
    let email_mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&email_mock)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;
    store
        .add_rule(helpers::test_rule(42, 1, "cpu", 80.0, &["email"]))
        .await;
    store.add_profile(helpers::test_profile()).await;

    let addr = helpers::spawn_test_api(
        store,
        helpers::email_config(&email_mock.uri(), Some("re_test")),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/alerts/send"))
        .json(&json!({
            "alerta_id": 42,
            "servidor_id": 1,
            "tipo_alerta": "cpu_usage",
            "valor_atual": 92.5,
            "limite": 80.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["email_destino"], json!("alerts@example.com"));
    assert_eq!(body["canais"]["email"]["sent"], json!(true));
    assert_eq!(body["alerta"]["servidor_nome"], json!("srv-1"));
}

#[tokio::test]
async fn test_send_alert_missing_body_is_400() {
    let store = Arc::new(MemoryStore::new());
    let addr = helpers::spawn_test_api(
        store,
        helpers::email_config("http://unused.invalid", None),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/alerts/send"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_send_alert_missing_fields_is_400() {
    let store = Arc::new(MemoryStore::new());
    let addr = helpers::spawn_test_api(
        store,
        helpers::email_config("http://unused.invalid", None),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/alerts/send"))
        .json(&json!({ "tipo_alerta": "cpu_usage" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// Missing alert record: hard failure, erro_critico audit entry, 500.
#[tokio::test]
async fn test_send_alert_unknown_rule_is_500_with_audit() {
    let store = Arc::new(MemoryStore::new());
    let addr = helpers::spawn_test_api(
        store.clone(),
        helpers::email_config("http://unused.invalid", None),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/alerts/send"))
        .json(&json!({
            "alerta_id": 999,
            "tipo_alerta": "cpu_usage",
            "valor_atual": 92.5,
            "limite": 80.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let records = store.notifications().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DeliveryStatus::ErroCritico);
}

#[tokio::test]
async fn test_send_test_alert_with_bearer_token() {
    let email_mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&email_mock)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_profile(helpers::test_profile()).await;

    let addr = helpers::spawn_test_api(
        store.clone(),
        helpers::email_config(&email_mock.uri(), Some("re_test")),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/alerts/send"))
        .bearer_auth("tok-1")
        .json(&json!({
            "test_mode": true,
            "tipo_alerta": "cpu_usage",
            "valor_atual": 95.0,
            "limite": 80.0,
            "test_data": { "servidor_nome": "teste", "ip_servidor": "127.0.0.1" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // test mode writes no records
    assert!(store.notifications().await.is_empty());
}

// Unauthenticated test dispatch against an empty store: the dispatcher
// has nobody to send to and the request fails.
#[tokio::test]
async fn test_send_test_alert_without_any_profile_is_500() {
    let store = Arc::new(MemoryStore::new());
    let addr = helpers::spawn_test_api(
        store,
        helpers::email_config("http://unused.invalid", None),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/alerts/send"))
        .json(&json!({
            "test_mode": true,
            "tipo_alerta": "cpu_usage",
            "valor_atual": 95.0,
            "limite": 80.0,
            "test_data": { "servidor_nome": "teste", "ip_servidor": "127.0.0.1" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["error"],
        json!("Nenhum usuário encontrado para teste")
    );
}

#[tokio::test]
async fn test_cors_preflight_is_permissive() {
    let store = Arc::new(MemoryStore::new());
    let addr = helpers::spawn_test_api(
        store,
        helpers::email_config("http://unused.invalid", None),
    )
    .await;

    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{addr}/api/v1/jobs/monitor"),
        )
        .header("Origin", "https://painel.example.com")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
