//! Dispatcher behavior across channels and test mode.

use std::sync::Arc;

use vigia::notify::DispatchRequest;
use vigia::store::memory::MemoryStore;
use vigia::store::schema::MessagingInstance;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers;

fn alert_request(alerta_id: i64) -> DispatchRequest {
    DispatchRequest::Alert {
        alerta_id,
        tipo_alerta: "cpu_usage".to_string(),
        valor_atual: 92.5,
        limite: 80.0,
    }
}

// WhatsApp listed on the rule but not configured on the profile: the
// channel counts as attempted and failed with an explanatory error,
// email is not attempted since it was not listed, and the dispatch as
// a whole fails.
#[tokio::test]
async fn test_whatsapp_only_rule_with_unconfigured_profile() {
    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;
    store
        .add_rule(helpers::test_rule(42, 1, "cpu", 80.0, &["whatsapp"]))
        .await;
    store.add_profile(helpers::test_profile()).await;

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config("http://unused.invalid", None),
    );

    let outcome = dispatcher.dispatch(alert_request(42)).await.unwrap();

    assert!(!outcome.success);
    assert!(outcome.whatsapp.attempted);
    assert!(!outcome.whatsapp.sent);
    assert_eq!(
        outcome.whatsapp.error.as_deref(),
        Some("WhatsApp não configurado para este usuário")
    );
    assert!(!outcome.email.attempted);
    assert!(!outcome.email.sent);
}

// overall success is the OR of the per-channel results
#[tokio::test]
async fn test_overall_success_is_or_of_channels() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/vigia-user-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;
    store
        .add_rule(helpers::test_rule(42, 1, "cpu", 80.0, &["email", "whatsapp"]))
        .await;
    let mut profile = helpers::test_profile();
    profile.whatsapp = Some("+55 11 99888-7766".to_string());
    store.add_profile(profile).await;
    store
        .add_instance(MessagingInstance {
            id: 1,
            user_id: "user-1".to_string(),
            name: "vigia-user-1".to_string(),
            api_url: mock.uri(),
            api_key: "k".to_string(),
            status: "connected".to_string(),
            message_template: None,
        })
        .await;

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config(&mock.uri(), Some("re_test")),
    );

    let outcome = dispatcher.dispatch(alert_request(42)).await.unwrap();

    assert!(outcome.email.sent);
    assert!(!outcome.whatsapp.sent);
    assert_eq!(outcome.success, outcome.email.sent || outcome.whatsapp.sent);
}

#[tokio::test]
async fn test_notification_email_falls_back_to_auth_email() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;
    store
        .add_rule(helpers::test_rule(42, 1, "cpu", 80.0, &["email"]))
        .await;
    let mut profile = helpers::test_profile();
    profile.notification_email = None;
    store.add_profile(profile).await;

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config(&mock.uri(), Some("re_test")),
    );

    let outcome = dispatcher.dispatch(alert_request(42)).await.unwrap();
    assert_eq!(outcome.email_destino, "auth@example.com");
}

// Rules with no channel list fall back to email only.
#[tokio::test]
async fn test_empty_channel_list_defaults_to_email() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;
    store.add_rule(helpers::test_rule(42, 1, "cpu", 80.0, &[])).await;
    store.add_profile(helpers::test_profile()).await;

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config(&mock.uri(), Some("re_test")),
    );

    let outcome = dispatcher.dispatch(alert_request(42)).await.unwrap();

    assert!(outcome.email.attempted);
    assert!(!outcome.whatsapp.attempted);
    assert!(outcome.whatsapp.error.is_none());
}
