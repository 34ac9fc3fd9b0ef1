//! End-to-end pipeline behavior against the in-memory store.

use std::sync::Arc;

use vigia::collector::{MetricsCollector, ResourceSnapshot};
use vigia::pipeline::{AlertEvaluator, ServerProcessor};
use vigia::store::memory::MemoryStore;
use vigia::store::schema::{DeliveryStatus, SYSTEM_CHANNEL};
use vigia::store::DataStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers;

fn snapshot(cpu: f64, memory: f64, disk: f64) -> ResourceSnapshot {
    ResourceSnapshot {
        cpu,
        memory,
        disk,
        uptime: "1h 0m".to_string(),
        real: false,
    }
}

// Unsupported provider with no credential: a synthetic reading is
// persisted and nothing crashes.
#[tokio::test]
async fn test_unsupported_provider_persists_synthetic_reading() {
    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config("http://unused.invalid", None),
    );
    let client = reqwest::Client::new();
    let store_dyn: Arc<dyn DataStore> = store.clone();
    let processor = ServerProcessor::new(
        store_dyn.clone(),
        MetricsCollector::new(client),
        AlertEvaluator::new(store_dyn, dispatcher),
    );

    let outcome = processor.process(&helpers::test_server(1)).await.unwrap();
    assert!(outcome.success);

    let readings = store.readings_for(1).await;
    assert_eq!(readings.len(), 1);
    assert!(!readings[0].real_data);
    assert!((0.0..=100.0).contains(&readings[0].cpu));
    assert!((0.0..=100.0).contains(&readings[0].memory));
    assert!((0.0..=100.0).contains(&readings[0].disk));
}

// Value exactly equal to the threshold must fire.
#[tokio::test]
async fn test_threshold_boundary_fires() {
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

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config(&email_mock.uri(), Some("re_test")),
    );
    let store_dyn: Arc<dyn DataStore> = store.clone();
    let evaluator = AlertEvaluator::new(store_dyn, dispatcher);

    let outcome = evaluator
        .evaluate(&helpers::test_server(1), &snapshot(80.0, 10.0, 10.0))
        .await;

    assert_eq!(outcome.fired, 1);
    assert!(!outcome.lookup_failed);

    let system: Vec<_> = store
        .notifications()
        .await
        .into_iter()
        .filter(|r| r.channel == SYSTEM_CHANNEL)
        .collect();
    assert_eq!(system.len(), 1);
    assert_eq!(system[0].status, DeliveryStatus::Sucesso);
}

#[tokio::test]
async fn test_just_below_threshold_does_not_fire() {
    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;
    store
        .add_rule(helpers::test_rule(42, 1, "cpu", 80.0, &["email"]))
        .await;
    store.add_profile(helpers::test_profile()).await;

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config("http://unused.invalid", None),
    );
    let store_dyn: Arc<dyn DataStore> = store.clone();
    let evaluator = AlertEvaluator::new(store_dyn, dispatcher);

    let outcome = evaluator
        .evaluate(&helpers::test_server(1), &snapshot(79.9, 10.0, 10.0))
        .await;

    assert_eq!(outcome.fired, 0);
    assert!(store.notifications().await.is_empty());
}

// Multiple rules on different metrics evaluate independently.
#[tokio::test]
async fn test_multiple_rules_fire_independently() {
    let email_mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&email_mock)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;
    store
        .add_rule(helpers::test_rule(1, 1, "cpu", 80.0, &["email"]))
        .await;
    store
        .add_rule(helpers::test_rule(2, 1, "memory", 85.0, &["email"]))
        .await;
    store
        .add_rule(helpers::test_rule(3, 1, "disk", 90.0, &["email"]))
        .await;
    store.add_profile(helpers::test_profile()).await;

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config(&email_mock.uri(), Some("re_test")),
    );
    let store_dyn: Arc<dyn DataStore> = store.clone();
    let evaluator = AlertEvaluator::new(store_dyn, dispatcher);

    // cpu and disk breach, memory does not
    let outcome = evaluator
        .evaluate(&helpers::test_server(1), &snapshot(95.0, 50.0, 91.0))
        .await;

    assert_eq!(outcome.fired, 2);
}
