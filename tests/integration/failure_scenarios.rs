//! Failure isolation across the batch and the store.

use std::sync::Arc;

use vigia::store::memory::MemoryStore;
use vigia::store::schema::{DeliveryStatus, SYSTEM_CHANNEL};

use crate::helpers;

// Batch of three where the middle server's persistence fails: the run
// completes, counts exactly one error and the summary reads
// parcial_sucesso.
#[tokio::test]
async fn test_one_failing_server_yields_parcial_sucesso() {
    let store = Arc::new(MemoryStore::new());
    for id in 1..=3 {
        store.add_server(helpers::test_server(id)).await;
    }
    store.fail_readings_for(2).await;

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config("http://unused.invalid", None),
    );
    let runner = helpers::build_runner(store.clone(), dispatcher);

    let summary = runner.run().await.unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.errors, 1);
    assert!(summary.succeeded + summary.errors <= 3);
    assert_eq!(summary.status(), DeliveryStatus::ParcialSucesso);

    // the other two servers were still processed
    assert_eq!(store.readings_for(1).await.len(), 1);
    assert!(store.readings_for(2).await.is_empty());
    assert_eq!(store.readings_for(3).await.len(), 1);

    let records = store.notifications().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].channel, SYSTEM_CHANNEL);
    assert_eq!(records[0].destinatario, helpers::JOB_NAME);
    assert_eq!(records[0].status, DeliveryStatus::ParcialSucesso);
}

#[tokio::test]
async fn test_clean_batch_yields_sucesso() {
    let store = Arc::new(MemoryStore::new());
    for id in 1..=3 {
        store.add_server(helpers::test_server(id)).await;
    }

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config("http://unused.invalid", None),
    );
    let runner = helpers::build_runner(store.clone(), dispatcher);

    let summary = runner.run().await.unwrap();

    assert_eq!(summary.errors, 0);
    assert_eq!(summary.status(), DeliveryStatus::Sucesso);
}

// A failing rule lookup flags the evaluation but does not fail the
// batch: the readings still land and the run still summarizes.
#[tokio::test]
async fn test_rule_lookup_failure_does_not_abort_batch() {
    let store = Arc::new(MemoryStore::new());
    store.add_server(helpers::test_server(1)).await;
    store.fail_rule_lookups(true);

    let dispatcher = helpers::build_dispatcher(
        store.clone(),
        helpers::email_config("http://unused.invalid", None),
    );
    let runner = helpers::build_runner(store.clone(), dispatcher);

    let summary = runner.run().await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.alerts_fired, 0);
    assert_eq!(store.readings_for(1).await.len(), 1);
}
