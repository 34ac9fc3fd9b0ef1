//! Single-server processing step: collect, persist, evaluate.

use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};

use crate::collector::{synthetic_network_bytes, MetricsCollector};
use crate::pipeline::evaluator::AlertEvaluator;
use crate::store::schema::{MetricReading, Server};
use crate::store::DataStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// False when the reading failed to persist. The alerts may still
    /// have been evaluated against the in-memory values.
    pub success: bool,

    pub alerts_fired: usize,
}

pub struct ServerProcessor {
    store: Arc<dyn DataStore>,
    collector: MetricsCollector,
    evaluator: AlertEvaluator,
}

impl ServerProcessor {
    pub fn new(
        store: Arc<dyn DataStore>,
        collector: MetricsCollector,
        evaluator: AlertEvaluator,
    ) -> Self {
        Self {
            store,
            collector,
            evaluator,
        }
    }

    /// Produce one reading for `server` and evaluate its alert rules.
    /// A persistence failure flips `success` to false and is logged;
    /// it never aborts the batch this call belongs to.
    #[instrument(skip_all, fields(server = %server.name))]
    pub async fn process(&self, server: &Server) -> anyhow::Result<ProcessOutcome> {
        let credential = match server.credential_id {
            Some(id) => match self.store.credential(id).await {
                Ok(credential) => credential,
                Err(e) => {
                    warn!(credential_id = id, "credential lookup failed, collecting without it: {e}");
                    None
                }
            },
            None => None,
        };

        let snapshot = self.collector.collect(server, credential.as_ref()).await;

        let (network_in, network_out) = synthetic_network_bytes();
        let reading = MetricReading {
            server_id: server.id,
            cpu: snapshot.cpu,
            memory: snapshot.memory,
            disk: snapshot.disk,
            network_in,
            network_out,
            uptime: snapshot.uptime.clone(),
            real_data: snapshot.real,
            collected_at: Utc::now(),
        };

        let mut success = true;
        if let Err(e) = self.store.insert_reading(reading).await {
            warn!("failed to persist reading: {e}");
            success = false;
        }

        let evaluation = self.evaluator.evaluate(server, &snapshot).await;

        Ok(ProcessOutcome {
            success,
            alerts_fired: evaluation.fired,
        })
    }
}
