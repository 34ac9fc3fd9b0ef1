//! Sequential batch runner over the active server fleet.
//!
//! Servers are processed one at a time with full isolation: a failure
//! on server N is counted and the run moves on to server N+1. One
//! summary record is written per run; a failure of the run itself
//! (e.g. the server list query) is recorded as `erro_critico` and
//! surfaced to the caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::pipeline::processor::ServerProcessor;
use crate::store::schema::{DeliveryStatus, NotificationRecord};
use crate::store::DataStore;

/// Totals for one batch run, echoed in the trigger response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub alerts_fired: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn status(&self) -> DeliveryStatus {
        if self.errors > 0 {
            DeliveryStatus::ParcialSucesso
        } else {
            DeliveryStatus::Sucesso
        }
    }
}

pub struct BatchRunner {
    store: Arc<dyn DataStore>,
    processor: ServerProcessor,

    /// Name recorded as the summary's recipient.
    job_name: String,
}

impl BatchRunner {
    pub fn new(store: Arc<dyn DataStore>, processor: ServerProcessor, job_name: String) -> Self {
        Self {
            store,
            processor,
            job_name,
        }
    }

    /// Run one full monitoring pass. Returns the summary, or an error
    /// when the run itself could not proceed (after recording an
    /// `erro_critico` entry).
    #[instrument(skip_all, fields(job = %self.job_name))]
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        match self.run_inner().await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("batch run failed: {e:#}");
                let record = NotificationRecord::system(
                    &self.job_name,
                    format!("falha crítica na execução do job: {e:#}"),
                    DeliveryStatus::ErroCritico,
                );
                if let Err(audit) = self.store.insert_notification(record).await {
                    error!("failed to record critical batch failure: {audit}");
                }
                Err(e)
            }
        }
    }

    async fn run_inner(&self) -> anyhow::Result<RunSummary> {
        let servers = self.store.active_servers().await?;
        info!(count = servers.len(), "starting monitoring pass");

        let mut summary = RunSummary {
            processed: 0,
            succeeded: 0,
            alerts_fired: 0,
            errors: 0,
        };

        for server in &servers {
            summary.processed += 1;
            match self.processor.process(server).await {
                Ok(outcome) => {
                    if outcome.success {
                        summary.succeeded += 1;
                    } else {
                        summary.errors += 1;
                    }
                    summary.alerts_fired += outcome.alerts_fired;
                }
                Err(e) => {
                    warn!(server = %server.name, "processing failed, continuing: {e:#}");
                    summary.errors += 1;
                }
            }
        }

        let record = NotificationRecord::system(
            &self.job_name,
            format!(
                "monitoramento concluído: {} processados, {} ok, {} alertas, {} erros",
                summary.processed, summary.succeeded, summary.alerts_fired, summary.errors
            ),
            summary.status(),
        );
        if let Err(e) = self.store.insert_notification(record).await {
            warn!("failed to record run summary: {e}");
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            alerts_fired = summary.alerts_fired,
            errors = summary.errors,
            "monitoring pass finished"
        );

        Ok(summary)
    }
}
