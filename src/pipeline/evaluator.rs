//! Threshold evaluation for freshly collected readings.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};

use crate::collector::ResourceSnapshot;
use crate::notify::{AlertDispatcher, DispatchRequest};
use crate::store::schema::{
    AlertRule, DeliveryStatus, MetricKind, NotificationRecord, Server, SYSTEM_CHANNEL,
};
use crate::store::DataStore;

/// Result of evaluating one server's rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvaluationOutcome {
    /// Rules whose threshold was breached and that were dispatched.
    pub fired: usize,

    /// Set when the rule query itself failed. Individual dispatch
    /// failures do not set this.
    pub lookup_failed: bool,
}

pub struct AlertEvaluator {
    store: Arc<dyn DataStore>,
    dispatcher: Arc<AlertDispatcher>,
}

impl AlertEvaluator {
    pub fn new(store: Arc<dyn DataStore>, dispatcher: Arc<AlertDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Evaluate every active rule of `server` against `snapshot`. A
    /// rule fires iff its metric value is greater than or equal to the
    /// threshold. Each fired rule is dispatched synchronously and gets
    /// one system-channel audit record, success or not.
    #[instrument(skip_all, fields(server = %server.name))]
    pub async fn evaluate(&self, server: &Server, snapshot: &ResourceSnapshot) -> EvaluationOutcome {
        let rules = match self.store.active_rules_for_server(server.id).await {
            Ok(rules) => rules,
            Err(e) => {
                warn!("alert rule lookup failed: {e}");
                return EvaluationOutcome {
                    fired: 0,
                    lookup_failed: true,
                };
            }
        };

        let mut fired = 0;
        for rule in rules {
            let Some(kind) = MetricKind::parse(&rule.kind) else {
                warn!(rule_id = rule.id, kind = %rule.kind, "skipping rule with unknown metric kind");
                continue;
            };

            let value = match kind {
                MetricKind::Cpu => snapshot.cpu,
                MetricKind::Memory => snapshot.memory,
                MetricKind::Disk => snapshot.disk,
            };

            if value < rule.threshold {
                continue;
            }

            if self.in_cooldown(&rule).await {
                debug!(rule_id = rule.id, "threshold breached but rule is in cooldown");
                continue;
            }

            info!(
                rule_id = rule.id,
                kind = %rule.kind,
                value,
                threshold = rule.threshold,
                "alert threshold breached"
            );

            let request = DispatchRequest::Alert {
                alerta_id: rule.id,
                tipo_alerta: rule.kind.clone(),
                valor_atual: value,
                limite: rule.threshold,
            };

            let (status, detail) = match self.dispatcher.dispatch(request).await {
                Ok(outcome) if outcome.success => (DeliveryStatus::Sucesso, None),
                Ok(outcome) => {
                    let detail = outcome
                        .email
                        .error
                        .or(outcome.whatsapp.error)
                        .unwrap_or_else(|| "nenhum canal entregou".to_string());
                    (DeliveryStatus::ErroEnvio, Some(detail))
                }
                Err(e) => {
                    warn!(rule_id = rule.id, "alert dispatch failed: {e}");
                    (DeliveryStatus::ErroEnvio, Some(e.to_string()))
                }
            };

            let mensagem = match &detail {
                Some(detail) => format!(
                    "alerta {} ({}) em {}: {:.1}% >= {:.1}% - falha no envio: {}",
                    rule.id, rule.kind, server.name, value, rule.threshold, detail
                ),
                None => format!(
                    "alerta {} ({}) em {}: {:.1}% >= {:.1}% - notificação enviada",
                    rule.id, rule.kind, server.name, value, rule.threshold
                ),
            };

            let record = NotificationRecord {
                user_id: Some(rule.user_id.clone()),
                channel: SYSTEM_CHANNEL.to_string(),
                destinatario: server.name.clone(),
                mensagem,
                status,
                alerta_id: Some(rule.id),
                created_at: Utc::now(),
            };
            if let Err(e) = self.store.insert_notification(record).await {
                warn!(rule_id = rule.id, "failed to record evaluation outcome: {e}");
            }

            fired += 1;
        }

        EvaluationOutcome {
            fired,
            lookup_failed: false,
        }
    }

    /// A rule with a positive cooldown window is muted while the last
    /// system record for it is younger than the window. A failed
    /// lookup lets the rule fire rather than silently muting it.
    async fn in_cooldown(&self, rule: &AlertRule) -> bool {
        if rule.cooldown_minutes <= 0 {
            return false;
        }

        match self.store.last_alert_notification(rule.id).await {
            Ok(Some(last)) => Utc::now() - last < Duration::minutes(rule.cooldown_minutes as i64),
            Ok(None) => false,
            Err(e) => {
                warn!(rule_id = rule.id, "cooldown lookup failed, firing anyway: {e}");
                false
            }
        }
    }
}
