//! Alert dispatch orchestration.
//!
//! Resolves the target profile, fans out to the requested channels and
//! aggregates the per-channel results. Channel failures are isolated:
//! an email failure never prevents the WhatsApp attempt and vice versa.
//! The only hard failures are a missing alert record and an
//! unresolvable profile.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::notify::senders::{ChannelOutcome, EmailSender, WhatsAppSender};
use crate::notify::template::TemplateContext;
use crate::store::schema::{Channel, DeliveryStatus, NotificationRecord, UserProfile};
use crate::store::{DataStore, StoreError};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Alerta {0} não encontrado")]
    AlertNotFound(i64),

    #[error("Usuário {0} não encontrado")]
    ProfileNotFound(String),

    #[error("Nenhum usuário encontrado para teste")]
    NoTestProfile,

    #[error("falha de armazenamento: {0}")]
    Store(#[from] StoreError),
}

/// One dispatch, either for a stored alert rule or a synthetic
/// test-mode alert.
#[derive(Debug, Clone)]
pub enum DispatchRequest {
    Alert {
        alerta_id: i64,
        tipo_alerta: String,
        valor_atual: f64,
        limite: f64,
    },
    Test {
        /// Bearer token identifying the acting user, when present.
        token: Option<String>,
        tipo_alerta: String,
        valor_atual: f64,
        limite: f64,
        servidor_nome: String,
        ip_servidor: String,
    },
}

/// Structured dispatch result, echoed in the HTTP response.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    /// OR of the per-channel results.
    pub success: bool,

    /// Resolved notification address.
    pub email_destino: String,

    pub email: ChannelOutcome,
    pub whatsapp: ChannelOutcome,

    pub tipo_alerta: String,
    pub servidor_nome: String,
    pub valor_atual: f64,
    pub limite: f64,
}

pub struct AlertDispatcher {
    store: Arc<dyn DataStore>,
    email: EmailSender,
    whatsapp: WhatsAppSender,
}

impl AlertDispatcher {
    pub fn new(store: Arc<dyn DataStore>, email: EmailSender, whatsapp: WhatsAppSender) -> Self {
        Self {
            store,
            email,
            whatsapp,
        }
    }

    #[instrument(skip_all)]
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchOutcome, DispatchError> {
        match request {
            DispatchRequest::Alert {
                alerta_id,
                tipo_alerta,
                valor_atual,
                limite,
            } => {
                let rule = self
                    .store
                    .alert_rule(alerta_id)
                    .await?
                    .ok_or(DispatchError::AlertNotFound(alerta_id))?;

                let profile = self
                    .store
                    .user_profile(&rule.user_id)
                    .await?
                    .ok_or_else(|| DispatchError::ProfileNotFound(rule.user_id.clone()))?;

                let (servidor_nome, ip_servidor) = self.resolve_target(&rule).await;
                let ctx = TemplateContext::new(
                    tipo_alerta,
                    servidor_nome,
                    ip_servidor,
                    valor_atual,
                    limite,
                );

                let channels = rule.requested_channels();
                self.fan_out(&profile, &ctx, &channels, Some(alerta_id), false)
                    .await
            }
            DispatchRequest::Test {
                token,
                tipo_alerta,
                valor_atual,
                limite,
                servidor_nome,
                ip_servidor,
            } => {
                let profile = self.resolve_test_profile(token.as_deref()).await?;
                let ctx = TemplateContext::new(
                    tipo_alerta,
                    servidor_nome,
                    ip_servidor,
                    valor_atual,
                    limite,
                );

                // Test dispatches exercise both channels.
                let channels = vec![Channel::Email, Channel::Whatsapp];
                self.fan_out(&profile, &ctx, &channels, None, true).await
            }
        }
    }

    /// Server name and address for the alert message. Rules bound to an
    /// application (or to a since-deleted server) still dispatch, with
    /// placeholder target info.
    async fn resolve_target(&self, rule: &crate::store::schema::AlertRule) -> (String, String) {
        if let Some(server_id) = rule.server_id {
            match self.store.server(server_id).await {
                Ok(Some(server)) => return (server.name, server.address),
                Ok(None) => warn!(server_id, "alert rule references a missing server"),
                Err(e) => warn!(server_id, "server lookup failed: {e}"),
            }
            return (format!("servidor {server_id}"), "-".to_string());
        }
        match rule.application_id {
            Some(app_id) => (format!("aplicação {app_id}"), "-".to_string()),
            None => ("desconhecido".to_string(), "-".to_string()),
        }
    }

    async fn resolve_test_profile(
        &self,
        token: Option<&str>,
    ) -> Result<UserProfile, DispatchError> {
        if let Some(token) = token {
            if let Some(profile) = self.store.profile_by_token(token).await? {
                return Ok(profile);
            }
            warn!("test dispatch token matched no profile, falling back");
        } else {
            warn!("unauthenticated test dispatch, falling back to an arbitrary profile");
        }

        self.store
            .fallback_profile()
            .await?
            .ok_or(DispatchError::NoTestProfile)
    }

    async fn fan_out(
        &self,
        profile: &UserProfile,
        ctx: &TemplateContext,
        channels: &[Channel],
        alerta_id: Option<i64>,
        test_mode: bool,
    ) -> Result<DispatchOutcome, DispatchError> {
        let to = profile.alert_email().to_string();

        let email = if channels.contains(&Channel::Email) {
            match self
                .email
                .send(
                    &profile.id,
                    &to,
                    profile.email_template.as_deref(),
                    ctx,
                    alerta_id,
                    test_mode,
                )
                .await
            {
                Ok(()) => ChannelOutcome::sent(),
                Err(e) => {
                    warn!("email channel failed: {e}");
                    ChannelOutcome::failed(e.to_string())
                }
            }
        } else {
            ChannelOutcome::not_requested()
        };

        let whatsapp = if channels.contains(&Channel::Whatsapp) {
            match profile.whatsapp.as_deref() {
                Some(number) => match self
                    .whatsapp
                    .send(&profile.id, number, ctx, alerta_id, test_mode)
                    .await
                {
                    Ok(()) => ChannelOutcome::sent(),
                    Err(e) => {
                        warn!("whatsapp channel failed: {e}");
                        ChannelOutcome::failed(e.to_string())
                    }
                },
                None => {
                    ChannelOutcome::failed("WhatsApp não configurado para este usuário")
                }
            }
        } else {
            ChannelOutcome::not_requested()
        };

        let success = email.sent || whatsapp.sent;

        if !test_mode {
            let status = if success {
                DeliveryStatus::Enviado
            } else {
                DeliveryStatus::ErroEnvio
            };
            let channel_list = channels
                .iter()
                .map(Channel::as_str)
                .collect::<Vec<_>>()
                .join(",");
            let record = NotificationRecord {
                user_id: Some(profile.id.clone()),
                channel: channel_list,
                destinatario: to.clone(),
                mensagem: format!(
                    "{} em {}: {:.1}% (limite {:.1}%)",
                    ctx.tipo_alerta, ctx.servidor_nome, ctx.valor_atual, ctx.limite
                ),
                status,
                alerta_id,
                created_at: chrono::Utc::now(),
            };
            if let Err(e) = self.store.insert_notification(record).await {
                warn!("failed to record dispatch outcome: {e}");
            }
        }

        info!(
            success,
            email_sent = email.sent,
            whatsapp_sent = whatsapp.sent,
            "alert dispatch finished"
        );

        Ok(DispatchOutcome {
            success,
            email_destino: to,
            email,
            whatsapp,
            tipo_alerta: ctx.tipo_alerta.clone(),
            servidor_nome: ctx.servidor_nome.clone(),
            valor_atual: ctx.valor_atual,
            limite: ctx.limite,
        })
    }
}
