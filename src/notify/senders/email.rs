//! Transactional email sender.
//!
//! One POST per alert to the provider's `/emails` endpoint with a fixed
//! sender identity. The body is the user's custom template when one is
//! stored on the profile, otherwise the built-in default.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EmailConfig;
use crate::notify::senders::SenderError;
use crate::notify::template::{TemplateContext, DEFAULT_EMAIL_TEMPLATE};
use crate::store::schema::{DeliveryStatus, NotificationRecord};
use crate::store::DataStore;

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

pub struct EmailSender {
    client: reqwest::Client,
    config: EmailConfig,
    store: Arc<dyn DataStore>,
}

impl EmailSender {
    pub fn new(client: reqwest::Client, config: EmailConfig, store: Arc<dyn DataStore>) -> Self {
        Self {
            client,
            config,
            store,
        }
    }

    /// Deliver one alert email. `to` is the already-resolved
    /// notification address. Writes a per-channel audit record on
    /// success unless `test_mode` is set.
    pub async fn send(
        &self,
        user_id: &str,
        to: &str,
        custom_template: Option<&str>,
        ctx: &TemplateContext,
        alerta_id: Option<i64>,
        test_mode: bool,
    ) -> Result<(), SenderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| SenderError::NotConfigured("chave da API de email ausente".into()))?;

        let subject = ctx.email_subject();
        let html = ctx.render(custom_template.unwrap_or(DEFAULT_EMAIL_TEMPLATE));

        let response = self
            .client
            .post(format!("{}/emails", self.config.api_url))
            .bearer_auth(api_key)
            .json(&SendEmailBody {
                from: &self.config.from,
                to: [to],
                subject: &subject,
                html: &html,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SenderError::UpstreamRejected { status, body });
        }

        debug!(to, "alert email accepted by provider");

        if !test_mode {
            let record = NotificationRecord {
                user_id: Some(user_id.to_string()),
                channel: "email".to_string(),
                destinatario: to.to_string(),
                mensagem: subject,
                status: DeliveryStatus::Enviado,
                alerta_id,
                created_at: chrono::Utc::now(),
            };
            // The email already went out; a failed audit insert must
            // not turn the delivery into a channel failure.
            if let Err(e) = self.store.insert_notification(record).await {
                warn!("failed to record email delivery: {e}");
            }
        }

        Ok(())
    }
}
