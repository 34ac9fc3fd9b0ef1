//! WhatsApp sender.
//!
//! Delivery goes through the user's own self-hosted gateway session: a
//! `connected` [`MessagingInstance`] is required, and its absence is a
//! hard per-channel failure since the channel was explicitly requested.
//! The destination number is stripped to digits before the call.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::notify::senders::SenderError;
use crate::notify::template::{TemplateContext, DEFAULT_WHATSAPP_TEMPLATE};
use crate::store::schema::{DeliveryStatus, MessagingInstance, NotificationRecord};
use crate::store::DataStore;

#[derive(Serialize)]
struct SendTextBody<'a> {
    number: &'a str,
    text: &'a str,
}

pub struct WhatsAppSender {
    client: reqwest::Client,
    store: Arc<dyn DataStore>,
}

impl WhatsAppSender {
    pub fn new(client: reqwest::Client, store: Arc<dyn DataStore>) -> Self {
        Self { client, store }
    }

    /// Deliver one alert message to `number` (free-form, digits are
    /// extracted here). Writes a per-channel audit record on success
    /// unless `test_mode` is set.
    pub async fn send(
        &self,
        user_id: &str,
        number: &str,
        ctx: &TemplateContext,
        alerta_id: Option<i64>,
        test_mode: bool,
    ) -> Result<(), SenderError> {
        let instance = self
            .store
            .connected_instance(user_id)
            .await?
            .ok_or_else(|| {
                SenderError::NotConfigured("nenhuma instância WhatsApp conectada".into())
            })?;

        let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(SenderError::NotConfigured(
                "número de WhatsApp inválido".into(),
            ));
        }

        let text = ctx.render(
            instance
                .message_template
                .as_deref()
                .unwrap_or(DEFAULT_WHATSAPP_TEMPLATE),
        );

        self.post_text(&instance, &digits, &text).await?;

        debug!(number = %digits, instance = %instance.name, "whatsapp message accepted by gateway");

        if !test_mode {
            let record = NotificationRecord {
                user_id: Some(user_id.to_string()),
                channel: "whatsapp".to_string(),
                destinatario: digits,
                mensagem: text,
                status: DeliveryStatus::Enviado,
                alerta_id,
                created_at: chrono::Utc::now(),
            };
            if let Err(e) = self.store.insert_notification(record).await {
                warn!("failed to record whatsapp delivery: {e}");
            }
        }

        Ok(())
    }

    async fn post_text(
        &self,
        instance: &MessagingInstance,
        number: &str,
        text: &str,
    ) -> Result<(), SenderError> {
        let response = self
            .client
            .post(format!(
                "{}/message/sendText/{}",
                instance.api_url, instance.name
            ))
            .header("apikey", &instance.api_key)
            .json(&SendTextBody { number, text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SenderError::UpstreamRejected { status, body });
        }

        Ok(())
    }
}
