//! `{{placeholder}}` substitution for alert messages.
//!
//! Users may store their own email or WhatsApp templates; both go
//! through the same context and the same substitution pass. Unknown
//! placeholders are left in place rather than erased, so a typo in a
//! custom template stays visible instead of silently vanishing.

use chrono::Utc;

/// Variables available to alert templates.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub tipo_alerta: String,
    pub servidor_nome: String,
    pub ip_servidor: String,
    pub valor_atual: f64,
    pub limite: f64,
    pub data_hora: String,
}

impl TemplateContext {
    pub fn new(
        tipo_alerta: impl Into<String>,
        servidor_nome: impl Into<String>,
        ip_servidor: impl Into<String>,
        valor_atual: f64,
        limite: f64,
    ) -> Self {
        Self {
            tipo_alerta: tipo_alerta.into(),
            servidor_nome: servidor_nome.into(),
            ip_servidor: ip_servidor.into(),
            valor_atual,
            limite,
            data_hora: Utc::now().format("%d/%m/%Y %H:%M:%S").to_string(),
        }
    }

    /// Substitute every known `{{placeholder}}` in `template`.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{{tipo_alerta}}", &self.tipo_alerta)
            .replace("{{servidor_nome}}", &self.servidor_nome)
            .replace("{{ip_servidor}}", &self.ip_servidor)
            .replace("{{valor_atual}}", &format!("{:.1}", self.valor_atual))
            .replace("{{limite}}", &format!("{:.1}", self.limite))
            .replace("{{data_hora}}", &self.data_hora)
    }

    /// Subject line for alert emails.
    pub fn email_subject(&self) -> String {
        format!(
            "🚨 Alerta: {} em {}",
            self.tipo_alerta, self.servidor_nome
        )
    }
}

/// Built-in HTML email body, used when the profile carries no custom
/// template.
pub const DEFAULT_EMAIL_TEMPLATE: &str = r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background-color: #dc2626; color: white; padding: 16px; border-radius: 8px 8px 0 0;">
    <h2 style="margin: 0;">🚨 Alerta de Monitoramento</h2>
  </div>
  <div style="padding: 16px; border: 1px solid #e5e7eb; border-radius: 0 0 8px 8px;">
    <p>Um alerta de <strong>{{tipo_alerta}}</strong> foi disparado.</p>
    <table style="width: 100%; border-collapse: collapse;">
      <tr><td style="padding: 4px 0;"><strong>Servidor:</strong></td><td>{{servidor_nome}}</td></tr>
      <tr><td style="padding: 4px 0;"><strong>IP:</strong></td><td>{{ip_servidor}}</td></tr>
      <tr><td style="padding: 4px 0;"><strong>Valor atual:</strong></td><td>{{valor_atual}}%</td></tr>
      <tr><td style="padding: 4px 0;"><strong>Limite configurado:</strong></td><td>{{limite}}%</td></tr>
      <tr><td style="padding: 4px 0;"><strong>Data/hora:</strong></td><td>{{data_hora}}</td></tr>
    </table>
    <p style="color: #6b7280; font-size: 12px; margin-top: 16px;">
      Mensagem automática do sistema de monitoramento.
    </p>
  </div>
</div>"#;

/// Built-in WhatsApp body, used when the messaging instance carries no
/// custom template.
pub const DEFAULT_WHATSAPP_TEMPLATE: &str = "🚨 *Alerta de Monitoramento*\n\n\
*Tipo:* {{tipo_alerta}}\n\
*Servidor:* {{servidor_nome}}\n\
*IP:* {{ip_servidor}}\n\
*Valor atual:* {{valor_atual}}%\n\
*Limite:* {{limite}}%\n\
*Data/hora:* {{data_hora}}";
