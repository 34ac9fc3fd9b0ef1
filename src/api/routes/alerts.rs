//! Alert dispatch endpoint

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::api::{error::ApiError, state::ApiState};
use crate::notify::DispatchRequest;
use crate::store::schema::{DeliveryStatus, NotificationRecord};

#[derive(Debug, Deserialize)]
pub struct TestData {
    pub servidor_nome: String,
    pub ip_servidor: String,
}

/// Request body for both modes. Field requirements depend on
/// `test_mode` and are validated in the handler rather than through
/// separate body types, so a malformed body always answers 400 with
/// the shared error shape.
#[derive(Debug, Deserialize)]
pub struct SendAlertBody {
    #[serde(default)]
    pub test_mode: bool,

    pub alerta_id: Option<i64>,
    pub tipo_alerta: Option<String>,
    pub valor_atual: Option<f64>,
    pub limite: Option<f64>,
    pub test_data: Option<TestData>,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn parse_request(body: SendAlertBody, token: Option<String>) -> Result<DispatchRequest, ApiError> {
    let tipo_alerta = body
        .tipo_alerta
        .ok_or_else(|| ApiError::InvalidRequest("tipo_alerta é obrigatório".into()))?;
    let valor_atual = body
        .valor_atual
        .ok_or_else(|| ApiError::InvalidRequest("valor_atual é obrigatório".into()))?;
    let limite = body
        .limite
        .ok_or_else(|| ApiError::InvalidRequest("limite é obrigatório".into()))?;

    if body.test_mode {
        let test_data = body
            .test_data
            .ok_or_else(|| ApiError::InvalidRequest("test_data é obrigatório em modo teste".into()))?;
        Ok(DispatchRequest::Test {
            token,
            tipo_alerta,
            valor_atual,
            limite,
            servidor_nome: test_data.servidor_nome,
            ip_servidor: test_data.ip_servidor,
        })
    } else {
        let alerta_id = body
            .alerta_id
            .ok_or_else(|| ApiError::InvalidRequest("alerta_id é obrigatório".into()))?;
        Ok(DispatchRequest::Alert {
            alerta_id,
            tipo_alerta,
            valor_atual,
            limite,
        })
    }
}

/// POST /api/v1/alerts/send
///
/// Dispatches one alert through the user's configured channels, or a
/// synthetic test alert when `test_mode` is set. Answers 200 when at
/// least one channel delivered, 500 otherwise (with the per-channel
/// breakdown either way).
pub async fn send_alert(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Option<Json<SendAlertBody>>,
) -> Response {
    let Some(Json(body)) = body else {
        return ApiError::InvalidRequest("corpo da requisição ausente ou inválido".into())
            .into_response();
    };

    let request = match parse_request(body, bearer_token(&headers)) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match state.dispatcher.dispatch(request).await {
        Ok(outcome) => {
            let status = if outcome.success {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let body = Json(json!({
                "success": outcome.success,
                "email_destino": outcome.email_destino,
                "canais": {
                    "email": outcome.email,
                    "whatsapp": outcome.whatsapp,
                },
                "alerta": {
                    "tipo_alerta": outcome.tipo_alerta,
                    "servidor_nome": outcome.servidor_nome,
                    "valor_atual": outcome.valor_atual,
                    "limite": outcome.limite,
                },
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }));
            (status, body).into_response()
        }
        Err(e) => {
            error!("alert dispatch aborted: {e}");
            // Best-effort audit entry; the 500 goes out regardless.
            let record = NotificationRecord::system(
                "envio-alertas",
                format!("falha crítica no envio de alerta: {e}"),
                DeliveryStatus::ErroCritico,
            );
            if let Err(audit) = state.store.insert_notification(record).await {
                error!("failed to record dispatch abort: {audit}");
            }
            ApiError::Internal(e.to_string()).into_response()
        }
    }
}
