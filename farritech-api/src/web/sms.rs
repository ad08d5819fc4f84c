//! SMS endpoints: the inbound reply webhook, outbound sends and number provisioning.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::{error_response, AppState};
use crate::sms::{phone, process_reply, twiml};
use crate::twilio::{ProvisionOutcome, SendOutcome};
use crate::util::dates::today_utc;
use crate::web::signature::{is_signature_verification_enabled, verify_twilio_signature};

const TWILIO_NOT_CONFIGURED: &str = "Twilio credentials not configured";

// =============================================================================
// Inbound Reply Webhook
// =============================================================================

/// TwiML reply. Always 200 so Twilio never retries a processed message.
fn twiml_response(message: Option<&str>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        twiml::render(message),
    )
        .into_response()
}

/// Twilio inbound SMS webhook.
///
/// The form body is decoded by hand so a malformed body still gets the
/// empty acknowledgement instead of an extractor rejection.
pub async fn twilio_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let params: Vec<(String, String)> = url::form_urlencoded::parse(&body).into_owned().collect();
    let field = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    };
    let from = field("From");
    let text = field("Body");

    info!(
        phone_digits = phone::digits_only(from).len(),
        body_length = text.len(),
        "sms_reply_received"
    );

    let config = &state.config;
    if is_signature_verification_enabled(
        config.twilio_auth_token.as_deref(),
        config.twilio_webhook_url.as_deref(),
    ) {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !verify_twilio_signature(
            config.twilio_auth_token.as_deref().unwrap_or_default(),
            config.twilio_webhook_url.as_deref().unwrap_or_default(),
            &params,
            signature,
        ) {
            warn!(has_signature = !signature.is_empty(), "sms_reply_signature_invalid");
            return twiml_response(None);
        }
    }

    let Some(store) = state.store.as_ref() else {
        warn!("sms_reply_store_not_configured");
        return twiml_response(None);
    };

    match process_reply(store.as_ref(), from, text, today_utc()).await {
        Ok(reply) => {
            info!(reply = ?reply, "sms_reply_processed");
            twiml_response(reply.message())
        }
        Err(e) => {
            error!(error = %e, "sms_reply_failed");
            twiml_response(None)
        }
    }
}

// =============================================================================
// Outbound SMS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSmsRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub farrier_id: Option<String>,
}

pub async fn send_sms(State(state): State<AppState>, Json(request): Json<SendSmsRequest>) -> Response {
    let Some(twilio) = state.twilio.as_ref() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, TWILIO_NOT_CONFIGURED);
    };

    let (to, body) = match (request.to.as_deref(), request.body.as_deref()) {
        (Some(to), Some(body)) if !to.is_empty() && !body.is_empty() => (to, body),
        _ => return error_response(StatusCode::BAD_REQUEST, "Missing required fields: to, body"),
    };

    let e164 = phone::to_e164(to);
    info!(
        farrier_id = ?request.farrier_id,
        phone_digits = phone::digits_only(&e164).len(),
        "sms_send_requested"
    );

    match twilio.send_sms(&e164, body).await {
        Ok(SendOutcome::Sent { sid, status }) => (
            StatusCode::OK,
            Json(json!({ "success": true, "messageSid": sid, "status": status })),
        )
            .into_response(),
        Ok(SendOutcome::Rejected { code, message }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": message, "code": code })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "sms_send_failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send SMS")
        }
    }
}

// =============================================================================
// Number Provisioning
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    #[serde(default)]
    pub farrier_id: Option<String>,
    #[serde(default)]
    pub area_code: Option<String>,
}

pub async fn provision_number(
    State(state): State<AppState>,
    Json(request): Json<ProvisionRequest>,
) -> Response {
    let Some(twilio) = state.twilio.as_ref() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, TWILIO_NOT_CONFIGURED);
    };

    let Some(farrier_id) = request.farrier_id.as_deref().filter(|id| !id.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "farrierId required");
    };

    let area_code = request
        .area_code
        .as_deref()
        .filter(|code| !code.is_empty())
        .unwrap_or(state.config.twilio_default_area_code.as_str());
    let sms_url = format!("{}/api/twilio-webhook", state.config.public_base_url);

    match twilio.provision_number(farrier_id, area_code, &sms_url).await {
        Ok(ProvisionOutcome::Provisioned { phone_number, sid }) => (
            StatusCode::OK,
            Json(json!({ "success": true, "phoneNumber": phone_number, "phoneNumberSid": sid })),
        )
            .into_response(),
        Ok(ProvisionOutcome::NoNumbersAvailable) => {
            warn!(farrier_id = farrier_id, area_code = area_code, "twilio_no_numbers_available");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "No available phone numbers found")
        }
        Ok(ProvisionOutcome::Rejected { message }) => error_response(StatusCode::BAD_REQUEST, &message),
        Err(e) => {
            error!(farrier_id = farrier_id, error = %e, "twilio_provision_failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to provision phone number")
        }
    }
}
