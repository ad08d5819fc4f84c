//! HTTP surface: routing, shared state and endpoint handlers.
//!
//! Every endpoint is a thin adapter: decode the request, call one
//! collaborator from [`AppState`], translate the outcome into JSON (or TwiML
//! for the SMS webhook).

pub mod account;
pub mod appointments;
pub mod email;
pub mod payments;
pub mod signature;
pub mod sms;
pub mod state;

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use signature::{is_signature_verification_enabled, verify_twilio_signature};
pub use state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `{"error": message}` with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Build the application router.
///
/// Browser-facing `/api` routes get permissive CORS; the Twilio webhook is
/// server-to-server and does not.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api = Router::new()
        .route("/api/send-sms", post(sms::send_sms))
        .route("/api/provision-twilio-number", post(sms::provision_number))
        .route("/api/auth/email-exists", post(account::email_exists))
        .route("/api/google-calendar-auth", post(account::google_calendar_auth))
        .route("/api/authorize-net-payment", post(payments::authorize_net_payment))
        .route("/api/create-subscription", post(payments::create_subscription))
        .route("/api/send-welcome", post(email::send_welcome))
        .route("/api/send-welcome-email", post(email::send_welcome_email))
        .route("/api/send-booking-emails", post(email::send_booking_emails))
        .route("/api/send-update-email", post(email::send_update_email))
        .route("/api/send-cancellation-email", post(email::send_cancellation_email))
        .route("/api/appointments", get(appointments::appointments))
        .layer(cors);

    Router::new()
        .route("/health", get(health))
        .route("/api/twilio-webhook", post(sms::twilio_webhook))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
