//! Email endpoints: welcome messages and appointment notices.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, info, warn};

use super::AppState;
use crate::email::templates::{self, AppointmentEmail, Rendered, WelcomeEmail};
use crate::email::{EmailSender, OutgoingEmail, FARRITECH_FROM, LEGACY_FROM};
use crate::error::ClientError;

/// `{ok:false, error}` reply used by the appointment notices.
fn not_ok(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": error }))).into_response()
}

fn ok() -> Response {
    (StatusCode::OK, Json(json!({ "ok": true }))).into_response()
}

fn mailer(state: &AppState) -> Option<&dyn EmailSender> {
    state.mailer.as_deref()
}

// =============================================================================
// Welcome
// =============================================================================

/// Original signup welcome.
pub async fn send_welcome(State(state): State<AppState>, Json(request): Json<WelcomeEmail>) -> Response {
    let failed = || {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Email failed" })),
        )
            .into_response()
    };

    let (Some(sender), Some(to)) = (mailer(&state), request.email.as_deref()) else {
        warn!(has_email = request.email.is_some(), "welcome_email_not_sent");
        return failed();
    };

    let Rendered { subject, html } =
        templates::legacy_welcome(request.business_name.as_deref().unwrap_or_default());

    match sender.send(&OutgoingEmail::new(LEGACY_FROM, to, subject, html)).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(e) => {
            error!(error = %e, "welcome_email_failed");
            failed()
        }
    }
}

pub async fn send_welcome_email(
    State(state): State<AppState>,
    Json(request): Json<WelcomeEmail>,
) -> Response {
    let Some(sender) = mailer(&state) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to send welcome email" })),
        )
            .into_response();
    };

    let Some(to) = request.email.as_deref() else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing email" }))).into_response();
    };

    let Rendered { subject, html } = templates::welcome(&request);

    match sender.send(&OutgoingEmail::new(FARRITECH_FROM, to, subject, html)).await {
        Ok(sent) => (StatusCode::OK, Json(json!({ "success": true, "data": sent }))).into_response(),
        Err(ClientError::Rejected { message, .. }) => {
            warn!(error = %message, "welcome_email_rejected");
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "welcome_email_failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to send welcome email" })),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Booking
// =============================================================================

/// Notify the farrier of a new booking and confirm receipt to the customer.
///
/// Both sends are attempted; any failure turns the reply into a 207 listing
/// what went wrong.
pub async fn send_booking_emails(
    State(state): State<AppState>,
    Json(booking): Json<AppointmentEmail>,
) -> Response {
    let Some(farrier_email) = booking.farrier_email.as_deref() else {
        return not_ok(StatusCode::BAD_REQUEST, "Missing farrierEmail");
    };

    let Some(sender) = mailer(&state) else {
        return not_ok(StatusCode::INTERNAL_SERVER_ERROR, "Email is not configured");
    };

    let mut errors = Vec::new();

    let Rendered { subject, html } = templates::farrier_booking(&booking);
    match sender.send(&OutgoingEmail::new(FARRITECH_FROM, farrier_email, subject, html)).await {
        Ok(_) => info!("booking_farrier_email_sent"),
        Err(e) => {
            error!(error = %e, "booking_farrier_email_failed");
            errors.push(format!("Farrier email: {}", e.public_message()));
        }
    }

    if let Some(customer_email) = booking.customer_email.as_deref() {
        let Rendered { subject, html } = templates::customer_booking(&booking);
        match sender.send(&OutgoingEmail::new(FARRITECH_FROM, customer_email, subject, html)).await {
            Ok(_) => info!("booking_customer_email_sent"),
            Err(e) => {
                error!(error = %e, "booking_customer_email_failed");
                errors.push(format!("Customer email: {}", e.public_message()));
            }
        }
    }

    if errors.is_empty() {
        ok()
    } else {
        (
            StatusCode::MULTI_STATUS,
            Json(json!({ "ok": false, "errors": errors })),
        )
            .into_response()
    }
}

// =============================================================================
// Appointment Notices
// =============================================================================

async fn send_notice(state: &AppState, notice: &AppointmentEmail, rendered: Rendered, kind: &'static str) -> Response {
    let Some(customer_email) = notice.customer_email.as_deref() else {
        return not_ok(StatusCode::BAD_REQUEST, "Missing customerEmail");
    };

    let Some(sender) = mailer(state) else {
        return not_ok(StatusCode::INTERNAL_SERVER_ERROR, "Email is not configured");
    };

    let email = OutgoingEmail::new(FARRITECH_FROM, customer_email, rendered.subject, rendered.html)
        .reply_to(notice.farrier_email.as_deref());

    match sender.send(&email).await {
        Ok(_) => {
            info!(kind = kind, "appointment_notice_sent");
            ok()
        }
        Err(e) => {
            error!(kind = kind, error = %e, "appointment_notice_failed");
            not_ok(StatusCode::INTERNAL_SERVER_ERROR, &e.public_message())
        }
    }
}

pub async fn send_update_email(
    State(state): State<AppState>,
    Json(notice): Json<AppointmentEmail>,
) -> Response {
    let rendered = templates::appointment_update(&notice);
    send_notice(&state, &notice, rendered, "update").await
}

pub async fn send_cancellation_email(
    State(state): State<AppState>,
    Json(notice): Json<AppointmentEmail>,
) -> Response {
    let rendered = templates::appointment_cancellation(&notice);
    send_notice(&state, &notice, rendered, "cancellation").await
}
