//! Payment endpoints: one-off charges/refunds and recurring subscriptions.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::{error_response, AppState};
use crate::payments::{
    ChargeRequest, RefundRequest, SubscriptionOutcome, SubscriptionRequest, TransactionOutcome,
};
use crate::util::dates::today_utc;

const MISSING_SUBSCRIPTION_CREDENTIALS: &str =
    "Server missing AUTHNET_API_LOGIN_ID / AUTHNET_TRANSACTION_KEY env vars.";

// =============================================================================
// Charges & Refunds
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub payment_data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaymentAction {
    Charge,
    Refund,
}

fn failure(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

fn valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

pub async fn authorize_net_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Response {
    let action = match request.action.as_deref() {
        Some("charge") => PaymentAction::Charge,
        Some("refund") => PaymentAction::Refund,
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid action"),
    };

    let Some(client) = state.payments.as_ref() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authorize.Net credentials not configured",
        );
    };

    let outcome = match action {
        PaymentAction::Charge => {
            let charge: ChargeRequest = match serde_json::from_value(request.payment_data) {
                Ok(charge) => charge,
                Err(e) => return failure(&format!("Invalid paymentData: {e}")),
            };
            if !valid_amount(charge.amount) {
                return failure("Invalid amount");
            }
            client.charge(&charge).await
        }
        PaymentAction::Refund => {
            let refund: RefundRequest = match serde_json::from_value(request.payment_data) {
                Ok(refund) => refund,
                Err(e) => return failure(&format!("Invalid paymentData: {e}")),
            };
            if !valid_amount(refund.amount) {
                return failure("Invalid amount");
            }
            client.refund(&refund).await
        }
    };

    match outcome {
        Ok(TransactionOutcome::Approved {
            transaction_id,
            auth_code,
            account_number,
            account_type,
        }) => {
            let body = match action {
                PaymentAction::Charge => json!({
                    "success": true,
                    "transactionId": transaction_id,
                    "authCode": auth_code,
                    "accountNumber": account_number,
                    "accountType": account_type,
                    "message": "Payment processed successfully",
                }),
                PaymentAction::Refund => json!({
                    "success": true,
                    "transactionId": transaction_id,
                    "message": "Refund processed successfully",
                }),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(TransactionOutcome::Declined {
            message,
            response_code,
        }) => match action {
            PaymentAction::Charge => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": message, "responseCode": response_code })),
            )
                .into_response(),
            PaymentAction::Refund => failure(&message),
        },
        Ok(TransactionOutcome::Failed { message }) => failure(&message),
        Err(e) => {
            error!(action = ?action, error = %e, "payment_processing_failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Payment processing failed", "message": e.public_message() })),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

fn subscription_reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

pub async fn create_subscription(
    State(state): State<AppState>,
    Json(request): Json<SubscriptionRequest>,
) -> Response {
    let subscription = match request.validate(today_utc(), state.config.trial_days) {
        Ok(subscription) => subscription,
        Err(message) => {
            warn!(reason = message, "subscription_request_invalid");
            return subscription_reply(StatusCode::BAD_REQUEST, message);
        }
    };

    let Some(client) = state.subscriptions.as_ref() else {
        return subscription_reply(StatusCode::INTERNAL_SERVER_ERROR, MISSING_SUBSCRIPTION_CREDENTIALS);
    };

    info!(
        customer_id = %subscription.customer_id,
        plan = %subscription.plan_name,
        interval_months = subscription.interval_months,
        "subscription_create_requested"
    );

    match client.create_subscription(&subscription).await {
        Ok(SubscriptionOutcome::Created { subscription_id }) => (
            StatusCode::OK,
            Json(json!({ "success": true, "subscriptionId": subscription_id })),
        )
            .into_response(),
        Ok(SubscriptionOutcome::Failed { message }) => {
            subscription_reply(StatusCode::BAD_REQUEST, &message)
        }
        Err(e) => {
            error!(error = %e, "subscription_create_failed");
            subscription_reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}
