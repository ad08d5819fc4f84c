//! Account endpoints: email existence lookups and Google Calendar OAuth.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::{error_response, AppState};
use crate::identity::{normalize_email, EmailLookup};

// =============================================================================
// Email Exists
// =============================================================================

fn lookup_reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

/// Tell the signup form whether an email already has an account.
///
/// Provider errors are reported in a 200 body with `exists: null` so the
/// form can fall back to letting the user continue.
pub async fn email_exists(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let Some(identity) = state.identity.as_ref() else {
        return lookup_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Missing FIREBASE_WEB_API_KEY env var",
        );
    };

    let email = match &body["email"] {
        Value::String(s) => normalize_email(s),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    if email.is_empty() {
        return lookup_reply(StatusCode::BAD_REQUEST, "Missing email");
    }

    match identity.email_exists(&email).await {
        Ok(EmailLookup::Known { exists }) => {
            (StatusCode::OK, Json(json!({ "success": true, "exists": exists }))).into_response()
        }
        Ok(EmailLookup::Failed { error }) => (
            StatusCode::OK,
            Json(json!({ "success": false, "exists": null, "error": error })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "email_exists_failed");
            lookup_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

// =============================================================================
// Google Calendar OAuth
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OAuthQuery {
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OAuthRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn oauth_failed(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "OAuth operation failed", "message": message })),
    )
        .into_response()
}

pub async fn google_calendar_auth(
    State(state): State<AppState>,
    Query(query): Query<OAuthQuery>,
    Json(request): Json<OAuthRequest>,
) -> Response {
    let action = query.action.as_deref().unwrap_or_default();
    if action != "exchange" && action != "refresh" {
        return error_response(StatusCode::BAD_REQUEST, "Invalid action");
    }

    let Some(google) = state.google.as_ref() else {
        return oauth_failed("Google OAuth is not configured");
    };

    let result = if action == "exchange" {
        let Some(code) = request.code.as_deref().filter(|c| !c.is_empty()) else {
            return error_response(StatusCode::BAD_REQUEST, "Authorization code required");
        };
        google.exchange_code(code, request.redirect_uri.as_deref()).await
    } else {
        let Some(token) = request.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
            return error_response(StatusCode::BAD_REQUEST, "Refresh token required");
        };
        google.refresh(token).await
    };

    match result {
        Ok(tokens) => {
            info!(action = action, "google_oauth_complete");
            (StatusCode::OK, Json(tokens)).into_response()
        }
        Err(e) => {
            error!(action = action, error = %e, "google_oauth_failed");
            oauth_failed(&e.public_message())
        }
    }
}
