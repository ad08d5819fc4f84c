//! Appointment list endpoint backing the dashboard filters.
//!
//! Callers authenticate with their Firebase ID token
//! (`Authorization: Bearer <token>`) and may only list farriers they own.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::{error_response, AppState};
use crate::schedule::{farrier_owned_by, list_appointments, ScheduleFilter};
use crate::store::Document;
use crate::util::dates::today_utc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentsQuery {
    pub farrier_id: Option<String>,
    pub filter: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn appointments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Response {
    let Some(id_token) = bearer_token(&headers) else {
        warn!("appointments_auth_missing");
        return error_response(StatusCode::UNAUTHORIZED, "Missing bearer token");
    };

    let Some(farrier_id) = query.farrier_id.as_deref().filter(|id| !id.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "farrierId required");
    };

    let Some(identity) = state.identity.as_ref() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Identity provider not configured");
    };

    let Some(store) = state.store.as_ref() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Document store not configured");
    };

    let uid = match identity.verify_id_token(id_token).await {
        Ok(Some(uid)) => uid,
        Ok(None) => return error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token"),
        Err(e) => {
            error!(error = %e, "appointments_token_check_failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify token");
        }
    };

    match farrier_owned_by(store.as_ref(), farrier_id, &uid).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(farrier_id = farrier_id, uid = %uid, "appointments_access_denied");
            return error_response(StatusCode::FORBIDDEN, "Forbidden");
        }
        Err(e) => {
            error!(farrier_id = farrier_id, error = %e, "appointments_owner_check_failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load appointments");
        }
    }

    let filter = ScheduleFilter::parse(query.filter.as_deref());

    match list_appointments(store.as_ref(), farrier_id, filter, today_utc()).await {
        Ok(docs) => {
            let appointments: Vec<_> = docs.iter().map(Document::to_json).collect();
            (
                StatusCode::OK,
                Json(json!({ "filter": filter.as_str(), "appointments": appointments })),
            )
                .into_response()
        }
        Err(e) => {
            error!(farrier_id = farrier_id, error = %e, "appointments_load_failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load appointments")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer eyJhbGci.x.y".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("eyJhbGci.x.y"));
    }
}
