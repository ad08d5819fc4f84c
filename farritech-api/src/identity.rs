//! Firebase Identity Toolkit: email existence lookups and ID token checks.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{extract_error_message, rejection_from, Result};

/// Identity Toolkit client authenticated with a web API key.
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Whether an account exists for an email, or why the provider could not say.
#[derive(Debug, Clone, PartialEq)]
pub enum EmailLookup {
    Known { exists: bool },
    /// The provider answered with an error; its message is passed through.
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct CreateAuthUriResponse {
    #[serde(default)]
    registered: bool,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

impl IdentityClient {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Ask whether `email` belongs to a registered account.
    ///
    /// `email` is expected to be normalized already (see [`normalize_email`]).
    pub async fn email_exists(&self, email: &str) -> Result<EmailLookup> {
        let url = format!("{}/accounts:createAuthUri", self.base_url);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            // continueUri is required by the endpoint but unused for this lookup
            .json(&json!({ "identifier": email, "continueUri": "https://localhost" }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = extract_error_message(&body);
            warn!(status = status.as_u16(), error = %error, "identity_lookup_failed");
            return Ok(EmailLookup::Failed { error });
        }

        let parsed: CreateAuthUriResponse = serde_json::from_str(&body)?;
        info!(registered = parsed.registered, "identity_lookup_complete");

        Ok(EmailLookup::Known {
            exists: parsed.registered,
        })
    }

    /// Resolve a Firebase ID token to the uid of the signed-in user.
    ///
    /// `None` when the provider refuses the token, e.g. once it has expired.
    /// Provider outages are errors.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<Option<String>> {
        let url = format!("{}/accounts:lookup", self.base_url);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "idToken": id_token }))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let error = extract_error_message(&response.text().await?);
            warn!(status = status.as_u16(), error = %error, "identity_token_rejected");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(rejection_from("identity", response).await);
        }

        let parsed: LookupResponse = serde_json::from_str(&response.text().await?)?;
        Ok(parsed.users.into_iter().next().map(|user| user.local_id))
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::util::stub::{Recorded, Stub};

    fn stub_client(stub: &Stub) -> IdentityClient {
        IdentityClient::new(Client::new(), &stub.base_url, "web-key")
    }

    #[tokio::test]
    async fn test_email_exists_known() {
        let stub = Stub::start(|_: &Recorded| {
            (StatusCode::OK, r#"{"registered":true,"sessionId":"s"}"#.to_string())
        })
        .await;

        let lookup = stub_client(&stub).email_exists("jane@example.com").await.unwrap();

        assert_eq!(lookup, EmailLookup::Known { exists: true });
        let request = &stub.hits("/accounts:createAuthUri")[0];
        assert_eq!(request.query, "key=web-key");
        assert!(request.body.contains(r#""identifier":"jane@example.com""#));
    }

    #[tokio::test]
    async fn test_email_exists_vendor_error_is_failed_lookup() {
        let stub = Stub::start(|_: &Recorded| {
            (
                StatusCode::BAD_REQUEST,
                r#"{"error":{"code":400,"message":"INVALID_IDENTIFIER"}}"#.to_string(),
            )
        })
        .await;

        let lookup = stub_client(&stub).email_exists("nope").await.unwrap();

        assert_eq!(
            lookup,
            EmailLookup::Failed {
                error: "INVALID_IDENTIFIER".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_verify_id_token() {
        let stub = Stub::start(|req: &Recorded| {
            if req.body.contains("good-token") {
                (StatusCode::OK, r#"{"users":[{"localId":"uid-1","email":"a@b.co"}]}"#.to_string())
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    r#"{"error":{"code":400,"message":"INVALID_ID_TOKEN"}}"#.to_string(),
                )
            }
        })
        .await;
        let client = stub_client(&stub);

        assert_eq!(client.verify_id_token("good-token").await.unwrap().as_deref(), Some("uid-1"));
        assert_eq!(client.verify_id_token("stale-token").await.unwrap(), None);
        assert_eq!(stub.hits("/accounts:lookup").len(), 2);
    }

    #[tokio::test]
    async fn test_verify_id_token_outage_is_error() {
        let stub = Stub::start(|_: &Recorded| {
            (StatusCode::SERVICE_UNAVAILABLE, r#"{"error":{"message":"BACKEND_ERROR"}}"#.to_string())
        })
        .await;

        let err = stub_client(&stub).verify_id_token("good-token").await.unwrap_err();

        assert_eq!(err.public_message(), "BACKEND_ERROR");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
        assert_eq!(normalize_email("   "), "");
    }

    #[test]
    fn test_registered_defaults_false() {
        let parsed: CreateAuthUriResponse =
            serde_json::from_str(r#"{"kind":"identitytoolkit#CreateAuthUriResponse","sessionId":"x"}"#)
                .unwrap();
        assert!(!parsed.registered);
    }
}
