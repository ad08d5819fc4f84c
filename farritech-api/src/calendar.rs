//! Google OAuth token exchange for calendar sync.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ClientError, Result};

/// Token endpoint response, passed back to the browser as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

#[derive(Clone)]
pub struct GoogleOAuthClient {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    default_redirect_uri: Option<String>,
}

impl GoogleOAuthClient {
    pub fn new(
        client: Client,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
        default_redirect_uri: Option<&str>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            default_redirect_uri: default_redirect_uri.map(str::to_string),
        }
    }

    /// Trade an authorization code for access and refresh tokens.
    ///
    /// `redirect_uri` must match the one used to obtain the code; the
    /// configured default is used when the caller omits it.
    pub async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<TokenSet> {
        let redirect_uri = redirect_uri
            .filter(|r| !r.is_empty())
            .or(self.default_redirect_uri.as_deref())
            .unwrap_or_default();

        let tokens = self
            .request(
                &[
                    ("code", code),
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("redirect_uri", redirect_uri),
                    ("grant_type", "authorization_code"),
                ],
                "Token exchange failed",
            )
            .await?;

        info!(has_refresh_token = tokens.refresh_token.is_some(), "google_code_exchanged");
        Ok(tokens)
    }

    /// Mint a new access token. The refresh token itself is never echoed back.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        let mut tokens = self
            .request(
                &[
                    ("refresh_token", refresh_token),
                    ("client_id", self.client_id.as_str()),
                    ("client_secret", self.client_secret.as_str()),
                    ("grant_type", "refresh_token"),
                ],
                "Token refresh failed",
            )
            .await?;

        tokens.refresh_token = None;
        info!(expires_in = ?tokens.expires_in, "google_token_refreshed");
        Ok(tokens)
    }

    async fn request(&self, form: &[(&str, &str)], failure: &str) -> Result<TokenSet> {
        let response = self.client.post(&self.token_url).form(form).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "google_token_request_failed");
            return Err(ClientError::rejected(
                "google",
                status,
                format!("{failure}: {}", body.trim()),
            ));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::util::stub::{Recorded, Stub};

    fn stub_client(stub: &Stub) -> GoogleOAuthClient {
        GoogleOAuthClient::new(
            Client::new(),
            &format!("{}/token", stub.base_url),
            "client-id",
            "client-secret",
            Some("https://farrier-pro.vercel.app/oauth"),
        )
    }

    #[tokio::test]
    async fn test_exchange_uses_default_redirect() {
        let stub = Stub::start(|_: &Recorded| {
            (
                StatusCode::OK,
                r#"{"access_token":"ya29","refresh_token":"1//r","expires_in":3599}"#.to_string(),
            )
        })
        .await;

        let tokens = stub_client(&stub).exchange_code("4/abc", None).await.unwrap();

        assert_eq!(tokens.refresh_token.as_deref(), Some("1//r"));
        let form = &stub.hits("/token")[0].body;
        assert!(form.contains("grant_type=authorization_code"));
        assert!(form.contains("redirect_uri=https%3A%2F%2Ffarrier-pro.vercel.app%2Foauth"));
    }

    #[tokio::test]
    async fn test_refresh_drops_refresh_token() {
        let stub = Stub::start(|_: &Recorded| {
            (
                StatusCode::OK,
                r#"{"access_token":"ya29.new","refresh_token":"1//r","expires_in":3599}"#.to_string(),
            )
        })
        .await;

        let tokens = stub_client(&stub).refresh("1//r").await.unwrap();

        assert_eq!(tokens.access_token.as_deref(), Some("ya29.new"));
        assert_eq!(tokens.refresh_token, None);
        assert!(stub.hits("/token")[0].body.contains("grant_type=refresh_token"));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_rejection() {
        let stub = Stub::start(|_: &Recorded| {
            (StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#.to_string())
        })
        .await;

        let err = stub_client(&stub).refresh("1//stale").await.unwrap_err();

        assert_eq!(err.public_message(), r#"Token refresh failed: {"error":"invalid_grant"}"#);
    }

    #[test]
    fn test_token_set_omits_missing_fields() {
        let tokens: TokenSet = serde_json::from_str(
            r#"{"access_token":"ya29.a0","expires_in":3599,"scope":"https://www.googleapis.com/auth/calendar","token_type":"Bearer","id_token":"x"}"#,
        )
        .unwrap();

        let json = serde_json::to_value(&tokens).unwrap();
        assert_eq!(json["access_token"], "ya29.a0");
        assert_eq!(json["expires_in"], 3599);
        assert!(json.get("refresh_token").is_none());
        assert!(json.get("id_token").is_none());
    }
}
