//! Error type shared by the vendor API clients.

use reqwest::StatusCode;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
    /// The vendor answered, but with a failure envelope or status.
    #[error("{vendor} rejected the request ({status}): {message}")]
    Rejected {
        vendor: &'static str,
        status: StatusCode,
        message: String,
    },
}

impl ClientError {
    pub fn rejected(vendor: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        ClientError::Rejected {
            vendor,
            status,
            message: message.into(),
        }
    }

    /// Message suitable for echoing back to an API caller.
    pub fn public_message(&self) -> String {
        match self {
            ClientError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Turn a non-success response into [`ClientError::Rejected`].
///
/// Vendors disagree on where the human-readable text lives, so the common
/// shapes are probed in turn before falling back to the raw body.
pub(crate) async fn rejection_from(vendor: &'static str, response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return ClientError::Http(e),
    };

    ClientError::rejected(vendor, status, extract_error_message(&body))
}

pub(crate) fn extract_error_message(body: &str) -> String {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) if body.trim().is_empty() => return "unknown_error".to_string(),
        Err(_) => return body.trim().chars().take(300).collect(),
    };

    let candidates = [
        parsed.pointer("/error/message"),
        parsed.get("message"),
        parsed.get("error_description"),
        parsed.get("error"),
    ];

    let found = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_string);

    found.unwrap_or_else(|| parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_shapes() {
        assert_eq!(
            extract_error_message(r#"{"error":{"code":400,"message":"INVALID_EMAIL"}}"#),
            "INVALID_EMAIL"
        );
        assert_eq!(extract_error_message(r#"{"message":"bad from"}"#), "bad from");
        assert_eq!(
            extract_error_message(r#"{"error":"invalid_grant","error_description":"Bad code"}"#),
            "Bad code"
        );
        assert_eq!(extract_error_message(r#"{"error":"invalid_grant"}"#), "invalid_grant");
        assert_eq!(extract_error_message(""), "unknown_error");
        assert_eq!(extract_error_message("Gateway Timeout"), "Gateway Timeout");
    }

    #[test]
    fn test_public_message_rejected() {
        let err = ClientError::rejected("resend", StatusCode::UNPROCESSABLE_ENTITY, "bad address");
        assert_eq!(err.public_message(), "bad address");
        assert!(err.to_string().contains("resend rejected the request"));
    }
}
