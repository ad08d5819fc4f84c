//! Twilio webhook signature verification.
//!
//! Twilio signs webhook requests using HMAC-SHA1.
//! Reference: https://www.twilio.com/docs/usage/security#validating-requests

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::warn;

type HmacSha1 = Hmac<Sha1>;

/// Verify an `X-Twilio-Signature` header.
///
/// The signed data is the full webhook URL followed by every POST parameter
/// name and value, sorted by name, concatenated without separators. The
/// signature is the base64 HMAC-SHA1 of that data keyed by the auth token.
///
/// # Arguments
///
/// * `auth_token` - The account auth token
/// * `url` - The exact URL configured as the number's SMS webhook
/// * `params` - Decoded form parameters from the request body
/// * `signature` - The `X-Twilio-Signature` header value
pub fn verify_twilio_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: &str,
) -> bool {
    if auth_token.is_empty() || url.is_empty() || signature.is_empty() {
        warn!(
            has_auth_token = !auth_token.is_empty(),
            has_url = !url.is_empty(),
            has_signature = !signature.is_empty(),
            "twilio_signature_missing_fields"
        );
        return false;
    }

    let expected_signature = match compute_signature(auth_token, url, params) {
        Some(s) => s,
        None => {
            warn!("twilio_signature_invalid_key");
            return false;
        }
    };

    let valid = constant_time_compare(&expected_signature, signature.trim());

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "twilio_signature_mismatch"
        );
    }

    valid
}

/// Base64 HMAC-SHA1 over the URL and sorted parameters.
pub fn compute_signature(auth_token: &str, url: &str, params: &[(String, String)]) -> Option<String> {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut data = url.to_string();
    for (key, value) in sorted {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes()).ok()?;
    mac.update(data.as_bytes());

    Some(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Signature checks run only when both the auth token and webhook URL are known.
pub fn is_signature_verification_enabled(auth_token: Option<&str>, webhook_url: Option<&str>) -> bool {
    let present = |v: Option<&str>| v.map(|s| !s.trim().is_empty()).unwrap_or(false);
    present(auth_token) && present(webhook_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<(String, String)> {
        vec![
            ("From".to_string(), "+15551234567".to_string()),
            ("Body".to_string(), "CONFIRM".to_string()),
            ("To".to_string(), "+15615550100".to_string()),
        ]
    }

    #[test]
    fn test_verify_signature_missing_fields() {
        assert!(!verify_twilio_signature("", "https://x/api", &params(), "sig"));
        assert!(!verify_twilio_signature("token", "", &params(), "sig"));
        assert!(!verify_twilio_signature("token", "https://x/api", &params(), ""));
    }

    #[test]
    fn test_verify_signature_valid() {
        let url = "https://farrier-pro.vercel.app/api/twilio-webhook";
        let signature = compute_signature("auth-token", url, &params()).unwrap();

        assert!(verify_twilio_signature("auth-token", url, &params(), &signature));
    }

    #[test]
    fn test_signature_ignores_param_order() {
        let url = "https://farrier-pro.vercel.app/api/twilio-webhook";
        let mut reversed = params();
        reversed.reverse();

        assert_eq!(
            compute_signature("auth-token", url, &params()),
            compute_signature("auth-token", url, &reversed)
        );
    }

    #[test]
    fn test_verify_signature_wrong_token_or_tampered() {
        let url = "https://farrier-pro.vercel.app/api/twilio-webhook";
        let signature = compute_signature("other-token", url, &params()).unwrap();
        assert!(!verify_twilio_signature("auth-token", url, &params(), &signature));

        let signature = compute_signature("auth-token", url, &params()).unwrap();
        let mut tampered = params();
        tampered[1].1 = "STOP".to_string();
        assert!(!verify_twilio_signature("auth-token", url, &tampered, &signature));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_is_signature_verification_enabled() {
        assert!(!is_signature_verification_enabled(None, None));
        assert!(!is_signature_verification_enabled(Some("token"), None));
        assert!(!is_signature_verification_enabled(Some("   "), Some("https://x")));
        assert!(is_signature_verification_enabled(Some("token"), Some("https://x")));
    }
}
