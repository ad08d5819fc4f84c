//! Configuration module for environment variable parsing.
//!
//! Every collaborator credential is optional. Handlers whose collaborator is
//! missing answer with a "not configured" reply instead of refusing to start.

use std::env;
use tracing::warn;

const DEFAULT_PUBLIC_BASE_URL: &str = "https://farrier-pro.vercel.app";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Base URL this service is reachable at (used for Twilio SMS callbacks)
    pub public_base_url: String,

    /// HTTP request timeout for outbound vendor calls, in milliseconds
    pub request_timeout_ms: u64,

    // =========================================================================
    // Firebase
    // =========================================================================

    /// Firestore project id
    pub firebase_project_id: String,

    /// Web API key used for Firestore REST calls
    pub firebase_api_key: Option<String>,

    /// Web API key used for Identity Toolkit calls
    pub firebase_web_api_key: Option<String>,

    pub firestore_base_url: String,

    pub identity_base_url: String,

    // =========================================================================
    // Twilio
    // =========================================================================

    pub twilio_account_sid: Option<String>,

    pub twilio_auth_token: Option<String>,

    pub twilio_messaging_service_sid: Option<String>,

    /// Full public URL Twilio posts inbound SMS to; enables signature checks
    pub twilio_webhook_url: Option<String>,

    pub twilio_base_url: String,

    /// Messaging Services API root (numbers are attached to the sender pool there)
    pub twilio_messaging_base_url: String,

    /// Area code searched first when provisioning a number
    pub twilio_default_area_code: String,

    // =========================================================================
    // Authorize.Net
    // =========================================================================

    /// Credentials for one-off charges and refunds
    pub authorize_net_login_id: Option<String>,

    pub authorize_net_transaction_key: Option<String>,

    pub authorize_net_sandbox: bool,

    /// Credentials for recurring subscriptions
    pub authnet_login_id: Option<String>,

    pub authnet_transaction_key: Option<String>,

    /// `sandbox` or `production`
    pub authnet_env: String,

    /// Days of free trial before the first subscription charge
    pub trial_days: i64,

    // =========================================================================
    // Resend
    // =========================================================================

    pub resend_api_key: Option<String>,

    pub resend_base_url: String,

    // =========================================================================
    // Google OAuth
    // =========================================================================

    pub google_client_id: Option<String>,

    pub google_client_secret: Option<String>,

    pub google_redirect_uri: Option<String>,

    pub google_token_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            public_base_url: public_base_url(),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),

            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .unwrap_or_else(|_| "farrier-pro".to_string()),

            firebase_api_key: secret("FIREBASE_API_KEY"),

            firebase_web_api_key: secret("FIREBASE_WEB_API_KEY"),

            firestore_base_url: env::var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|_| "https://firestore.googleapis.com/v1".to_string()),

            identity_base_url: env::var("IDENTITY_TOOLKIT_BASE_URL")
                .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com/v1".to_string()),

            twilio_account_sid: secret("TWILIO_ACCOUNT_SID"),

            twilio_auth_token: secret("TWILIO_AUTH_TOKEN"),

            twilio_messaging_service_sid: secret("TWILIO_MESSAGING_SERVICE_SID"),

            twilio_webhook_url: secret("TWILIO_WEBHOOK_URL"),

            twilio_base_url: env::var("TWILIO_BASE_URL")
                .unwrap_or_else(|_| "https://api.twilio.com/2010-04-01".to_string()),

            twilio_messaging_base_url: env::var("TWILIO_MESSAGING_BASE_URL")
                .unwrap_or_else(|_| "https://messaging.twilio.com/v1".to_string()),

            twilio_default_area_code: env::var("TWILIO_DEFAULT_AREA_CODE")
                .unwrap_or_else(|_| "561".to_string()),

            authorize_net_login_id: secret("AUTHORIZENET_API_LOGIN_ID"),

            authorize_net_transaction_key: secret("AUTHORIZENET_TRANSACTION_KEY"),

            authorize_net_sandbox: parse_flag("AUTHORIZENET_SANDBOX"),

            authnet_login_id: secret("AUTHNET_API_LOGIN_ID"),

            authnet_transaction_key: secret("AUTHNET_TRANSACTION_KEY"),

            authnet_env: env::var("AUTHNET_ENV")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|_| "sandbox".to_string()),

            trial_days: parse_trial_days(),

            resend_api_key: secret("RESEND_API_KEY"),

            resend_base_url: env::var("RESEND_BASE_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),

            google_client_id: secret("GOOGLE_CLIENT_ID"),

            google_client_secret: secret("GOOGLE_CLIENT_SECRET"),

            google_redirect_uri: secret("GOOGLE_REDIRECT_URI"),

            google_token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
        }
    }
}

/// Read an optional secret, treating blank values as unset.
fn secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `true` only for the literal string "true" (case-insensitive).
fn parse_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parse_trial_days() -> i64 {
    let raw = match env::var("TRIAL_DAYS") {
        Ok(v) => v,
        Err(_) => return 14,
    };

    match raw.trim().parse::<i64>() {
        Ok(days) if days >= 0 => days,
        _ => {
            warn!(env_var = "TRIAL_DAYS", value = %raw, "Invalid trial days, using default");
            14
        }
    }
}

/// Resolve the public base URL: explicit setting, then the Vercel host, then the default.
fn public_base_url() -> String {
    if let Some(url) = secret("PUBLIC_BASE_URL") {
        return url.trim_end_matches('/').to_string();
    }

    match secret("VERCEL_URL") {
        Some(host) => format!("https://{}", host.trim_end_matches('/')),
        None => DEFAULT_PUBLIC_BASE_URL.to_string(),
    }
}
