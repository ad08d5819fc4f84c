//! Shared application state.

use std::sync::Arc;

use reqwest::Client;

use crate::calendar::GoogleOAuthClient;
use crate::email::{EmailSender, ResendClient};
use crate::identity::IdentityClient;
use crate::payments::AuthorizeNetClient;
use crate::store::{DocumentStore, FirestoreClient};
use crate::twilio::TwilioClient;
use crate::Config;

/// Shared application state.
///
/// Each collaborator is `None` when its credentials are not configured.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Option<Arc<dyn DocumentStore>>,
    pub twilio: Option<TwilioClient>,
    pub identity: Option<IdentityClient>,
    /// Charges and refunds
    pub payments: Option<AuthorizeNetClient>,
    /// Recurring billing, on its own merchant credentials
    pub subscriptions: Option<AuthorizeNetClient>,
    pub mailer: Option<Arc<dyn EmailSender>>,
    pub google: Option<GoogleOAuthClient>,
}

impl AppState {
    /// State with no collaborators; handlers report themselves unconfigured.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            store: None,
            twilio: None,
            identity: None,
            payments: None,
            subscriptions: None,
            mailer: None,
            google: None,
        }
    }

    /// Build every collaborator whose credentials are present.
    pub fn from_config(config: Config, client: Client) -> Self {
        let store = config.firebase_api_key.as_deref().map(|key| {
            Arc::new(FirestoreClient::new(
                client.clone(),
                &config.firestore_base_url,
                &config.firebase_project_id,
                key,
            )) as Arc<dyn DocumentStore>
        });

        let twilio = match (
            &config.twilio_account_sid,
            &config.twilio_auth_token,
            &config.twilio_messaging_service_sid,
        ) {
            (Some(sid), Some(token), Some(service)) => Some(TwilioClient::new(
                client.clone(),
                &config.twilio_base_url,
                &config.twilio_messaging_base_url,
                sid,
                token,
                service,
            )),
            _ => None,
        };

        let identity = config
            .firebase_web_api_key
            .as_deref()
            .map(|key| IdentityClient::new(client.clone(), &config.identity_base_url, key));

        let payments = match (&config.authorize_net_login_id, &config.authorize_net_transaction_key) {
            (Some(login), Some(key)) => Some(AuthorizeNetClient::new(
                client.clone(),
                AuthorizeNetClient::transaction_endpoint(config.authorize_net_sandbox),
                login,
                key,
            )),
            _ => None,
        };

        let subscriptions = match (&config.authnet_login_id, &config.authnet_transaction_key) {
            (Some(login), Some(key)) => Some(AuthorizeNetClient::new(
                client.clone(),
                AuthorizeNetClient::subscription_endpoint(&config.authnet_env),
                login,
                key,
            )),
            _ => None,
        };

        let mailer = config.resend_api_key.as_deref().map(|key| {
            Arc::new(ResendClient::new(client.clone(), &config.resend_base_url, key))
                as Arc<dyn EmailSender>
        });

        let google = match (&config.google_client_id, &config.google_client_secret) {
            (Some(id), Some(secret)) => Some(GoogleOAuthClient::new(
                client.clone(),
                &config.google_token_url,
                id,
                secret,
                config.google_redirect_uri.as_deref(),
            )),
            _ => None,
        };

        Self {
            config: Arc::new(config),
            store,
            twilio,
            identity,
            payments,
            subscriptions,
            mailer,
            google,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn EmailSender>) -> Self {
        self.mailer = Some(mailer);
        self
    }
}
