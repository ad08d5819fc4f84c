//! Resend REST client.

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use tracing::{error, info};

use super::{EmailSender, OutgoingEmail, SentEmail};
use crate::error::{rejection_from, Result};

#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn deliver(&self, email: &OutgoingEmail) -> Result<SentEmail> {
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = rejection_from("resend", response).await;
            error!(subject = %email.subject, error = %err, "email_send_failed");
            return Err(err);
        }

        let sent: SentEmail = serde_json::from_str(&response.text().await?).unwrap_or_default();
        info!(subject = %email.subject, email_id = ?sent.id, "email_sent");

        Ok(sent)
    }
}

impl EmailSender for ResendClient {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<SentEmail>> {
        self.deliver(email).boxed()
    }
}
