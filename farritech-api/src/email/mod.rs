//! Transactional email: Resend delivery and HTML templates.
//!
//! Handlers render a template into an [`OutgoingEmail`] and hand it to an
//! [`EmailSender`]. Production uses [`ResendClient`]; tests record sends.

#[cfg(test)]
pub mod recording;
pub mod resend;
pub mod templates;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use resend::ResendClient;

/// Sender for transactional mail.
pub const FARRITECH_FROM: &str = "FarriTech <welcome@contact.dasdigitalai.com>";

/// Sender used by the legacy signup welcome message.
pub const LEGACY_FROM: &str = "Farrier Pro <support@farrier-pro.com>";

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl OutgoingEmail {
    pub fn new(from: &str, to: &str, subject: String, html: String) -> Self {
        Self {
            from: from.to_string(),
            to: vec![to.to_string()],
            subject,
            html,
            reply_to: None,
        }
    }

    pub fn reply_to(mut self, reply_to: Option<&str>) -> Self {
        self.reply_to = reply_to.filter(|r| !r.is_empty()).map(str::to_string);
        self
    }
}

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentEmail {
    #[serde(default)]
    pub id: Option<String>,
}

/// Delivers rendered messages.
pub trait EmailSender: Send + Sync {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<SentEmail>>;
}
