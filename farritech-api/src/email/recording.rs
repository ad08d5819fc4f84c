//! Recording sender for tests.

use std::sync::Mutex;

use futures::future::{self, BoxFuture, FutureExt};
use reqwest::StatusCode;

use super::{EmailSender, OutgoingEmail, SentEmail};
use crate::error::{ClientError, Result};

/// Records every message; rejects those addressed to `fail_for`.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_for: Vec<String>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl EmailSender for RecordingSender {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<SentEmail>> {
        let result = if email.to.iter().any(|to| self.fail_for.contains(to)) {
            Err(ClientError::rejected(
                "resend",
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid `to` field",
            ))
        } else {
            self.sent.lock().unwrap().push(email.clone());
            Ok(SentEmail {
                id: Some(format!("email-{}", self.sent.lock().unwrap().len())),
            })
        };

        future::ready(result).boxed()
    }
}
