//! FarriTech - serverless API for a farrier scheduling product.
//!
//! This library backs the `farritech-api` binary, a single web server that
//! hosts every endpoint:
//! - Twilio inbound SMS replies (STOP/START/CONFIRM/HELP) against Firestore
//! - Outbound SMS and phone number provisioning
//! - Authorize.Net charges, refunds and recurring subscriptions
//! - Transactional email through Resend
//! - Firebase account lookups and Google Calendar OAuth
//!
//! ## Architecture
//!
//! ```text
//! HTTP → web (handlers) → sms / payments / email / schedule → vendor clients
//! ```

pub mod calendar;
pub mod config;
pub mod email;
pub mod error;
pub mod identity;
pub mod payments;
pub mod schedule;
pub mod sms;
pub mod store;
pub mod twilio;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::ClientError;
pub use sms::{process_reply, Reply};
pub use store::{Document, DocumentStore, FirestoreClient};
pub use web::{router, AppState};
