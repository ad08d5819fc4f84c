//! Authorize.Net card payments and recurring subscriptions.

pub mod authorize_net;
pub mod subscription;
pub mod wire;

pub use authorize_net::{
    AuthorizeNetClient, ChargeRequest, RefundRequest, SubscriptionOutcome, TransactionOutcome,
};
pub use subscription::{NewSubscription, SubscriptionRequest};
