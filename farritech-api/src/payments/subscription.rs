//! Validation of incoming subscription requests.

use serde::Deserialize;
use serde_json::Value as Json;
use time::Date;

use super::wire::{BillTo, OpaqueData};
use crate::util::dates::{add_days, format_date};

pub const MISSING_FIELDS: &str =
    "Missing required fields: leadId, planName, amount, billingCycle, billingInfo";
pub const INVALID_AMOUNT: &str = "Invalid amount. Must be a positive number.";
pub const MISSING_PAYMENT: &str = "Missing payment data. Provide paymentNonce or opaqueData.";

const ACCEPT_INAPP_DESCRIPTOR: &str = "COMMON.ACCEPT.INAPP.PAYMENT";

/// Raw request body. Loosely typed: clients send ids and amounts as either
/// strings or numbers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub lead_id: Json,
    #[serde(default)]
    pub account_data: Json,
    #[serde(default)]
    pub billing_info: Json,
    #[serde(default)]
    pub plan_name: Json,
    #[serde(default)]
    pub amount: Json,
    #[serde(default)]
    pub billing_cycle: Json,
    #[serde(default)]
    pub payment_nonce: Json,
    #[serde(default)]
    pub opaque_data: Json,
}

/// A validated subscription ready to send to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub customer_id: String,
    pub plan_name: String,
    pub amount: f64,
    pub interval_months: u8,
    /// `YYYY-MM-DD`, first billed day after the trial
    pub start_date: String,
    pub opaque_data: OpaqueData,
    pub email: Option<String>,
    pub bill_to: BillTo,
}

impl SubscriptionRequest {
    /// Validate the request, returning the caller-facing message on failure.
    pub fn validate(&self, today: Date, trial_days: i64) -> Result<NewSubscription, &'static str> {
        let (customer_id, plan_name, billing_cycle) = match (
            present(&self.lead_id),
            present(&self.plan_name),
            present(&self.billing_cycle),
        ) {
            (Some(lead), Some(plan), Some(cycle))
                if present(&self.amount).is_some() && is_truthy(&self.billing_info) =>
            {
                (lead, plan, cycle)
            }
            _ => return Err(MISSING_FIELDS),
        };

        let amount = match parse_amount(&self.amount) {
            Some(a) if a.is_finite() && a > 0.0 => a,
            _ => return Err(INVALID_AMOUNT),
        };

        let opaque_data = self.opaque_data().ok_or(MISSING_PAYMENT)?;

        let info = &self.billing_info;
        let field = |name: &str| present(&info[name]);

        let email = present(&self.account_data["email"]).or_else(|| field("email"));

        Ok(NewSubscription {
            customer_id,
            plan_name,
            amount,
            interval_months: if billing_cycle == "yearly" { 12 } else { 1 },
            start_date: format_date(add_days(today, trial_days)),
            opaque_data,
            email,
            bill_to: BillTo {
                first_name: field("firstName").unwrap_or_default(),
                last_name: field("lastName").unwrap_or_default(),
                address: field("address"),
                city: field("city"),
                state: field("state"),
                zip: field("zip"),
                email: None,
            },
        })
    }

    /// Explicit opaque data wins; a bare nonce is wrapped as Accept in-app data.
    fn opaque_data(&self) -> Option<OpaqueData> {
        let descriptor = present(&self.opaque_data["dataDescriptor"]);
        let value = present(&self.opaque_data["dataValue"]);
        if let (Some(data_descriptor), Some(data_value)) = (descriptor, value) {
            return Some(OpaqueData {
                data_descriptor,
                data_value,
            });
        }

        let nonce = self.payment_nonce.as_str()?.trim();
        if nonce.is_empty() {
            return None;
        }

        Some(OpaqueData {
            data_descriptor: ACCEPT_INAPP_DESCRIPTOR.to_string(),
            data_value: nonce.to_string(),
        })
    }
}

/// A non-empty string or non-zero number, rendered as text.
fn present(value: &Json) -> Option<String> {
    match value {
        Json::String(s) if !s.is_empty() => Some(s.clone()),
        Json::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Json::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Object(_) | Json::Array(_) => true,
        other => present(other).is_some(),
    }
}

fn parse_amount(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
