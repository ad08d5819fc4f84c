//! Authorize.Net gateway client for charges, refunds and ARB subscriptions.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::subscription::NewSubscription;
use super::wire::{
    ArbCreateSubscriptionEnvelope, ArbCreateSubscriptionRequest, BillTo, CreateTransactionEnvelope,
    CreateTransactionRequest, CreditCard, Customer, GatewayResponse, Interval,
    MerchantAuthentication, Order, Payment, PaymentSchedule, Setting, Subscription,
    TransactionRequest, TransactionSettings,
};
use crate::error::{rejection_from, Result};

pub const PRODUCTION_ENDPOINT: &str = "https://api.authorize.net/xml/v1/request.api";
/// Production host used for recurring billing.
pub const ARB_PRODUCTION_ENDPOINT: &str = "https://api2.authorize.net/xml/v1/request.api";
pub const SANDBOX_ENDPOINT: &str = "https://apitest.authorize.net/xml/v1/request.api";

/// Card details for a one-off charge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub card_number: String,
    /// `MMYY`
    pub expiration_date: String,
    pub card_code: Option<String>,
    pub amount: f64,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    pub invoice_number: Option<serde_json::Value>,
    pub description: Option<String>,
}

/// Refund of a settled transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub transaction_id: String,
    pub amount: f64,
    /// Last four digits of the original card
    pub card_number: String,
}

/// Outcome of a charge or refund.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    Approved {
        transaction_id: Option<String>,
        auth_code: Option<String>,
        account_number: Option<String>,
        account_type: Option<String>,
    },
    /// The API accepted the request but the processor declined it.
    Declined {
        message: String,
        response_code: Option<String>,
    },
    /// The API itself refused the request.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionOutcome {
    Created { subscription_id: Option<String> },
    Failed { message: String },
}

/// Authorize.Net client bound to one set of merchant credentials and an endpoint.
#[derive(Clone)]
pub struct AuthorizeNetClient {
    client: Client,
    endpoint: String,
    credentials: MerchantAuthentication,
}

impl AuthorizeNetClient {
    pub fn new(client: Client, endpoint: &str, login_id: &str, transaction_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            credentials: MerchantAuthentication {
                name: login_id.to_string(),
                transaction_key: transaction_key.to_string(),
            },
        }
    }

    /// Endpoint for charges and refunds.
    pub fn transaction_endpoint(sandbox: bool) -> &'static str {
        if sandbox {
            SANDBOX_ENDPOINT
        } else {
            PRODUCTION_ENDPOINT
        }
    }

    /// Endpoint for subscriptions; only the literal `production` leaves the sandbox.
    pub fn subscription_endpoint(env: &str) -> &'static str {
        if env.eq_ignore_ascii_case("production") {
            ARB_PRODUCTION_ENDPOINT
        } else {
            SANDBOX_ENDPOINT
        }
    }

    pub async fn charge(&self, charge: &ChargeRequest) -> Result<TransactionOutcome> {
        let request = build_charge(charge);
        let response = self.post(&self.transaction_envelope(request)).await?;
        let outcome = transaction_outcome(response, "Payment declined", "Payment processing failed");

        log_transaction("charge", &outcome);
        Ok(outcome)
    }

    pub async fn refund(&self, refund: &RefundRequest) -> Result<TransactionOutcome> {
        let request = build_refund(refund);
        let response = self.post(&self.transaction_envelope(request)).await?;
        let outcome = transaction_outcome(response, "Refund failed", "Refund processing failed");

        log_transaction("refund", &outcome);
        Ok(outcome)
    }

    pub async fn create_subscription(&self, subscription: &NewSubscription) -> Result<SubscriptionOutcome> {
        let envelope = ArbCreateSubscriptionEnvelope {
            request: ArbCreateSubscriptionRequest {
                merchant_authentication: self.credentials.clone(),
                subscription: build_subscription(subscription),
            },
        };

        let response = self.post(&envelope).await?;

        if !response.is_ok() {
            let joined = response.joined_messages();
            let message = if joined.is_empty() {
                "Authorize.Net returned NOT OK".to_string()
            } else {
                joined
            };
            warn!(
                customer_id = %subscription.customer_id,
                message = %message,
                "subscription_create_rejected"
            );
            return Ok(SubscriptionOutcome::Failed { message });
        }

        info!(
            customer_id = %subscription.customer_id,
            subscription_id = ?response.subscription_id,
            start_date = %subscription.start_date,
            "subscription_created"
        );

        Ok(SubscriptionOutcome::Created {
            subscription_id: response.subscription_id,
        })
    }

    fn transaction_envelope(&self, transaction_request: TransactionRequest) -> CreateTransactionEnvelope {
        CreateTransactionEnvelope {
            request: CreateTransactionRequest {
                merchant_authentication: self.credentials.clone(),
                transaction_request,
            },
        }
    }

    async fn post<T: Serialize>(&self, body: &T) -> Result<GatewayResponse> {
        let response = self.client.post(&self.endpoint).json(body).send().await?;

        if !response.status().is_success() {
            let err = rejection_from("authorize.net", response).await;
            error!(error = %err, "authorize_net_request_failed");
            return Err(err);
        }

        let text = response.text().await?;
        decode_response(&text)
    }
}

/// The gateway prefixes its JSON with a UTF-8 byte-order mark.
pub(crate) fn decode_response(text: &str) -> Result<GatewayResponse> {
    let trimmed = text.trim_start_matches('\u{feff}');
    Ok(serde_json::from_str(trimmed)?)
}

fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

/// First word is the first name; the rest (or `Customer`) is the last name.
fn split_name(full: &str) -> (String, String) {
    let trimmed = full.trim();
    match trimmed.split_once(' ') {
        Some((first, rest)) if !rest.trim().is_empty() => (first.to_string(), rest.trim().to_string()),
        Some((first, _)) => (first.to_string(), "Customer".to_string()),
        None => (trimmed.to_string(), "Customer".to_string()),
    }
}

fn invoice_label(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn build_charge(charge: &ChargeRequest) -> TransactionRequest {
    let (first_name, last_name) = split_name(&charge.customer_name);
    let invoice_number = charge.invoice_number.as_ref().and_then(invoice_label);
    let description = match charge.description.as_deref() {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => format!(
            "Farrier Pro Invoice #{}",
            invoice_number.as_deref().unwrap_or_default()
        ),
    };
    let email = charge.customer_email.clone().filter(|e| !e.is_empty());

    TransactionRequest {
        transaction_type: "authCaptureTransaction",
        amount: format_amount(charge.amount),
        payment: Payment {
            credit_card: Some(CreditCard {
                card_number: charge.card_number.clone(),
                expiration_date: charge.expiration_date.clone(),
                card_code: charge.card_code.clone().filter(|c| !c.is_empty()),
            }),
            opaque_data: None,
        },
        ref_trans_id: None,
        order: Some(Order {
            invoice_number,
            description,
        }),
        customer: email.clone().map(|email| Customer {
            id: None,
            email: Some(email),
        }),
        bill_to: Some(BillTo {
            first_name,
            last_name,
            email,
            ..Default::default()
        }),
        transaction_settings: Some(TransactionSettings {
            setting: vec![Setting {
                setting_name: "emailCustomer",
                setting_value: "true",
            }],
        }),
    }
}

pub(crate) fn build_refund(refund: &RefundRequest) -> TransactionRequest {
    TransactionRequest {
        transaction_type: "refundTransaction",
        amount: format_amount(refund.amount),
        payment: Payment {
            credit_card: Some(CreditCard {
                card_number: refund.card_number.clone(),
                expiration_date: "XXXX".to_string(),
                card_code: None,
            }),
            opaque_data: None,
        },
        ref_trans_id: Some(refund.transaction_id.clone()),
        order: None,
        customer: None,
        bill_to: None,
        transaction_settings: None,
    }
}

pub(crate) fn build_subscription(sub: &NewSubscription) -> Subscription {
    Subscription {
        name: format!("{} Subscription", sub.plan_name),
        payment_schedule: PaymentSchedule {
            interval: Interval {
                length: sub.interval_months.to_string(),
                unit: "months",
            },
            start_date: sub.start_date.clone(),
            total_occurrences: "9999".to_string(),
            trial_occurrences: "1".to_string(),
        },
        amount: format_amount(sub.amount),
        trial_amount: format_amount(0.0),
        payment: Payment {
            credit_card: None,
            opaque_data: Some(sub.opaque_data.clone()),
        },
        customer: Customer {
            id: Some(sub.customer_id.clone()),
            email: sub.email.clone(),
        },
        bill_to: sub.bill_to.clone(),
    }
}

fn transaction_outcome(response: GatewayResponse, declined: &str, failed: &str) -> TransactionOutcome {
    if !response.is_ok() {
        return TransactionOutcome::Failed {
            message: response.first_message().unwrap_or(failed).to_string(),
        };
    }

    let transaction = response.transaction_response.unwrap_or_default();
    if !transaction.is_approved() {
        return TransactionOutcome::Declined {
            message: transaction.first_error().unwrap_or(declined).to_string(),
            response_code: transaction.response_code,
        };
    }

    TransactionOutcome::Approved {
        transaction_id: transaction.trans_id,
        auth_code: transaction.auth_code,
        account_number: transaction.account_number,
        account_type: transaction.account_type,
    }
}

fn log_transaction(kind: &'static str, outcome: &TransactionOutcome) {
    match outcome {
        TransactionOutcome::Approved { transaction_id, .. } => {
            info!(kind = kind, transaction_id = ?transaction_id, "transaction_approved");
        }
        TransactionOutcome::Declined {
            message,
            response_code,
        } => {
            warn!(kind = kind, response_code = ?response_code, message = %message, "transaction_declined");
        }
        TransactionOutcome::Failed { message } => {
            warn!(kind = kind, message = %message, "transaction_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::wire::OpaqueData;

    fn charge() -> ChargeRequest {
        ChargeRequest {
            card_number: "4111111111111111".to_string(),
            expiration_date: "1228".to_string(),
            card_code: Some("123".to_string()),
            amount: 85.5,
            customer_email: Some("jane@example.com".to_string()),
            customer_name: "Jane Q Doe".to_string(),
            invoice_number: Some(serde_json::json!(1042)),
            description: None,
        }
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("Jane Q Doe"), ("Jane".to_string(), "Q Doe".to_string()));
        assert_eq!(split_name("Cher"), ("Cher".to_string(), "Customer".to_string()));
        assert_eq!(split_name(""), ("".to_string(), "Customer".to_string()));
    }

    #[test]
    fn test_build_charge() {
        let request = build_charge(&charge());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["transactionType"], "authCaptureTransaction");
        assert_eq!(json["amount"], "85.50");
        assert_eq!(json["order"]["invoiceNumber"], "1042");
        assert_eq!(json["order"]["description"], "Farrier Pro Invoice #1042");
        assert_eq!(json["billTo"]["firstName"], "Jane");
        assert_eq!(json["billTo"]["lastName"], "Q Doe");
        assert_eq!(json["billTo"]["email"], "jane@example.com");
        assert_eq!(json["customer"]["email"], "jane@example.com");
        assert_eq!(json["transactionSettings"]["setting"][0]["settingName"], "emailCustomer");
    }

    #[test]
    fn test_build_refund() {
        let request = build_refund(&RefundRequest {
            transaction_id: "60012345".to_string(),
            amount: 20.0,
            card_number: "1111".to_string(),
        });
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains(r#""transactionType":"refundTransaction""#));
        assert!(json.contains(r#""amount":"20.00""#));
        assert!(json.contains(r#""expirationDate":"XXXX""#));
        assert!(json.contains(r#""refTransId":"60012345""#));
        assert!(json.find("payment").unwrap() < json.find("refTransId").unwrap());
    }

    #[test]
    fn test_build_subscription() {
        let sub = NewSubscription {
            customer_id: "lead-7".to_string(),
            plan_name: "Pro".to_string(),
            amount: 49.0,
            interval_months: 12,
            start_date: "2026-03-15".to_string(),
            opaque_data: OpaqueData {
                data_descriptor: "COMMON.ACCEPT.INAPP.PAYMENT".to_string(),
                data_value: "nonce".to_string(),
            },
            email: None,
            bill_to: BillTo {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                ..Default::default()
            },
        };

        let json = serde_json::to_value(build_subscription(&sub)).unwrap();

        assert_eq!(json["name"], "Pro Subscription");
        assert_eq!(json["paymentSchedule"]["interval"]["length"], "12");
        assert_eq!(json["paymentSchedule"]["interval"]["unit"], "months");
        assert_eq!(json["paymentSchedule"]["totalOccurrences"], "9999");
        assert_eq!(json["paymentSchedule"]["trialOccurrences"], "1");
        assert_eq!(json["amount"], "49.00");
        assert_eq!(json["trialAmount"], "0.00");
        assert_eq!(json["customer"]["id"], "lead-7");
        assert!(json["billTo"].get("email").is_none());
    }

    #[test]
    fn test_decode_response_strips_bom() {
        let raw = "\u{feff}{\"messages\":{\"resultCode\":\"Ok\",\"message\":[]},\"subscriptionId\":\"900\"}";
        let response = decode_response(raw).unwrap();

        assert!(response.is_ok());
        assert_eq!(response.subscription_id.as_deref(), Some("900"));
    }

    #[test]
    fn test_transaction_outcome_approved() {
        let response = decode_response(
            r#"{"transactionResponse":{"responseCode":"1","authCode":"ABC123","transId":"60001","accountNumber":"XXXX1111","accountType":"Visa"},
                "messages":{"resultCode":"Ok","message":[{"code":"I00001","text":"Successful."}]}}"#,
        )
        .unwrap();

        assert_eq!(
            transaction_outcome(response, "declined", "failed"),
            TransactionOutcome::Approved {
                transaction_id: Some("60001".to_string()),
                auth_code: Some("ABC123".to_string()),
                account_number: Some("XXXX1111".to_string()),
                account_type: Some("Visa".to_string()),
            }
        );
    }

    #[test]
    fn test_transaction_outcome_fallback_messages() {
        let declined = decode_response(r#"{"transactionResponse":{"responseCode":"3"},"messages":{"resultCode":"Ok"}}"#)
            .unwrap();
        assert_eq!(
            transaction_outcome(declined, "Payment declined", "failed"),
            TransactionOutcome::Declined {
                message: "Payment declined".to_string(),
                response_code: Some("3".to_string()),
            }
        );

        let failed = decode_response(r#"{"messages":{"resultCode":"Error"}}"#).unwrap();
        assert_eq!(
            transaction_outcome(failed, "declined", "Payment processing failed"),
            TransactionOutcome::Failed {
                message: "Payment processing failed".to_string()
            }
        );
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(AuthorizeNetClient::transaction_endpoint(true), SANDBOX_ENDPOINT);
        assert_eq!(AuthorizeNetClient::transaction_endpoint(false), PRODUCTION_ENDPOINT);
        assert_eq!(AuthorizeNetClient::subscription_endpoint("production"), ARB_PRODUCTION_ENDPOINT);
        assert_eq!(AuthorizeNetClient::subscription_endpoint("sandbox"), SANDBOX_ENDPOINT);
        assert_eq!(AuthorizeNetClient::subscription_endpoint("staging"), SANDBOX_ENDPOINT);
    }
}
