//! Authorize.Net JSON wire types.
//!
//! The gateway validates JSON against its XML schema, so element order
//! matters. Every request type is a struct whose field order follows the
//! schema; never build these bodies with `json!`, which sorts keys.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantAuthentication {
    pub name: String,
    pub transaction_key: String,
}

// =============================================================================
// createTransactionRequest
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CreateTransactionEnvelope {
    #[serde(rename = "createTransactionRequest")]
    pub request: CreateTransactionRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub merchant_authentication: MerchantAuthentication,
    pub transaction_request: TransactionRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub transaction_type: &'static str,
    pub amount: String,
    pub payment: Payment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_to: Option<BillTo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_settings: Option<TransactionSettings>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card: Option<CreditCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opaque_data: Option<OpaqueData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub card_number: String,
    /// `MMYY`, or `XXXX` for refunds
    pub expiration_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueData {
    pub data_descriptor: String,
    pub data_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Bill-to address. `email` exists only on transaction bill-to blocks;
/// subscriptions must leave it `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillTo {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionSettings {
    pub setting: Vec<Setting>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub setting_name: &'static str,
    pub setting_value: &'static str,
}

// =============================================================================
// ARBCreateSubscriptionRequest
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ArbCreateSubscriptionEnvelope {
    #[serde(rename = "ARBCreateSubscriptionRequest")]
    pub request: ArbCreateSubscriptionRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbCreateSubscriptionRequest {
    pub merchant_authentication: MerchantAuthentication,
    pub subscription: Subscription,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub name: String,
    pub payment_schedule: PaymentSchedule,
    pub amount: String,
    pub trial_amount: String,
    pub payment: Payment,
    pub customer: Customer,
    pub bill_to: BillTo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSchedule {
    pub interval: Interval,
    pub start_date: String,
    pub total_occurrences: String,
    pub trial_occurrences: String,
}

#[derive(Debug, Serialize)]
pub struct Interval {
    pub length: String,
    pub unit: &'static str,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub messages: Option<Messages>,
    pub transaction_response: Option<TransactionResponse>,
    pub subscription_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
    #[serde(default)]
    pub result_code: String,
    pub message: Option<Vec<MessageItem>>,
}

#[derive(Debug, Deserialize)]
pub struct MessageItem {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub response_code: Option<String>,
    pub auth_code: Option<String>,
    pub trans_id: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<String>,
    pub errors: Option<Vec<TransactionError>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionError {
    pub error_code: Option<String>,
    pub error_text: Option<String>,
}

impl GatewayResponse {
    pub fn is_ok(&self) -> bool {
        self.messages
            .as_ref()
            .is_some_and(|m| m.result_code.eq_ignore_ascii_case("Ok"))
    }

    /// Text of the first top-level message.
    pub fn first_message(&self) -> Option<&str> {
        self.messages
            .as_ref()?
            .message
            .as_ref()?
            .first()
            .map(|m| m.text.as_str())
            .filter(|t| !t.is_empty())
    }

    /// All top-level messages as `code: text`, joined with ` | `.
    pub fn joined_messages(&self) -> String {
        self.messages
            .as_ref()
            .and_then(|m| m.message.as_ref())
            .map(|items| {
                items
                    .iter()
                    .map(|m| format!("{}: {}", m.code, m.text))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .unwrap_or_default()
    }
}

impl TransactionResponse {
    pub fn is_approved(&self) -> bool {
        self.response_code.as_deref() == Some("1")
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .as_ref()?
            .first()?
            .error_text
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_request_field_order() {
        let request = TransactionRequest {
            transaction_type: "authCaptureTransaction",
            amount: "125.00".to_string(),
            payment: Payment {
                credit_card: Some(CreditCard {
                    card_number: "4111111111111111".to_string(),
                    expiration_date: "1228".to_string(),
                    card_code: Some("123".to_string()),
                }),
                opaque_data: None,
            },
            ref_trans_id: None,
            order: Some(Order {
                invoice_number: Some("1001".to_string()),
                description: "Trim".to_string(),
            }),
            customer: Some(Customer {
                id: None,
                email: Some("jane@example.com".to_string()),
            }),
            bill_to: Some(BillTo {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                ..Default::default()
            }),
            transaction_settings: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        let pos = |key: &str| json.find(&format!("\"{key}\"")).unwrap();

        assert!(pos("transactionType") < pos("amount"));
        assert!(pos("amount") < pos("payment"));
        assert!(pos("payment") < pos("order"));
        assert!(pos("order") < pos("customer"));
        assert!(pos("customer") < pos("billTo"));
        assert!(!json.contains("refTransId"));
        assert!(!json.contains("opaqueData"));
    }

    #[test]
    fn test_gateway_response_declined() {
        let raw = r#"{
            "transactionResponse": {
                "responseCode": "2",
                "transId": "0",
                "errors": [{ "errorCode": "2", "errorText": "This transaction has been declined." }]
            },
            "messages": { "resultCode": "Ok", "message": [{ "code": "I00001", "text": "Successful." }] }
        }"#;

        let response: GatewayResponse = serde_json::from_str(raw).unwrap();
        let transaction = response.transaction_response.as_ref().unwrap();

        assert!(response.is_ok());
        assert!(!transaction.is_approved());
        assert_eq!(transaction.first_error(), Some("This transaction has been declined."));
    }

    #[test]
    fn test_gateway_response_error_messages() {
        let raw = r#"{
            "messages": {
                "resultCode": "Error",
                "message": [
                    { "code": "E00007", "text": "User authentication failed due to invalid authentication values." },
                    { "code": "E00001", "text": "An error occurred during processing." }
                ]
            }
        }"#;

        let response: GatewayResponse = serde_json::from_str(raw).unwrap();

        assert!(!response.is_ok());
        assert_eq!(
            response.first_message(),
            Some("User authentication failed due to invalid authentication values.")
        );
        assert!(response
            .joined_messages()
            .starts_with("E00007: User authentication failed"));
        assert!(response.joined_messages().contains(" | E00001: "));
    }
}
