//! Twilio REST client for outbound SMS and number provisioning.

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::Result;

/// Twilio REST client bound to one account and messaging service.
#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    base_url: String,
    messaging_base_url: String,
    account_sid: String,
    auth_token: String,
    messaging_service_sid: String,
}

/// Result of an outbound SMS attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Sent { sid: String, status: Option<String> },
    /// Twilio answered with its error envelope.
    Rejected { code: Option<i64>, message: String },
}

/// Result of provisioning a dedicated number.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionOutcome {
    Provisioned { phone_number: String, sid: String },
    NoNumbersAvailable,
    Rejected { message: String },
}

/// Fields shared by Twilio resource and error bodies.
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    sid: Option<String>,
    status: Option<serde_json::Value>,
    phone_number: Option<String>,
    code: Option<i64>,
    error_code: Option<i64>,
    message: Option<String>,
}

impl Envelope {
    fn error_code(&self) -> Option<i64> {
        self.code.or(self.error_code)
    }
}

#[derive(Debug, Deserialize)]
struct AvailableNumbers {
    #[serde(default)]
    available_phone_numbers: Vec<AvailableNumber>,
}

#[derive(Debug, Deserialize)]
struct AvailableNumber {
    phone_number: String,
}

impl TwilioClient {
    pub fn new(
        client: Client,
        base_url: &str,
        messaging_base_url: &str,
        account_sid: &str,
        auth_token: &str,
        messaging_service_sid: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            messaging_base_url: messaging_base_url.trim_end_matches('/').to_string(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            messaging_service_sid: messaging_service_sid.to_string(),
        }
    }

    fn account_url(&self, path: &str) -> String {
        format!("{}/Accounts/{}/{}", self.base_url, self.account_sid, path)
    }

    /// Send `body` to an E.164 number through the messaging service.
    pub async fn send_sms(&self, to: &str, body: &str) -> Result<SendOutcome> {
        let response = self
            .client
            .post(self.account_url("Messages.json"))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("MessagingServiceSid", self.messaging_service_sid.as_str()),
                ("To", to),
                ("Body", body),
            ])
            .send()
            .await?;

        let ok = response.status().is_success();
        let envelope = read_envelope(response).await?;

        if !ok || envelope.error_code().is_some() || envelope.sid.is_none() {
            let message = envelope
                .message
                .clone()
                .unwrap_or_else(|| "Twilio rejected the message".to_string());
            warn!(code = ?envelope.error_code(), message = %message, "twilio_send_rejected");
            return Ok(SendOutcome::Rejected {
                code: envelope.error_code(),
                message,
            });
        }

        let sid = envelope.sid.unwrap_or_default();
        let status = envelope.status.as_ref().and_then(|s| s.as_str()).map(str::to_string);

        info!(message_sid = %sid, status = ?status, "twilio_send_accepted");

        Ok(SendOutcome::Sent { sid, status })
    }

    /// Buy a local number for a farrier and route its inbound SMS to `sms_url`.
    ///
    /// Numbers in `area_code` are preferred; any SMS-capable US local number
    /// is the fallback.
    pub async fn provision_number(
        &self,
        farrier_id: &str,
        area_code: &str,
        sms_url: &str,
    ) -> Result<ProvisionOutcome> {
        let phone_number = match self.search_available(Some(area_code)).await? {
            Some(number) => number,
            None => {
                info!(area_code = area_code, "twilio_area_code_exhausted");
                match self.search_available(None).await? {
                    Some(number) => number,
                    None => return Ok(ProvisionOutcome::NoNumbersAvailable),
                }
            }
        };

        let friendly_name = format!("FarriTech - {farrier_id}");
        let response = self
            .client
            .post(self.account_url("IncomingPhoneNumbers.json"))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("PhoneNumber", phone_number.as_str()),
                ("SmsUrl", sms_url),
                ("SmsMethod", "POST"),
                ("FriendlyName", friendly_name.as_str()),
            ])
            .send()
            .await?;

        let ok = response.status().is_success();
        let purchase = read_envelope(response).await?;

        let sid = match purchase.sid {
            Some(sid) if ok && purchase.error_code().is_none() => sid,
            _ => {
                let message = purchase
                    .message
                    .unwrap_or_else(|| "Twilio rejected the purchase".to_string());
                error!(farrier_id = farrier_id, message = %message, "twilio_purchase_rejected");
                return Ok(ProvisionOutcome::Rejected { message });
            }
        };

        // The number is already owned at this point; a failed attach only
        // leaves it outside the sender pool.
        if let Err(e) = self.attach_to_messaging_service(&sid).await {
            warn!(error = %e, phone_number_sid = %sid, "twilio_messaging_service_attach_failed");
        }

        info!(farrier_id = farrier_id, phone_number_sid = %sid, "twilio_number_provisioned");

        Ok(ProvisionOutcome::Provisioned {
            phone_number: purchase.phone_number.unwrap_or(phone_number),
            sid,
        })
    }

    async fn search_available(&self, area_code: Option<&str>) -> Result<Option<String>> {
        let mut params = vec![("SmsEnabled", "true")];
        if let Some(code) = area_code {
            params.push(("AreaCode", code));
            params.push(("MmsEnabled", "false"));
        }
        params.push(("Limit", "1"));

        let response = self
            .client
            .get(self.account_url("AvailablePhoneNumbers/US/Local.json"))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), area_code = ?area_code, "twilio_search_failed");
            return Ok(None);
        }

        let found: AvailableNumbers = serde_json::from_str(&response.text().await?)?;
        Ok(found
            .available_phone_numbers
            .into_iter()
            .next()
            .map(|n| n.phone_number))
    }

    async fn attach_to_messaging_service(&self, phone_number_sid: &str) -> Result<()> {
        let url = format!(
            "{}/Services/{}/PhoneNumbers",
            self.messaging_base_url, self.messaging_service_sid
        );

        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("PhoneNumberSid", phone_number_sid)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(crate::error::rejection_from("twilio", response).await);
        }

        Ok(())
    }
}

/// Decode a Twilio body leniently: an unparseable body becomes an empty envelope.
async fn read_envelope(response: Response) -> Result<Envelope> {
    let text = response.text().await?;
    Ok(parse_envelope(&text))
}

fn parse_envelope(text: &str) -> Envelope {
    serde_json::from_str(text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::util::stub::{Recorded, Stub};

    const SMS_URL: &str = "https://farrier-pro.vercel.app/api/twilio-webhook";

    fn stub_client(stub: &Stub) -> TwilioClient {
        TwilioClient::new(Client::new(), &stub.base_url, &stub.base_url, "AC1", "token", "MG1")
    }

    /// Twilio stand-in: `local` answers searches restricted to the area
    /// code, `national` answers the unrestricted search.
    fn twilio(
        local: &'static str,
        national: &'static str,
        attach: StatusCode,
    ) -> impl Fn(&Recorded) -> (StatusCode, String) + Clone + Send + Sync + 'static {
        move |req: &Recorded| {
            if req.path.ends_with("/AvailablePhoneNumbers/US/Local.json") {
                let number = if req.query.contains("AreaCode=") { local } else { national };
                let numbers = if number.is_empty() {
                    "[]".to_string()
                } else {
                    format!(r#"[{{"phone_number":"{number}"}}]"#)
                };
                (StatusCode::OK, format!(r#"{{"available_phone_numbers":{numbers}}}"#))
            } else if req.path.ends_with("/IncomingPhoneNumbers.json") {
                (StatusCode::CREATED, r#"{"sid":"PN1","phone_number":"+15615550100"}"#.to_string())
            } else if req.path.ends_with("/Services/MG1/PhoneNumbers") {
                let body = r#"{"code":21710,"message":"Phone Number is already in the Messaging Service"}"#;
                (attach, body.to_string())
            } else {
                (StatusCode::NOT_FOUND, "{}".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_provision_uses_area_code_first() {
        let stub = Stub::start(twilio("+15615550100", "+12125550100", StatusCode::CREATED)).await;

        let outcome = stub_client(&stub).provision_number("f1", "561", SMS_URL).await.unwrap();

        assert_eq!(
            outcome,
            ProvisionOutcome::Provisioned {
                phone_number: "+15615550100".to_string(),
                sid: "PN1".to_string()
            }
        );
        let searches = stub.hits("/Local.json");
        assert_eq!(searches.len(), 1);
        assert!(searches[0].query.contains("AreaCode=561"));
        assert!(searches[0].query.contains("MmsEnabled=false"));

        let purchase = &stub.hits("/IncomingPhoneNumbers.json")[0];
        assert!(purchase.body.contains("PhoneNumber=%2B15615550100"));
        assert!(purchase.body.contains("FriendlyName=FarriTech+-+f1"));
        assert!(purchase.body.contains("SmsMethod=POST"));
        assert_eq!(stub.hits("/Services/MG1/PhoneNumbers").len(), 1);
    }

    #[tokio::test]
    async fn test_provision_falls_back_to_any_us_number() {
        let stub = Stub::start(twilio("", "+12125550100", StatusCode::CREATED)).await;

        let outcome = stub_client(&stub).provision_number("f1", "561", SMS_URL).await.unwrap();

        assert!(matches!(outcome, ProvisionOutcome::Provisioned { .. }));
        let searches = stub.hits("/Local.json");
        assert_eq!(searches.len(), 2);
        assert!(!searches[1].query.contains("AreaCode"));
        let purchase = &stub.hits("/IncomingPhoneNumbers.json")[0];
        assert!(purchase.body.contains("PhoneNumber=%2B12125550100"));
    }

    #[tokio::test]
    async fn test_provision_no_numbers_buys_nothing() {
        let stub = Stub::start(twilio("", "", StatusCode::CREATED)).await;

        let outcome = stub_client(&stub).provision_number("f1", "561", SMS_URL).await.unwrap();

        assert_eq!(outcome, ProvisionOutcome::NoNumbersAvailable);
        assert!(stub.hits("/IncomingPhoneNumbers.json").is_empty());
    }

    #[tokio::test]
    async fn test_provision_survives_attach_failure() {
        let stub = Stub::start(twilio("+15615550100", "", StatusCode::BAD_REQUEST)).await;

        let outcome = stub_client(&stub).provision_number("f1", "561", SMS_URL).await.unwrap();

        assert_eq!(
            outcome,
            ProvisionOutcome::Provisioned {
                phone_number: "+15615550100".to_string(),
                sid: "PN1".to_string()
            }
        );
        assert_eq!(stub.hits("/Services/MG1/PhoneNumbers").len(), 1);
    }

    #[tokio::test]
    async fn test_send_sms_rejected_envelope() {
        let stub = Stub::start(|_: &Recorded| {
            (
                StatusCode::BAD_REQUEST,
                r#"{"code":21211,"message":"The 'To' number is not a valid phone number.","status":400}"#
                    .to_string(),
            )
        })
        .await;

        let outcome = stub_client(&stub).send_sms("+1555", "hi").await.unwrap();

        assert_eq!(
            outcome,
            SendOutcome::Rejected {
                code: Some(21211),
                message: "The 'To' number is not a valid phone number.".to_string()
            }
        );
        let sent = &stub.hits("/Accounts/AC1/Messages.json")[0];
        assert!(sent.body.contains("MessagingServiceSid=MG1"));
    }

    #[test]
    fn test_parse_envelope_message_resource() {
        let envelope = parse_envelope(
            r#"{"sid":"SM123","status":"accepted","error_code":null,"error_message":null}"#,
        );
        assert_eq!(envelope.sid.as_deref(), Some("SM123"));
        assert_eq!(envelope.error_code(), None);
    }

    #[test]
    fn test_parse_envelope_error_body() {
        let envelope = parse_envelope(
            r#"{"code":21211,"message":"The 'To' number is not a valid phone number.","status":400}"#,
        );
        assert_eq!(envelope.error_code(), Some(21211));
        assert_eq!(
            envelope.message.as_deref(),
            Some("The 'To' number is not a valid phone number.")
        );
        assert!(envelope.sid.is_none());
    }

    #[test]
    fn test_parse_envelope_garbage() {
        let envelope = parse_envelope("<html>Bad Gateway</html>");
        assert!(envelope.sid.is_none());
        assert!(envelope.message.is_none());
    }

    #[test]
    fn test_account_url() {
        let client = TwilioClient::new(
            Client::new(),
            "https://api.twilio.com/2010-04-01/",
            "https://messaging.twilio.com/v1",
            "AC123",
            "token",
            "MG456",
        );
        assert_eq!(
            client.account_url("Messages.json"),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
