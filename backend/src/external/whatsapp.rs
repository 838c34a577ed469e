//! Twilio WhatsApp gateway client
//!
//! Thin wrapper over the Twilio Messages API: form-encoded POST, account
//! SID/auth token basic auth, `whatsapp:` address scheme. Sits behind the
//! [`MessageGateway`] trait so the dispatcher can be tested with fakes.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Anything that can deliver an outbound message
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Deliver `body` to `phone`; returns the gateway's message id when the
    /// message was accepted
    async fn send(&self, phone: &str, body: &str) -> Result<String, String>;
}

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Twilio WhatsApp client
#[derive(Clone)]
pub struct TwilioWhatsAppClient {
    account_sid: String,
    auth_token: String,
    from_number: String,
    http_client: Client,
    base_url: String,
}

/// Twilio message creation response
#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

/// Prefix a number with the whatsapp: scheme unless it already carries it
pub fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

impl TwilioWhatsAppClient {
    /// Create a new Twilio WhatsApp client
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        Self::with_base_url(account_sid, auth_token, from_number, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(
        account_sid: String,
        auth_token: String,
        from_number: String,
        base_url: String,
    ) -> Self {
        Self {
            account_sid,
            auth_token,
            from_number,
            http_client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl MessageGateway for TwilioWhatsAppClient {
    async fn send(&self, phone: &str, body: &str) -> Result<String, String> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let params = [
            ("From", whatsapp_address(&self.from_number)),
            ("To", whatsapp_address(phone)),
            ("Body", body.to_string()),
        ];

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| format!("Failed to send WhatsApp message: {}", e))?;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Twilio returned {}: {}", status, body));
        }

        let message: TwilioMessageResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Twilio response: {}", e))?;

        Ok(message.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_gains_whatsapp_prefix_once() {
        assert_eq!(whatsapp_address("+5587999990000"), "whatsapp:+5587999990000");
        assert_eq!(
            whatsapp_address("whatsapp:+5587999990000"),
            "whatsapp:+5587999990000"
        );
    }
}
