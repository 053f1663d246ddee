//! Outbound WhatsApp delivery via the Twilio Messages API.
//!
//! Twilio addresses WhatsApp recipients with a `whatsapp:` prefix on the
//! E.164 number; both the `From` and `To` form fields carry it.

use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "https://api.twilio.com";

/// Credentials and addressing for a Twilio WhatsApp sender.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// The sender number, with or without the `whatsapp:` prefix.
    pub from_number: String,
    pub api_base_url: String,
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url.trim_end_matches('/'),
            self.account_sid
        )
    }
}

/// Outcome of a delivery attempt that reached the Twilio API.
#[derive(Debug, Clone)]
pub struct SendResult {
    pub success: bool,
    pub message_id: String,
    pub submitted_at: String,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SendWhatsAppError {
    #[error("http transport error: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorResponse {
    message: Option<String>,
}

/// Prefix a dialable number with the `whatsapp:` channel marker.
pub fn whatsapp_address(number: &str) -> String {
    let trimmed = number.trim();
    if trimmed.starts_with("whatsapp:") {
        trimmed.to_string()
    } else {
        format!("whatsapp:{}", trimmed)
    }
}

/// Send one WhatsApp message. An error response from the API is reported in
/// the returned [`SendResult`]; only transport-level failures are `Err`.
pub fn send_whatsapp(
    config: &TwilioConfig,
    to_number: &str,
    body: &str,
) -> Result<SendResult, SendWhatsAppError> {
    let to = whatsapp_address(to_number);
    let from = whatsapp_address(&config.from_number);

    let client = reqwest::blocking::Client::new();
    let response = client
        .post(config.messages_url())
        .basic_auth(&config.account_sid, Some(&config.auth_token))
        .form(&[("To", to.as_str()), ("From", from.as_str()), ("Body", body)])
        .send()
        .map_err(|err| SendWhatsAppError::Transport(err.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .map_err(|err| SendWhatsAppError::Transport(err.to_string()))?;

    if status.is_success() {
        let parsed: TwilioMessageResponse = serde_json::from_str(&text)
            .map_err(|err| SendWhatsAppError::InvalidResponse(err.to_string()))?;
        Ok(SendResult {
            success: true,
            message_id: parsed.sid.unwrap_or_default(),
            submitted_at: chrono::Utc::now().to_rfc3339(),
            error: None,
        })
    } else {
        let message = serde_json::from_str::<TwilioErrorResponse>(&text)
            .ok()
            .and_then(|parsed| parsed.message)
            .unwrap_or_else(|| format!("Twilio API error {}", status));
        Ok(SendResult {
            success: false,
            message_id: String::new(),
            submitted_at: String::new(),
            error: Some(message),
        })
    }
}
