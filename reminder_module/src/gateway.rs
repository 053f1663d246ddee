//! Messaging gateway seam between the pipeline and outbound delivery.

use send_whatsapp_module::{send_whatsapp, SendResult, TwilioConfig};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("messaging gateway not configured")]
    NotConfigured,
    #[error("transport error: {0}")]
    Transport(String),
}

/// Injectable delivery capability. The live implementation talks to Twilio;
/// tests substitute a deterministic stub.
pub trait MessagingGateway {
    /// Attempt delivery to a normalized phone number. API-level rejection is
    /// reported inside the `SendResult`; `Err` means the attempt never
    /// reached the provider.
    fn send(&self, phone: &str, body: &str) -> Result<SendResult, GatewayError>;
}

/// Live WhatsApp gateway backed by the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct WhatsAppGateway {
    config: TwilioConfig,
}

impl WhatsAppGateway {
    pub fn new(config: TwilioConfig) -> Self {
        Self { config }
    }
}

impl MessagingGateway for WhatsAppGateway {
    fn send(&self, phone: &str, body: &str) -> Result<SendResult, GatewayError> {
        send_whatsapp(&self.config, phone, body)
            .map_err(|err| GatewayError::Transport(err.to_string()))
    }
}

/// Stand-in for deployments without messaging credentials (previews still
/// work; a real send reports every row as failed instead of panicking).
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

impl MessagingGateway for DisabledGateway {
    fn send(&self, _phone: &str, _body: &str) -> Result<SendResult, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}
