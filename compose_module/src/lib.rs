//! Reminder text composition.
//!
//! A [`MessageComposer`] asks a generative-text provider for a short, casual
//! reminder and falls back to a fixed template whenever the provider is
//! unconfigured, errors out, or returns nothing. Composition is total: it
//! always yields usable text.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://api.cohere.com";
pub const DEFAULT_MODEL: &str = "command-r-plus";
pub const REMINDER_TEMPERATURE: f32 = 0.7;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("http transport error: {0}")]
    Transport(String),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    InvalidResponse(String),
}

/// Capability seam for the generative-text provider, so the live client can
/// be swapped for a deterministic stub in tests.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerateError>;
}

/// Live generator calling the Cohere chat API.
#[derive(Debug, Clone)]
pub struct CohereGenerator {
    api_key: String,
    model: String,
    api_base_url: String,
}

impl CohereGenerator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat", self.api_base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct CohereChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CohereChatResponse {
    text: Option<String>,
}

impl TextGenerator for CohereGenerator {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerateError> {
        let request = CohereChatRequest {
            model: &self.model,
            message: prompt,
            temperature,
        };

        let client = reqwest::blocking::Client::new();
        let response = client
            .post(self.chat_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .map_err(|err| GenerateError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CohereChatResponse = response
            .json()
            .map_err(|err| GenerateError::InvalidResponse(err.to_string()))?;
        Ok(parsed.text.unwrap_or_default())
    }
}

fn shift_clause(shift: Option<&str>) -> String {
    match shift {
        Some(shift) if !shift.is_empty() => format!(" for the {} shift", shift),
        _ => String::new(),
    }
}

/// Prompt sent to the provider for one reminder.
pub fn build_prompt(name: &str, work: &str, shift: Option<&str>) -> String {
    format!(
        "You are a cheerful flatmate. Send a short, friendly WhatsApp reminder to {}{} \
         about their chore: {}. Keep it under 35 words, casual and motivating.",
        name,
        shift_clause(shift),
        work
    )
}

/// Deterministic template used whenever the provider cannot supply text.
pub fn fallback_message(name: &str, work: &str, shift: Option<&str>) -> String {
    format!(
        "Hi {}! Friendly reminder{}: {}. Thanks 🙂",
        name,
        shift_clause(shift),
        work
    )
}

pub struct MessageComposer {
    generator: Option<Box<dyn TextGenerator>>,
}

impl MessageComposer {
    pub fn new(generator: Option<Box<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Composer that only ever produces the fallback template.
    pub fn fallback_only() -> Self {
        Self::new(None)
    }

    /// Produce reminder text for one chore. Never fails: any provider error
    /// or empty response lands on the fallback template.
    pub fn compose(&self, name: &str, work: &str, shift: Option<&str>) -> String {
        if let Some(generator) = &self.generator {
            let prompt = build_prompt(name, work, shift);
            match generator.generate(&prompt, REMINDER_TEMPERATURE) {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        return text.to_string();
                    }
                    warn!("text provider returned empty text, using fallback");
                }
                Err(err) => {
                    warn!("text provider error, using fallback: {}", err);
                }
            }
        }
        fallback_message(name, work, shift)
    }
}
