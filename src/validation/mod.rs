//! Request validation
//!
//! Turns loosely typed client payloads into the normalized requests handed to
//! the generation backend. Fields are checked in a fixed order and the first
//! violation is reported; errors are never aggregated.

pub mod body;

pub use body::{body_rejection, parse_json_object};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw client payload
pub type FieldMap = Map<String, Value>;

/// Token limit used when the client does not send one
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Largest token limit a client may request
pub const MAX_TOKENS_LIMIT: u32 = 8192;

/// Temperature used when the client does not send one
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Fixed sampling temperature for chat
pub const CHAT_TEMPERATURE: f64 = 0.8;

/// Fixed token limit for chat
pub const CHAT_MAX_TOKENS: u32 = 2048;

/// Validation failures, one per offending field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: &'static str,
    },
}

impl ValidationError {
    /// Name of the field the error concerns
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => field,
            ValidationError::InvalidField { field, .. } => field,
        }
    }

    fn invalid(field: &'static str, message: &'static str) -> Self {
        ValidationError::InvalidField { field, message }
    }
}

/// Normalized input to one backend generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Prompt text, exactly as sent by the client
    pub prompt: String,
    /// Output token limit, within `1..=8192`
    pub max_tokens: u32,
    /// Sampling temperature, within `0.0..=1.0`
    pub temperature: f64,
}

impl GenerationRequest {
    /// Validate a `/api/generate` payload.
    ///
    /// Checks `prompt`, then `maxTokens` (also accepted as `max_tokens`), then
    /// `temperature`.
    pub fn from_fields(fields: &FieldMap) -> Result<Self, ValidationError> {
        let prompt = match fields.get("prompt") {
            None => return Err(ValidationError::MissingField("prompt")),
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(_) => {
                return Err(ValidationError::invalid(
                    "prompt",
                    "prompt must be a non-empty string",
                ))
            }
        };

        let max_tokens = match fields.get("maxTokens").or_else(|| fields.get("max_tokens")) {
            None => DEFAULT_MAX_TOKENS,
            Some(value) => parse_max_tokens(value)?,
        };

        let temperature = match fields.get("temperature") {
            None => DEFAULT_TEMPERATURE,
            Some(value) => parse_temperature(value)?,
        };

        Ok(Self {
            prompt,
            max_tokens,
            temperature,
        })
    }
}

fn parse_max_tokens(value: &Value) -> Result<u32, ValidationError> {
    // Floats such as 5.0 and booleans are not integers
    value
        .as_u64()
        .filter(|n| (1..=MAX_TOKENS_LIMIT as u64).contains(n))
        .map(|n| n as u32)
        .ok_or_else(|| {
            ValidationError::invalid(
                "maxTokens",
                "maxTokens must be an integer between 1 and 8192",
            )
        })
}

fn parse_temperature(value: &Value) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .filter(|t| (0.0..=1.0).contains(t))
        .ok_or_else(|| {
            ValidationError::invalid("temperature", "temperature must be a number between 0 and 1")
        })
}

fn prompt_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalized conversational input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// User message; may be empty
    pub message: String,
    /// Optional conversation context; empty when absent
    pub context: String,
}

impl ChatRequest {
    /// Validate a `/api/chat` payload. Only the absence of `message` is an
    /// error; any present value is accepted and non-string values are used as
    /// their JSON text.
    pub fn from_fields(fields: &FieldMap) -> Result<Self, ValidationError> {
        let message = fields
            .get("message")
            .map(prompt_text)
            .ok_or(ValidationError::MissingField("message"))?;

        let context = match fields.get("context") {
            None | Some(Value::Null) => String::new(),
            Some(value) => prompt_text(value),
        };

        Ok(Self { message, context })
    }

    /// Compose the single prompt sent to the backend
    pub fn prompt(&self) -> String {
        if self.context.is_empty() {
            format!("User: {}\nAssistant:", self.message)
        } else {
            format!(
                "Context: {}\n\nUser: {}\nAssistant:",
                self.context, self.message
            )
        }
    }

    /// Backend call parameters; temperature and token limit are fixed for chat
    pub fn to_generation_request(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt(),
            max_tokens: CHAT_MAX_TOKENS,
            temperature: CHAT_TEMPERATURE,
        }
    }
}
