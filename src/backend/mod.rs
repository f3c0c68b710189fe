//! Generation backend
//!
//! The gateway talks to the text-generation service only through the
//! [`Generator`] trait, so tests can substitute a fake and the Gemini client
//! stays an implementation detail.

pub mod gemini;

pub use gemini::GeminiGenerator;

use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a generation backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Backend request timed out: {0}")]
    Timeout(String),

    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Backend returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Prompt was blocked by the backend: {0}")]
    Blocked(String),

    #[error("Backend returned no text")]
    EmptyResponse,
}

/// A text-generation capability
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for `prompt`. Called exactly once per admitted, valid request.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, GeneratorError>;
}
