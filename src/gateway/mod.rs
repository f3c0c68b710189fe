//! Request orchestration
//!
//! One request cycle: admission, validation, a single backend call, and the
//! shaping of the reply. Failures come back as [`GatewayError`], which maps
//! each kind to its HTTP status in one place. There is no retry loop; each
//! admitted, valid request reaches the backend exactly once.

use crate::backend::Generator;
use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::rate_limit::{RateLimitResult, RateLimiter};
use crate::validation::{ChatRequest, FieldMap, GenerationRequest};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Client-facing summary for failed `/api/generate` calls
pub const GENERATE_FAILURE: &str = "An error occurred while generating content";

/// Client-facing summary for failed `/api/chat` calls
pub const CHAT_FAILURE: &str = "Chat service unavailable";

/// Successful `/api/generate` reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateReply {
    pub success: bool,
    pub response: String,
    pub prompt: String,
    pub metadata: GenerationMetadata,
}

/// Parameters echoed back with a generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub max_tokens: u32,
    pub temperature: f64,
    pub timestamp: String,
}

/// Successful `/api/chat` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    pub message: String,
    pub context: String,
}

/// Orchestrates admission, validation and the backend call
pub struct GenerationGateway {
    limiter: Option<Arc<RateLimiter>>,
    generator: Arc<dyn Generator>,
}

impl GenerationGateway {
    /// Create a gateway; `limiter` is `None` when admission control is disabled
    pub fn new(generator: Arc<dyn Generator>, limiter: Option<Arc<RateLimiter>>) -> Self {
        Self { limiter, generator }
    }

    /// Admission step. Denial is reported as [`GatewayError::RateLimited`];
    /// callers must not go on to validation or the backend.
    pub fn admit(&self, now: Instant) -> Result<Option<RateLimitResult>> {
        let Some(limiter) = &self.limiter else {
            return Ok(None);
        };

        let result = limiter.check(now);
        if result.allowed {
            Ok(Some(result))
        } else {
            Err(GatewayError::RateLimited(result))
        }
    }

    /// Validate an admitted `/api/generate` payload and run it
    pub async fn generate(&self, fields: &FieldMap) -> Result<GenerateReply> {
        let request = GenerationRequest::from_fields(fields)?;

        info!(
            max_tokens = request.max_tokens,
            temperature = request.temperature,
            "Generating content for prompt: {}...",
            preview(&request.prompt)
        );

        let text = self.call_backend(&request, GENERATE_FAILURE).await?;

        Ok(GenerateReply {
            success: true,
            response: text,
            prompt: request.prompt,
            metadata: GenerationMetadata {
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                timestamp: utc_timestamp(),
            },
        })
    }

    /// Validate an admitted `/api/chat` payload and run it
    pub async fn chat(&self, fields: &FieldMap) -> Result<ChatReply> {
        let chat = ChatRequest::from_fields(fields)?;
        let request = chat.to_generation_request();

        info!(
            has_context = !chat.context.is_empty(),
            "Chat message: {}...",
            preview(&chat.message)
        );

        let text = self.call_backend(&request, CHAT_FAILURE).await?;

        Ok(ChatReply {
            success: true,
            response: text.trim().to_string(),
            message: chat.message,
            context: chat.context,
        })
    }

    async fn call_backend(
        &self,
        request: &GenerationRequest,
        summary: &'static str,
    ) -> Result<String> {
        let started = Instant::now();
        let result = self
            .generator
            .generate(&request.prompt, request.max_tokens, request.temperature)
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        metrics::record_backend_call(result.is_ok(), elapsed);

        result.map_err(|e| {
            error!(error = %e, latency_ms = elapsed * 1000.0, "{}", summary);
            GatewayError::Backend {
                summary,
                message: e.to_string(),
            }
        })
    }
}

/// Current UTC time in RFC 3339
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// First 50 characters of a prompt, for logs
fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
