use super::FieldMap;
use crate::error::{GatewayError, Result};
use axum::extract::rejection::BytesRejection;
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use serde_json::Value;

/// Parse a request body into a JSON object.
///
/// The request must declare a JSON content type (`application/json` or an
/// `application/*+json` variant, parameters allowed) and carry a JSON object.
pub fn parse_json_object(headers: &HeaderMap, body: &[u8]) -> Result<FieldMap> {
    if !is_json_content_type(headers) {
        return Err(GatewayError::MalformedRequest(
            "Content-Type must be application/json".to_string(),
        ));
    }

    let value: Value = serde_json::from_slice(body).map_err(|_| {
        GatewayError::MalformedRequest("Request body must be valid JSON".to_string())
    })?;

    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(GatewayError::MalformedRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Map a failure to buffer the request body onto the error envelope
pub fn body_rejection(rejection: BytesRejection) -> GatewayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(rejection.body_text())
    } else {
        GatewayError::MalformedRequest("Request body could not be read".to_string())
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}
