//! Request decoding into typed payloads.
//!
//! The provider delivers the same payload either as a GET query string or as a
//! POST body, form-encoded or JSON depending on account settings. Both paths
//! produce the raw field map alongside the typed value.

use serde_json::Value;
use tracing::debug;

use crate::error::WebhookError;
use crate::payload::{RawFields, WebhookPayload};

/// Body encodings the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Form,
    Json,
}

impl BodyFormat {
    /// Pick the decoder from a `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored; `+json` suffixes count as
    /// JSON.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "application/x-www-form-urlencoded" => Some(BodyFormat::Form),
            "application/json" => Some(BodyFormat::Json),
            m if m.starts_with("application/") && m.ends_with("+json") => Some(BodyFormat::Json),
            _ => None,
        }
    }
}

/// Decode a payload from a URL query string (without the leading `?`).
pub fn parse_query<P: WebhookPayload>(query: &str) -> Result<P, WebhookError> {
    decode_form(query.as_bytes())
}

/// Decode a payload from a request body using its declared content type.
pub fn parse_body<P: WebhookPayload>(
    body: &[u8],
    content_type: Option<&str>,
) -> Result<P, WebhookError> {
    let content_type =
        content_type.ok_or_else(|| WebhookError::malformed("missing content type"))?;

    match BodyFormat::from_content_type(content_type) {
        Some(BodyFormat::Form) => decode_form(body),
        Some(BodyFormat::Json) => decode_json(body),
        None => Err(WebhookError::malformed(format!(
            "unsupported content type `{content_type}`"
        ))),
    }
}

fn decode_form<P: WebhookPayload>(bytes: &[u8]) -> Result<P, WebhookError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(bytes).map_err(WebhookError::malformed)?;
    let mut payload: P = serde_urlencoded::from_bytes(bytes).map_err(WebhookError::malformed)?;

    debug!(field_count = pairs.len(), format = "form", "payload_decoded");
    payload.capture_fields(pairs.into_iter().collect());
    Ok(payload)
}

fn decode_json<P: WebhookPayload>(bytes: &[u8]) -> Result<P, WebhookError> {
    let value: Value = serde_json::from_slice(bytes).map_err(WebhookError::malformed)?;
    let fields = match &value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| render_scalar(value).map(|v| (key.clone(), v)))
            .collect::<RawFields>(),
        _ => return Err(WebhookError::malformed("JSON body is not an object")),
    };
    let mut payload: P = serde_json::from_value(value).map_err(WebhookError::malformed)?;

    debug!(field_count = fields.len(), format = "json", "payload_decoded");
    payload.capture_fields(fields);
    Ok(payload)
}

/// String form of a JSON field as the provider would have sent it in a form.
fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
