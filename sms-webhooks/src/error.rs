//! Error types for webhook ingestion.
//!
//! Nothing here ever reaches the HTTP client as a body: the pipeline logs the
//! error and answers 500.

use thiserror::Error;

/// Failures raised while computing or checking a payload signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The MAC implementation rejected the configured secret.
    #[error("signature secret rejected by {method}")]
    InvalidKey { method: &'static str },

    /// A custom verifier failed for its own reasons.
    #[error("signature verifier failed: {0}")]
    Verifier(String),
}

/// Failures absorbed at the pipeline boundary.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Request data does not decode into the expected payload shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The request body could not be read (client abort, size limit).
    #[error("failed to read request body: {0}")]
    BodyRead(#[from] axum::Error),

    /// The verifier errored, as opposed to returning a clean mismatch.
    #[error(transparent)]
    Verification(#[from] SignatureError),

    /// The caller's handler returned an error.
    #[error("webhook handler failed: {0:#}")]
    Handler(anyhow::Error),

    /// The caller's handler panicked.
    #[error("webhook handler panicked: {0}")]
    HandlerPanic(String),
}

impl WebhookError {
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        WebhookError::MalformedPayload(reason.to_string())
    }

    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookError::MalformedPayload(_) => "malformed_payload",
            WebhookError::BodyRead(_) => "body_read",
            WebhookError::Verification(_) => "verification_error",
            WebhookError::Handler(_) => "handler_error",
            WebhookError::HandlerPanic(_) => "handler_panic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            WebhookError::malformed("missing field `to`").to_string(),
            "malformed payload: missing field `to`"
        );
        assert_eq!(
            WebhookError::Verification(SignatureError::Verifier("boom".into())).to_string(),
            "signature verifier failed: boom"
        );
        assert_eq!(
            WebhookError::Handler(anyhow::anyhow!("db down")).to_string(),
            "webhook handler failed: db down"
        );
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(WebhookError::malformed("x").kind(), "malformed_payload");
        assert_eq!(WebhookError::HandlerPanic("oops".into()).kind(), "handler_panic");
        assert_eq!(
            WebhookError::from(SignatureError::InvalidKey { method: "sha256" }).kind(),
            "verification_error"
        );
    }
}
