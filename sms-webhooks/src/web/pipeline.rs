//! Webhook dispatch pipeline.
//!
//! One pipeline serves one route. Per request it:
//! 1. Decodes the payload from the query string (GET) or the body (anything else)
//! 2. Verifies the embedded signature, when a verifier and a secret are configured
//! 3. Invokes the caller's handler
//! 4. Sets exactly one status code: 204, 401 or 500
//! 5. Optionally runs the next stage of the chain
//!
//! Failures never escape: they are logged and mapped to a status.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        request::Parts,
        Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::error::{SignatureError, WebhookError};
use crate::payload::{parse_body, parse_query, WebhookPayload};
use crate::signature::{
    is_signature_verification_enabled, PayloadVerifier, SignatureMethod, SignatureVerifier, Signed,
};

/// Default cap on buffered request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;

// =============================================================================
// Configuration
// =============================================================================

/// Immutable per-route settings, built once at registration time.
#[derive(Clone)]
pub struct PipelineConfig {
    secret: Option<String>,
    method: SignatureMethod,
    invoke_next: bool,
    max_body_bytes: usize,
}

impl PipelineConfig {
    /// No secret, baseline signature method, terminal.
    pub fn new() -> Self {
        Self {
            secret: None,
            method: SignatureMethod::default(),
            invoke_next: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_optional_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret;
        self
    }

    pub fn with_method(mut self, method: SignatureMethod) -> Self {
        self.method = method;
        self
    }

    /// Run the next stage of the chain after this pipeline, whatever the outcome.
    pub fn invoke_next(mut self, invoke_next: bool) -> Self {
        self.invoke_next = invoke_next;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// The secret, if one is configured and not blank.
    pub fn secret(&self) -> Option<&str> {
        if is_signature_verification_enabled(&self.secret) {
            self.secret.as_deref()
        } else {
            None
        }
    }

    pub fn method(&self) -> SignatureMethod {
        self.method
    }

    pub fn invokes_next(&self) -> bool {
        self.invoke_next
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("secret_configured", &self.secret().is_some())
            .field("method", &self.method)
            .field("invoke_next", &self.invoke_next)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of one pipeline run.
///
/// Inserted into the request extensions before the next stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Parsed, verified if required, and handled
    Accepted,
    /// Signature did not match; handler not invoked
    Rejected,
    /// Parse failure, verifier error, or handler fault
    Failed,
}

impl WebhookOutcome {
    pub fn status(self) -> StatusCode {
        match self {
            WebhookOutcome::Accepted => StatusCode::NO_CONTENT,
            WebhookOutcome::Rejected => StatusCode::UNAUTHORIZED,
            WebhookOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Caller-supplied callback, invoked at most once per request.
///
/// Returning `Err` or panicking both yield a 500.
pub trait WebhookHandler<P>: Send + Sync + 'static {
    fn handle(&self, payload: P) -> anyhow::Result<()>;
}

impl<P, F> WebhookHandler<P> for F
where
    F: Fn(P) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn handle(&self, payload: P) -> anyhow::Result<()> {
        self(payload)
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Parse → (verify) → handle → status, for one payload type.
pub struct WebhookPipeline<P> {
    handler: Arc<dyn WebhookHandler<P>>,
    verifier: Option<Arc<dyn SignatureVerifier<P>>>,
    config: Arc<PipelineConfig>,
}

impl<P> Clone for WebhookPipeline<P> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            verifier: self.verifier.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<P: WebhookPayload + Signed> WebhookPipeline<P> {
    /// Pipeline for signature-capable payloads.
    ///
    /// Verification runs only when `config` carries a non-blank secret;
    /// without one every well-formed payload is accepted.
    pub fn signed<H: WebhookHandler<P>>(handler: H, config: PipelineConfig) -> Self {
        Self::new(handler, config).with_verifier(PayloadVerifier)
    }
}

impl<P: WebhookPayload> WebhookPipeline<P> {
    /// Pipeline that never verifies. Any secret in `config` is ignored.
    pub fn new<H: WebhookHandler<P>>(handler: H, config: PipelineConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            verifier: None,
            config: Arc::new(config),
        }
    }

    /// Replace the signature check.
    pub fn with_verifier<V: SignatureVerifier<P>>(mut self, verifier: V) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline as a middleware stage.
    ///
    /// When continuing, the next stage sees the [`WebhookOutcome`] in the
    /// request extensions and the buffered body. The status set here is
    /// kept; the next stage's body is dropped.
    pub async fn handle(&self, request: Request, next: Next) -> Response {
        let (parts, body) = request.into_parts();
        let (outcome, body) = self.process(&parts, body).await;
        let status = outcome.status();

        if !self.config.invoke_next {
            return status.into_response();
        }

        info!(status = status.as_u16(), "webhook_continuing");

        let mut request = Request::from_parts(parts, body);
        request.extensions_mut().insert(outcome);

        let (mut head, _) = next.run(request).await.into_parts();
        head.status = status;
        head.headers.remove(CONTENT_LENGTH);
        head.headers.remove(CONTENT_TYPE);
        Response::from_parts(head, Body::empty())
    }

    /// Decode, verify and dispatch one request.
    ///
    /// Returns the outcome and a body equivalent to the one consumed, so the
    /// request can be passed on.
    pub async fn process(&self, parts: &Parts, body: Body) -> (WebhookOutcome, Body) {
        info!(
            method = %parts.method,
            path = %parts.uri.path(),
            verification_enabled = self.verification_enabled(),
            "webhook_received"
        );

        let (parsed, body) = self.parse(parts, body).await;

        let outcome = match parsed.and_then(|payload| self.dispatch(payload)) {
            Ok(outcome) => outcome,
            Err(e) => {
                match &e {
                    WebhookError::MalformedPayload(_) | WebhookError::BodyRead(_) => {
                        warn!(error = %e, kind = e.kind(), "webhook_parse_failed")
                    }
                    WebhookError::Verification(_) => {
                        error!(error = %e, kind = e.kind(), "webhook_verifier_error")
                    }
                    WebhookError::Handler(_) | WebhookError::HandlerPanic(_) => {
                        error!(error = %e, kind = e.kind(), "webhook_handler_failed")
                    }
                }
                WebhookOutcome::Failed
            }
        };

        (outcome, body)
    }

    fn verification_enabled(&self) -> bool {
        self.verifier.is_some() && self.config.secret().is_some()
    }

    async fn parse(&self, parts: &Parts, body: Body) -> (Result<P, WebhookError>, Body) {
        if parts.method == Method::GET {
            return (parse_query(parts.uri.query().unwrap_or_default()), body);
        }

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        match to_bytes(body, self.config.max_body_bytes).await {
            Ok(bytes) => {
                let parsed = parse_body(&bytes, content_type);
                (parsed, Body::from(bytes))
            }
            Err(e) => (Err(WebhookError::BodyRead(e)), Body::empty()),
        }
    }

    fn dispatch(&self, payload: P) -> Result<WebhookOutcome, WebhookError> {
        if let (Some(verifier), Some(secret)) = (&self.verifier, self.config.secret()) {
            let method = self.config.method;
            // A clean mismatch is a 401; a verifier error or panic is a 500.
            let verified = catch_unwind(AssertUnwindSafe(|| {
                verifier.verify(&payload, secret, method)
            }))
            .map_err(|panic| SignatureError::Verifier(panic_message(panic.as_ref())))??;

            if !verified {
                warn!(method = %method, "webhook_signature_invalid");
                return Ok(WebhookOutcome::Rejected);
            }
        }

        self.invoke(payload)?;
        info!("webhook_accepted");
        Ok(WebhookOutcome::Accepted)
    }

    fn invoke(&self, payload: P) -> Result<(), WebhookError> {
        match catch_unwind(AssertUnwindSafe(|| self.handler.handle(payload))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(WebhookError::Handler(e)),
            Err(panic) => Err(WebhookError::HandlerPanic(panic_message(panic.as_ref()))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
