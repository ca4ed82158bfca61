//! SMS webhook receiver.
//!
//! Accepts inbound SMS and delivery receipt webhooks from the SMS provider,
//! decodes them from a query string or a form/JSON body, verifies the
//! provider's signature where configured, and hands each payload to a
//! caller-supplied handler.
//!
//! ## Architecture
//!
//! ```text
//! Request → WebhookPipeline → parse → (verify) → handler → 204 / 401 / 500 → (next)
//! ```

pub mod config;
pub mod error;
pub mod payload;
pub mod signature;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{SignatureError, WebhookError};
pub use payload::{DeliveryReceipt, InboundSms, RawFields, WebhookPayload};
pub use signature::{PayloadVerifier, SignatureMethod, SignatureVerifier, Signed};
pub use web::{
    build_router, PipelineConfig, WebhookHandler, WebhookOutcome, WebhookPipeline,
    WebhookRouterExt,
};
