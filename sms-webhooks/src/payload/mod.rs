//! Webhook payload types and decoding.
//!
//! ## Decoding Flow
//!
//! ```text
//! GET  ?query          → parse_query() ─┐
//! POST body + type     → parse_body()  ─┴→ RawFields + typed payload
//! ```

pub mod lenient;
pub mod parser;
pub mod types;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

pub use parser::{parse_body, parse_query, BodyFormat};
pub use types::{DeliveryReceipt, DeliveryStatus, InboundSms, MessageType};

/// Decoded request fields keyed by wire name, holding the original string
/// values. Ordered by key so it can be signed directly.
pub type RawFields = BTreeMap<String, String>;

/// A payload the pipeline can decode from a query string or a request body.
pub trait WebhookPayload: DeserializeOwned + Send + 'static {
    /// Hands the payload the raw field map it was decoded from.
    ///
    /// Payloads that recompute signatures keep it; the default drops it.
    fn capture_fields(&mut self, _fields: RawFields) {}
}
