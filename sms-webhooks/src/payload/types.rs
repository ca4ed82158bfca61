//! Payload types delivered by the SMS provider.
//!
//! Field names follow the provider's wire names, aliased here where they are
//! not valid Rust identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::payload::{lenient, RawFields, WebhookPayload};
use crate::signature::Signed;

// =============================================================================
// Enumerated Fields
// =============================================================================

/// Encoding of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Unicode,
    Binary,
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(MessageType::Text),
            "unicode" => Ok(MessageType::Unicode),
            "binary" => Ok(MessageType::Binary),
            other => Err(format!("unknown message type `{other}`")),
        }
    }
}

/// Final or intermediate state reported by a delivery receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Expired,
    Failed,
    Rejected,
    Accepted,
    Buffered,
    Unknown,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Expired => "expired",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Rejected => "rejected",
            DeliveryStatus::Accepted => "accepted",
            DeliveryStatus::Buffered => "buffered",
            DeliveryStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delivered" => Ok(DeliveryStatus::Delivered),
            "expired" => Ok(DeliveryStatus::Expired),
            "failed" => Ok(DeliveryStatus::Failed),
            "rejected" => Ok(DeliveryStatus::Rejected),
            "accepted" => Ok(DeliveryStatus::Accepted),
            "buffered" => Ok(DeliveryStatus::Buffered),
            "unknown" => Ok(DeliveryStatus::Unknown),
            other => Err(format!("unknown delivery status `{other}`")),
        }
    }
}

// =============================================================================
// Inbound SMS
// =============================================================================

/// An SMS received on one of the account's virtual numbers.
///
/// When the account has signing enabled the provider adds `timestamp`,
/// `nonce` and `sig`; the original field values are kept in `fields` so the
/// signature can be recomputed exactly as sent.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundSms {
    /// Sender number
    #[serde(alias = "from")]
    pub msisdn: String,
    /// Virtual number the message was sent to
    pub to: String,
    /// Message body
    pub text: String,
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::option")]
    pub message_type: Option<MessageType>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default, rename = "api-key")]
    pub api_key: Option<String>,
    #[serde(default, rename = "message-timestamp")]
    pub message_timestamp: Option<String>,
    /// Unix seconds at which the provider signed the request
    #[serde(default, deserialize_with = "lenient::option")]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub nonce: Option<String>,
    /// Part of a multipart message
    #[serde(default, deserialize_with = "lenient::option")]
    pub concat: Option<bool>,
    #[serde(default, rename = "concat-ref")]
    pub concat_ref: Option<String>,
    #[serde(default, rename = "concat-total", deserialize_with = "lenient::option")]
    pub concat_total: Option<u32>,
    #[serde(default, rename = "concat-part", deserialize_with = "lenient::option")]
    pub concat_part: Option<u32>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub udh: Option<String>,
    /// Embedded signature
    #[serde(default)]
    pub sig: Option<String>,
    #[serde(skip)]
    fields: RawFields,
}

impl InboundSms {
    /// Original field values as decoded from the request.
    pub fn raw_fields(&self) -> &RawFields {
        &self.fields
    }
}

impl WebhookPayload for InboundSms {
    fn capture_fields(&mut self, fields: RawFields) {
        self.fields = fields;
    }
}

impl Signed for InboundSms {
    fn signature(&self) -> Option<&str> {
        self.sig.as_deref()
    }

    fn signed_fields(&self) -> &RawFields {
        &self.fields
    }
}

// =============================================================================
// Delivery Receipt
// =============================================================================

/// Carrier confirmation for a previously sent message.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryReceipt {
    /// Recipient of the original message
    pub msisdn: String,
    /// Sender id of the original message
    pub to: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(deserialize_with = "lenient::required")]
    pub status: DeliveryStatus,
    #[serde(default, rename = "network-code")]
    pub network_code: Option<String>,
    /// Price as a decimal string in the account currency
    #[serde(default)]
    pub price: Option<String>,
    /// Carrier timestamp, `YYMMDDHHMM`
    #[serde(default)]
    pub scts: Option<String>,
    #[serde(default, rename = "err-code", deserialize_with = "lenient::option")]
    pub err_code: Option<u32>,
    #[serde(default, rename = "api-key")]
    pub api_key: Option<String>,
    #[serde(default, rename = "message-timestamp")]
    pub message_timestamp: Option<String>,
    #[serde(default, rename = "client-ref")]
    pub client_ref: Option<String>,
}

impl WebhookPayload for DeliveryReceipt {}
