//! SMS webhook signature verification.
//!
//! The provider signs a request by sorting every parameter except `sig` by
//! name, joining them as `&key=value` (with `&` and `=` inside values replaced
//! by `_`), and then either hashing the string with the secret appended
//! (`md5hash`) or computing an HMAC over it keyed by the secret.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use tracing::warn;

use crate::error::SignatureError;
use crate::payload::RawFields;

/// Parameter carrying the embedded signature; never part of the signed string.
pub const SIGNATURE_FIELD: &str = "sig";

/// Algorithm used to recompute the expected signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureMethod {
    /// MD5 over the parameter string with the secret appended
    #[default]
    Md5Hash,
    /// HMAC-MD5
    Md5,
    /// HMAC-SHA1
    Sha1,
    /// HMAC-SHA256
    Sha256,
    /// HMAC-SHA512
    Sha512,
}

impl SignatureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMethod::Md5Hash => "md5hash",
            SignatureMethod::Md5 => "md5",
            SignatureMethod::Sha1 => "sha1",
            SignatureMethod::Sha256 => "sha256",
            SignatureMethod::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5hash" => Ok(SignatureMethod::Md5Hash),
            "md5" => Ok(SignatureMethod::Md5),
            "sha1" => Ok(SignatureMethod::Sha1),
            "sha256" => Ok(SignatureMethod::Sha256),
            "sha512" => Ok(SignatureMethod::Sha512),
            other => Err(format!("unknown signature method `{other}`")),
        }
    }
}

/// A payload carrying an embedded signature over its original fields.
pub trait Signed {
    /// The embedded signature, if the provider sent one.
    fn signature(&self) -> Option<&str>;

    /// Original field values as received. `sig` may be present; it is skipped.
    fn signed_fields(&self) -> &RawFields;

    /// Recompute the signature and compare it with the embedded one.
    ///
    /// A missing or mismatching signature is `Ok(false)`; `Err` means the
    /// check itself could not be carried out.
    fn verify_signature(
        &self,
        secret: &str,
        method: SignatureMethod,
    ) -> Result<bool, SignatureError> {
        let provided = match self.signature() {
            Some(sig) if !sig.is_empty() => sig,
            _ => {
                warn!(method = %method, "signature_missing");
                return Ok(false);
            }
        };

        let expected = sign(self.signed_fields(), secret, method)?;
        let valid = constant_time_compare(&expected, &provided.to_ascii_lowercase());

        if !valid {
            warn!(
                method = %method,
                expected_length = expected.len(),
                actual_length = provided.len(),
                "signature_mismatch"
            );
        }

        Ok(valid)
    }
}

/// Verification step the pipeline calls for signature-capable payloads.
///
/// Implemented for [`PayloadVerifier`] and for closures, so tests and callers
/// can substitute their own check.
pub trait SignatureVerifier<P>: Send + Sync + 'static {
    fn verify(&self, payload: &P, secret: &str, method: SignatureMethod)
        -> Result<bool, SignatureError>;
}

/// Delegates to the payload's own [`Signed::verify_signature`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadVerifier;

impl<P: Signed> SignatureVerifier<P> for PayloadVerifier {
    fn verify(
        &self,
        payload: &P,
        secret: &str,
        method: SignatureMethod,
    ) -> Result<bool, SignatureError> {
        payload.verify_signature(secret, method)
    }
}

impl<P, F> SignatureVerifier<P> for F
where
    F: Fn(&P, &str, SignatureMethod) -> Result<bool, SignatureError> + Send + Sync + 'static,
{
    fn verify(
        &self,
        payload: &P,
        secret: &str,
        method: SignatureMethod,
    ) -> Result<bool, SignatureError> {
        self(payload, secret, method)
    }
}

/// Build the string the provider signs: `&k1=v1&k2=v2...`, keys in byte order.
pub fn canonical_string(fields: &RawFields) -> String {
    let mut out = String::new();
    for (key, value) in fields.iter().filter(|(k, _)| k.as_str() != SIGNATURE_FIELD) {
        out.push('&');
        out.push_str(key);
        out.push('=');
        out.push_str(&value.replace(['&', '='], "_"));
    }
    out
}

/// Compute the lowercase hex signature for `fields`.
pub fn sign(
    fields: &RawFields,
    secret: &str,
    method: SignatureMethod,
) -> Result<String, SignatureError> {
    let message = canonical_string(fields);

    match method {
        SignatureMethod::Md5Hash => {
            let mut hasher = Md5::new();
            hasher.update(message.as_bytes());
            hasher.update(secret.as_bytes());
            Ok(hex::encode(hasher.finalize()))
        }
        SignatureMethod::Md5 => hmac_hex::<Hmac<Md5>>(secret, &message, method),
        SignatureMethod::Sha1 => hmac_hex::<Hmac<Sha1>>(secret, &message, method),
        SignatureMethod::Sha256 => hmac_hex::<Hmac<Sha256>>(secret, &message, method),
        SignatureMethod::Sha512 => hmac_hex::<Hmac<Sha512>>(secret, &message, method),
    }
}

fn hmac_hex<M: Mac + hmac::digest::KeyInit>(
    secret: &str,
    message: &str,
    method: SignatureMethod,
) -> Result<String, SignatureError> {
    let mut mac = <M as hmac::digest::KeyInit>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey { method: method.as_str() })?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check whether a configured secret turns verification on.
pub fn is_signature_verification_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false)
}
