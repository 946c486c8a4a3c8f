//! Webhook signature verification and event decoding.
//!
//! Lyft signs each webhook delivery with HMAC-SHA256 over the raw request
//! body, keyed by the app's verification token, and sends the base64 digest
//! in `X-Lyft-Signature` as `sha256=<digest>`.

use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::de;
use crate::types::RideDetail;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Lyft-Signature";

/// Prefix on the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Event ID prefix of deliveries triggered from the sandbox.
pub const SANDBOX_EVENT_PREFIX: &str = "sandboxevent";

/// A ride changed status.
pub const RIDE_STATUS_UPDATED: &str = "ride.status.updated";
/// A ride's receipt is available.
pub const RIDE_RECEIPT_READY: &str = "ride.receipt.ready";

type HmacSha256 = Hmac<Sha256>;

/// Webhook error type.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The signature does not match the body.
    #[error("failed to verify webhook request")]
    Verification,

    /// The body was verified but is not a valid event.
    #[error("failed to decode webhook event: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading the body failed.
    #[error("failed to read webhook body: {0}")]
    Io(#[from] std::io::Error),
}

/// An incoming webhook event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(deserialize_with = "de::null_default")]
    pub event_id: String,
    /// Resource URL for the event.
    #[serde(rename = "href", deserialize_with = "de::null_default")]
    pub url: String,
    #[serde(deserialize_with = "de::timestamp")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "de::null_default")]
    pub event_type: String,
    /// The ride the event is about. Several fields are never set here.
    #[serde(rename = "event", deserialize_with = "de::null_default")]
    pub detail: RideDetail,
}

impl Event {
    /// Whether the event came from the sandbox.
    pub fn is_sandbox(&self) -> bool {
        self.event_id.starts_with(SANDBOX_EVENT_PREFIX)
    }
}

/// The signature from request headers, without its `sha256=` prefix.
pub fn signature(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(SIGNATURE_HEADER)?.to_str().ok()?;
    Some(value.strip_prefix(SIGNATURE_PREFIX).unwrap_or(value))
}

/// Base64 HMAC-SHA256 of `body` keyed by `secret`.
pub fn sign(body: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Check a signature against the raw body, in constant time.
pub fn verify(body: &[u8], signature: &str, secret: &[u8]) -> bool {
    let expected = sign(body, secret);
    let expected = expected.as_bytes();
    let actual = signature.as_bytes();
    expected.len() == actual.len() && bool::from(expected.ct_eq(actual))
}

/// Verify a buffered body against the request's signature, then decode it.
pub fn decode_event(body: &[u8], headers: &HeaderMap, secret: &[u8]) -> Result<Event, WebhookError> {
    let signature = signature(headers).unwrap_or_default();
    if !verify(body, signature, secret) {
        tracing::debug!("webhook signature mismatch");
        return Err(WebhookError::Verification);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Read a body to the end, then [`decode_event`] it.
pub fn read_event<R: Read>(
    mut reader: R,
    headers: &HeaderMap,
    secret: &[u8],
) -> Result<Event, WebhookError> {
    let mut body = Vec::new();
    reader.read_to_end(&mut body)?;
    decode_event(&body, headers, secret)
}
