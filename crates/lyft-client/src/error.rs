//! Client error types.
//!
//! A non-2xx response is always turned into a [`StatusError`]; classification
//! itself never fails. Endpoints that may require a follow-up confirmation
//! (ride requests and cancellations) attach a second, independently decoded
//! payload to the same captured body.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use thiserror::Error;

use crate::de;
use crate::response::{RawResponse, ResponseMeta};

// ─────────────────────────────────────────────────────────────────────────────
// Reason slugs
// ─────────────────────────────────────────────────────────────────────────────

/// The access token is malformed or unknown.
pub const INVALID_TOKEN: &str = "invalid_token";
/// The access token has expired and should be refreshed.
pub const TOKEN_EXPIRED: &str = "token_expired";
/// The token lacks a scope the endpoint requires.
pub const INSUFFICIENT_SCOPE: &str = "insufficient_scope";
/// The OAuth grant type is not supported.
pub const UNSUPPORTED_GRANT_TYPE: &str = "unsupported_grant_type";

/// Non-standard response header that overrides the body-derived reason.
pub const ERROR_HEADER: &str = "error";

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP round trip failed before a response was obtained.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Encoding a request body failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with an unexpected status code.
    #[error("{0}")]
    Status(Box<StatusError>),

    /// A successful response body could not be decoded.
    #[error("failed to decode response (status {}): {source}", .meta.status.as_u16())]
    Decode {
        /// The underlying decode failure.
        #[source]
        source: serde_json::Error,
        /// Status and headers of the offending response.
        meta: Box<ResponseMeta>,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StatusError> for Error {
    fn from(err: StatusError) -> Self {
        Error::Status(Box::new(err))
    }
}

impl Error {
    /// The status error, if this is one.
    pub fn status_error(&self) -> Option<&StatusError> {
        match self {
            Error::Status(err) => Some(err),
            _ => None,
        }
    }

    /// Response metadata, when a response was received.
    pub fn meta(&self) -> Option<&ResponseMeta> {
        match self {
            Error::Status(err) => Some(&err.meta),
            Error::Decode { meta, .. } => Some(meta),
            _ => None,
        }
    }

    /// Check if this is a rate limit error (status 429).
    pub fn is_rate_limited(&self) -> bool {
        self.status_error().is_some_and(StatusError::is_rate_limited)
    }

    /// Check if the access token appears to have expired.
    pub fn is_token_expired(&self) -> bool {
        self.status_error().is_some_and(StatusError::is_token_expired)
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status_error()
            .is_some_and(|e| e.status() == StatusCode::NOT_FOUND)
    }

    /// Cost confirmation details from a rejected ride request.
    pub fn cost_token_info(&self) -> Option<&CostTokenInfo> {
        self.status_error().and_then(StatusError::cost_token_info)
    }

    /// Fee details from a rejected cancellation.
    pub fn cancellation_fee(&self) -> Option<&CancellationFee> {
        self.status_error().and_then(StatusError::cancellation_fee)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

// ─────────────────────────────────────────────────────────────────────────────
// Error info
// ─────────────────────────────────────────────────────────────────────────────

/// Machine-readable details parsed from an error response. Fields may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Short reason slug, e.g. `token_expired`.
    pub reason: String,
    /// Structured detail entries, passed through as received.
    pub details: Vec<BTreeMap<String, String>>,
    /// Human-readable description.
    pub description: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "error")]
    slug: Option<String>,
    #[serde(default, rename = "error_detail", deserialize_with = "de::null_default")]
    details: Vec<BTreeMap<String, String>>,
    #[serde(default, rename = "error_description")]
    description: Option<String>,
}

impl ErrorInfo {
    /// Parse error info from response headers and a buffered body.
    ///
    /// The first value of the `error` header wins over the body's `error`
    /// field. A body that fails to decode leaves the body-derived fields empty.
    pub fn parse(headers: &HeaderMap, body: &[u8]) -> Self {
        let decoded = serde_json::from_slice::<ErrorBody>(body).ok();
        let header_reason = headers
            .get(ERROR_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let (slug, details, description) = match decoded {
            Some(b) => (b.slug, b.details, b.description),
            None => (None, Vec::new(), None),
        };

        Self {
            reason: header_reason.or(slug).unwrap_or_default(),
            details,
            description: description.unwrap_or_default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Supplementary payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Cost confirmation details carried by a rejected ride request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostTokenInfo {
    #[serde(deserialize_with = "de::null_default")]
    pub primetime_percentage: String,
    #[serde(deserialize_with = "de::null_default")]
    pub primetime_multiplier: f64,
    #[serde(rename = "primetime_confirmation_token", deserialize_with = "de::null_default")]
    pub primetime_token: String,
    #[serde(deserialize_with = "de::null_default")]
    pub cost_token: String,
    /// How long the token stays valid. Sent as a string of seconds.
    #[serde(deserialize_with = "de::string_seconds")]
    pub token_duration: Option<Duration>,
    #[serde(deserialize_with = "de::null_default")]
    pub error_uri: String,
}

/// Fee details carried by a rejected cancellation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CancellationFee {
    #[serde(deserialize_with = "de::null_default")]
    pub amount: f64,
    #[serde(deserialize_with = "de::null_default")]
    pub currency: String,
    /// Token to echo back to accept the fee.
    #[serde(deserialize_with = "de::null_default")]
    pub token: String,
    #[serde(deserialize_with = "de::seconds")]
    pub token_duration: Duration,
}

/// Endpoint-specific shape of a [`StatusError`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatusErrorKind {
    /// Any endpoint without specialized handling.
    Generic,
    /// A ride request that needs cost confirmation.
    RideRequest { cost: Option<CostTokenInfo> },
    /// A cancellation that needs fee confirmation.
    CancelRide { fee: Option<CancellationFee> },
}

// ─────────────────────────────────────────────────────────────────────────────
// StatusError
// ─────────────────────────────────────────────────────────────────────────────

/// The round trip succeeded but the status code signals an error.
#[derive(Debug, Clone)]
pub struct StatusError {
    /// Status and headers of the response.
    pub meta: ResponseMeta,
    /// The response body, byte for byte.
    pub body: Bytes,
    /// Parsed reason, details and description.
    pub info: ErrorInfo,
    /// Endpoint-specific payload.
    pub kind: StatusErrorKind,
}

impl StatusError {
    /// Classify a response with no endpoint-specific handling.
    pub fn generic(raw: RawResponse) -> Self {
        Self::with_kind(raw, StatusErrorKind::Generic)
    }

    /// Classify a rejected ride request.
    pub fn ride_request(raw: RawResponse) -> Self {
        let cost = serde_json::from_slice::<CostTokenInfo>(&raw.body).ok();
        Self::with_kind(raw, StatusErrorKind::RideRequest { cost })
    }

    /// Classify a rejected cancellation.
    pub fn cancel_ride(raw: RawResponse) -> Self {
        let fee = serde_json::from_slice::<CancellationFee>(&raw.body).ok();
        Self::with_kind(raw, StatusErrorKind::CancelRide { fee })
    }

    fn with_kind(raw: RawResponse, kind: StatusErrorKind) -> Self {
        let info = ErrorInfo::parse(&raw.meta.headers, &raw.body);
        tracing::debug!(
            status = raw.meta.status.as_u16(),
            reason = %info.reason,
            "classified error response"
        );
        Self {
            meta: raw.meta,
            body: raw.body,
            info,
            kind,
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.meta.status
    }

    /// The reason slug, possibly empty.
    pub fn reason(&self) -> &str {
        &self.info.reason
    }

    /// The description, possibly empty.
    pub fn description(&self) -> &str {
        &self.info.description
    }

    /// Status 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == StatusCode::TOO_MANY_REQUESTS
    }

    /// Heuristic token-expiry check; see [`token_expired`].
    pub fn is_token_expired(&self) -> bool {
        token_expired(self.status(), &self.body, &self.info.reason)
    }

    /// Cost confirmation details, for a rejected ride request.
    pub fn cost_token_info(&self) -> Option<&CostTokenInfo> {
        match &self.kind {
            StatusErrorKind::RideRequest { cost } => cost.as_ref(),
            _ => None,
        }
    }

    /// Fee details, for a rejected cancellation.
    pub fn cancellation_fee(&self) -> Option<&CancellationFee> {
        match &self.kind {
            StatusErrorKind::CancelRide { fee } => fee.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = self.info.reason.as_str();
        let description = self.info.description.as_str();
        let fallback = match self.kind {
            StatusErrorKind::Generic => {
                return if reason.is_empty() {
                    write!(f, "status code={}", self.status().as_u16())
                } else {
                    write!(f, "{reason}: status code={}", self.status().as_u16())
                };
            }
            StatusErrorKind::RideRequest { .. } => "<ride request error>",
            StatusErrorKind::CancelRide { .. } => "<cancel ride error>",
        };
        match (reason.is_empty(), description.is_empty()) {
            (false, false) => write!(f, "{reason}: {description}"),
            (false, true) => f.write_str(reason),
            (true, false) => f.write_str(description),
            (true, true) => f.write_str(fallback),
        }
    }
}

impl std::error::Error for StatusError {}

/// Whether a response indicates an expired access token.
///
/// The API has no canonical signal for this: a 401 with an empty body or a
/// `token_expired` reason is treated as expiry. Expect false negatives.
pub fn token_expired(status: StatusCode, body: &[u8], reason: &str) -> bool {
    (status == StatusCode::UNAUTHORIZED && body.is_empty()) || reason == TOKEN_EXPIRED
}
