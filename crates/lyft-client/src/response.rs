//! Buffered responses and response metadata.
//!
//! Every response body is read to completion as soon as the round trip
//! finishes, so the connection is always released no matter how the body is
//! interpreted afterwards.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result, StatusError};

/// Header carrying the request identifier assigned by the API.
pub const REQUEST_ID_HEADER: &str = "Request-ID";

/// Header carrying the number of requests left in the current window.
pub const RATE_REMAINING_HEADER: &str = "X-Ratelimit-Remaining";

/// Header carrying the size of the current rate-limit window.
pub const RATE_LIMIT_HEADER: &str = "X-Ratelimit-Limit";

/// Status line and headers of a completed round trip.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
}

impl ResponseMeta {
    /// Create metadata from a status and header map.
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// Value of the `Request-ID` header.
    pub fn request_id(&self) -> Option<&str> {
        request_id(&self.headers)
    }

    /// Value of `X-Ratelimit-Remaining`, if present and an integer.
    pub fn rate_remaining(&self) -> Option<i64> {
        rate_remaining(&self.headers)
    }

    /// Value of `X-Ratelimit-Limit`, if present and an integer.
    pub fn rate_limit(&self) -> Option<i64> {
        rate_limit(&self.headers)
    }
}

/// Value of the `Request-ID` header.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(REQUEST_ID_HEADER)?.to_str().ok()
}

/// Value of `X-Ratelimit-Remaining`, if present and an integer.
pub fn rate_remaining(headers: &HeaderMap) -> Option<i64> {
    int_header(headers, RATE_REMAINING_HEADER)
}

/// Value of `X-Ratelimit-Limit`, if present and an integer.
pub fn rate_limit(headers: &HeaderMap) -> Option<i64> {
    int_header(headers, RATE_LIMIT_HEADER)
}

fn int_header(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

/// A decoded successful response together with its metadata.
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded payload.
    pub data: T,
    /// Status and headers of the response.
    pub meta: ResponseMeta,
}

impl<T> Response<T> {
    /// Discard the metadata and keep the payload.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Transform the payload, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: f(self.data),
            meta: self.meta,
        }
    }
}

/// A response whose body has been fully read into memory.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Status and headers.
    pub meta: ResponseMeta,
    /// The complete response body.
    pub body: Bytes,
}

impl RawResponse {
    /// Read a `reqwest` response to completion.
    pub async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            meta: ResponseMeta::new(status, headers),
            body,
        })
    }

    /// The response status code.
    pub fn status(&self) -> StatusCode {
        self.meta.status
    }

    /// Decode the body as JSON.
    ///
    /// On failure the metadata travels with the error so diagnostic headers
    /// are not lost.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Response<T>> {
        match serde_json::from_slice(&self.body) {
            Ok(data) => Ok(Response {
                data,
                meta: self.meta,
            }),
            Err(source) => Err(Error::Decode {
                source,
                meta: Box::new(self.meta),
            }),
        }
    }

    /// Decode the body if the status matches `expected`, otherwise classify
    /// the response as a generic [`StatusError`].
    pub fn expect<T: DeserializeOwned>(self, expected: StatusCode) -> Result<Response<T>> {
        if self.status() == expected {
            self.decode()
        } else {
            Err(StatusError::generic(self).into())
        }
    }

    /// Succeed without a payload if the status matches `expected`.
    pub fn expect_empty(self, expected: StatusCode) -> Result<Response<()>> {
        if self.status() == expected {
            Ok(Response {
                data: (),
                meta: self.meta,
            })
        } else {
            Err(StatusError::generic(self).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            let name = HeaderName::from_bytes(k.as_bytes()).unwrap();
            map.append(name, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_rate_remaining_present() {
        let h = headers(&[("X-Ratelimit-Remaining", "42")]);
        assert_eq!(rate_remaining(&h), Some(42));
    }

    #[test]
    fn test_rate_remaining_missing() {
        assert_eq!(rate_remaining(&HeaderMap::new()), None);
    }

    #[test]
    fn test_rate_limit_not_an_integer() {
        let h = headers(&[("X-Ratelimit-Limit", "lots")]);
        assert_eq!(rate_limit(&h), None);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let h = headers(&[("x-ratelimit-limit", "100"), ("request-id", "abc-123")]);
        assert_eq!(rate_limit(&h), Some(100));
        assert_eq!(request_id(&h), Some("abc-123"));
    }

    #[test]
    fn test_decode_failure_keeps_headers() {
        let raw = RawResponse {
            meta: ResponseMeta::new(StatusCode::OK, headers(&[("Request-ID", "r-1")])),
            body: Bytes::from_static(b"not json"),
        };
        let err = raw.decode::<serde_json::Value>().unwrap_err();
        match err {
            Error::Decode { meta, .. } => assert_eq!(meta.request_id(), Some("r-1")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_expect_wrong_status_is_status_error() {
        let raw = RawResponse {
            meta: ResponseMeta::new(StatusCode::NOT_FOUND, HeaderMap::new()),
            body: Bytes::from_static(br#"{"error":"not_found"}"#),
        };
        let err = raw.expect::<serde_json::Value>(StatusCode::OK).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not_found: status code=404");
    }
}
