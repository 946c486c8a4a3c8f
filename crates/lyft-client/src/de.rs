//! Serde helpers for the API's unit and format conventions.
//!
//! The wire format reports durations as seconds (sometimes as a number,
//! sometimes as a string), timestamps as RFC 3339 strings that may be empty,
//! and OAuth scopes as a single space-delimited string.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Layout used for query-string timestamps (`YYYY-MM-DDTHH:MM:SSZ`).
pub const QUERY_TIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format a timestamp for a query string, in UTC.
pub fn format_query_time(time: &DateTime<Utc>) -> String {
    time.format(QUERY_TIME_LAYOUT).to_string()
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|t| t.with_timezone(&Utc))
}

/// Format a timestamp the way the API emits it.
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn seconds_to_duration<E: serde::de::Error>(secs: f64) -> Result<Duration, E> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| E::custom(format!("invalid duration in seconds: {secs}")))
}

/// Numeric seconds to a `Duration`. `null` decodes as zero.
pub fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(secs) => seconds_to_duration(secs),
        None => Ok(Duration::ZERO),
    }
}

/// Optional numeric seconds to a `Duration`.
pub fn opt_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(seconds_to_duration)
        .transpose()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SecondsRepr {
    Text(String),
    Whole(i64),
}

/// Seconds encoded as a base-10 integer string.
///
/// An empty string or `null` means the field is absent. A bare JSON integer
/// is accepted as well.
pub fn string_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = match Option::<SecondsRepr>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(SecondsRepr::Text(text)) if text.is_empty() => return Ok(None),
        Some(SecondsRepr::Text(text)) => text
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("invalid seconds string: {text:?}")))?,
        Some(SecondsRepr::Whole(secs)) => secs,
    };
    u64::try_from(secs)
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| D::Error::custom(format!("negative duration: {secs}")))
}

/// Serialize a `Duration` as seconds in the API's format: an integer when
/// whole, a fraction otherwise.
pub fn serialize_seconds<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.subsec_nanos() == 0 {
        serializer.serialize_u64(value.as_secs())
    } else {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

/// Optional counterpart of [`serialize_seconds`]; `None` becomes `null`.
pub fn serialize_opt_seconds<S>(
    value: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(value) => serialize_seconds(value, serializer),
        None => serializer.serialize_none(),
    }
}

/// RFC 3339 timestamp where an empty string means "not present".
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(text) if text.is_empty() => Ok(None),
        Some(text) => parse_time(&text)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid timestamp {text:?}: {e}"))),
    }
}

/// Space-delimited scope list to an ordered list of scopes.
pub fn scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(split_scopes(&text))
}

/// Split a space-delimited scope string, preserving order.
pub fn split_scopes(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Decode `null` as the type's default value.
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// (De)serialize a `Duration` as whole seconds.
pub mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
