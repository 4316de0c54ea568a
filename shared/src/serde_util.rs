//! Serde helpers for the remote service's wire format
//!
//! The hosted row store returns `numeric` columns as decimal strings.
//! All coercion to `f64` happens here, at response-decode time, so call
//! sites never deal with raw string numbers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an `f64` from either a JSON number or a decimal string.
pub fn f64_from_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of f64 range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid decimal string: {s:?}"))),
        other => Err(serde::de::Error::custom(format!(
            "expected number or decimal string, got {other}"
        ))),
    }
}

/// Deserialize an optional `f64`, treating `null` and missing as `None`.
pub fn opt_f64_from_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("number out of f64 range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid decimal string: {s:?}"))),
        other => Err(serde::de::Error::custom(format!(
            "expected number, decimal string or null, got {other}"
        ))),
    }
}
