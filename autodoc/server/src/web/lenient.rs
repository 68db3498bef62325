//! Deserializers for form-ish JSON fields.
//!
//! Browser forms post ids as strings, send `""` for an unselected option and
//! sometimes plain numbers. All of these map onto `Option<T>`, with empty
//! values reading as absent.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw<T> {
    Value(T),
    Text(String),
}

/// Reads `null`, `""`, `"12"` or `12` into an optional value.
pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Value(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|err| D::Error::custom(format!("invalid value '{text}': {err}"))),
    }
}

/// Reads an optional ISO-8601 timestamp, treating `""` as absent.
pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => autodoc_core::model::parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{text}'"))),
    }
}
