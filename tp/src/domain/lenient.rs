//! Forgiving field deserializers for model-produced documents
//!
//! Models routinely emit numbers where strings were asked for, a bare string
//! where a list was asked for, or priorities in odd casing. These helpers
//! accept what they can and fall back to the field default otherwise.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::priority::Priority;

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Any scalar as text, anything else as an empty string
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).unwrap_or_default())
}

/// Any non-blank scalar as text, otherwise `None`
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).filter(|s| !s.trim().is_empty()))
}

/// A list of trimmed scalars as text; a single string becomes a one-element list
///
/// Entries are trimmed the same way task names are, so name references match.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Recognized priority names (any case), otherwise medium
pub fn priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| s.parse::<Priority>().ok())
        .unwrap_or_default())
}

/// A required non-blank name
pub fn name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_text(&value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| D::Error::custom("task name must be a non-empty string"))
}
