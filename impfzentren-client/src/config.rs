//! Identity configuration
//!
//! The configuration document is either one identity object or an array of
//! them. Both shapes normalize to an ordered `Vec<Identity>`.

use std::path::Path;

use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::types::Identity;

/// Parse a configuration document into identities, in document order.
///
/// # Errors
/// - [`ClientError::ConfigRead`] when `text` is not JSON
/// - [`ClientError::ConfigShape`] for a top-level string, number, bool or null
/// - [`ClientError::InvalidIdentity`] for an entry missing fields or
///   carrying wrong types
pub fn parse_identities(text: &str) -> Result<Vec<Identity>> {
    parse_from(text, "<inline>")
}

/// Read and parse the configuration file at `path`.
pub async fn load_identities(path: impl AsRef<Path>) -> Result<Vec<Identity>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ClientError::ConfigRead {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;

    let identities = parse_from(&text, &path.display().to_string())?;
    log::info!(
        "[config] Loaded {} identit{} from {}",
        identities.len(),
        if identities.len() == 1 { "y" } else { "ies" },
        path.display()
    );
    Ok(identities)
}

fn parse_from(text: &str, source: &str) -> Result<Vec<Identity>> {
    let document: Value = serde_json::from_str(text).map_err(|e| ClientError::ConfigRead {
        path: source.to_string(),
        detail: e.to_string(),
    })?;

    let entries = match document {
        Value::Object(_) => vec![document],
        Value::Array(entries) => entries,
        other => {
            return Err(ClientError::ConfigShape {
                found: json_type_name(&other).to_string(),
            });
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).map_err(|e| ClientError::InvalidIdentity {
                index,
                detail: e.to_string(),
            })
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
