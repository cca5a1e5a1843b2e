//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap their JSON in prose or code fences, so the object is
//! located first and then validated field by field.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::Category;

use super::types::ParsedTransaction;

/// Message carried by every structural validation failure
pub const INVALID_STRUCTURE: &str = "Invalid JSON structure from API";

/// Locate the outermost JSON object in a response
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::Transport(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response, 200)
        ))),
    }
}

/// Parse and validate a structured transaction from an AI response
///
/// Every field must be present and truthy: a missing key, `null`, an empty
/// string or an amount of `0` are all rejected. Amounts must also be
/// positive and finite. Numeric strings are accepted for the amount.
pub fn parse_transaction_response(response: &str) -> Result<ParsedTransaction> {
    let json_str = extract_json_object(response)?;
    let value: Value = serde_json::from_str(json_str)?;

    let description = non_empty_str(&value, "description")?;
    let category = non_empty_str(&value, "category")?;
    let amount = amount_field(&value)?;

    if amount < 0.0 || !amount.is_finite() {
        return Err(Error::Validation(format!(
            "Amount must be a positive number, got {}",
            amount
        )));
    }

    Ok(ParsedTransaction {
        description: description.trim().to_string(),
        amount,
        category: Category::coerce(category),
    })
}

/// Accept any non-empty generated text as a summary, unchanged
pub fn parse_summary_response(response: &str) -> Result<String> {
    if response.is_empty() {
        return Err(Error::Transport("Empty summary from AI".into()));
    }
    Ok(response.to_string())
}

fn non_empty_str<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    match value.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(missing(field)),
    }
}

fn amount_field(value: &Value) -> Result<f64> {
    let amount = match value.get("amount") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
        _ => None,
    };

    match amount {
        // Zero is falsy and treated as absent
        Some(a) if a != 0.0 => Ok(a),
        _ => Err(missing("amount")),
    }
}

fn missing(field: &str) -> Error {
    tracing::debug!(field, "Structured AI response failed validation");
    Error::Validation(INVALID_STRUCTURE.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
