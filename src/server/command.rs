//! Grant command parsing
//!
//! Two textual forms are accepted on the file channel:
//! - key-value: `"id": 100, "qty": 5` (any order, optional braces)
//! - positional: `100,5` or `100 5`
//!
//! HTTP bodies are strict JSON and go through [`parse_grant_body`].

use crate::inventory::GrantRequest;
use serde::Deserialize;
use thiserror::Error;

/// Why a command was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Malformed command: {0}")]
    Malformed(String),

    #[error("Item id must be positive, got {0}")]
    InvalidId(i64),

    #[error("Quantity cannot be zero")]
    ZeroQuantity,
}

#[derive(Debug, Deserialize)]
struct GrantBody {
    id: i64,
    qty: i64,
}

/// Range-check a raw id/quantity pair
pub fn validate_request(id: i64, qty: i64) -> Result<GrantRequest, ParseError> {
    if id <= 0 {
        return Err(ParseError::InvalidId(id));
    }
    if qty == 0 {
        return Err(ParseError::ZeroQuantity);
    }

    let id = i32::try_from(id).map_err(|_| ParseError::InvalidNumber(id.to_string()))?;
    let qty = i32::try_from(qty).map_err(|_| ParseError::InvalidNumber(qty.to_string()))?;
    Ok(GrantRequest::new(id, qty))
}

/// Parse a JSON body of the form `{"id":<int>,"qty":<int>}`
pub fn parse_grant_body(body: &str) -> Result<GrantRequest, ParseError> {
    let parsed: GrantBody =
        serde_json::from_str(body).map_err(|e| ParseError::Malformed(e.to_string()))?;
    validate_request(parsed.id, parsed.qty)
}

/// Parse one command line in either textual form
pub fn parse_grant_command(line: &str) -> Result<GrantRequest, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    if line.contains("\"id\"") || line.contains("\"qty\"") {
        let id = keyed_value(line, "id")?;
        let qty = keyed_value(line, "qty")?;
        return validate_request(id, qty);
    }

    let (id, qty) = match line.split_once(',') {
        Some((id, qty)) => (id.trim(), qty.trim()),
        None => {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(qty), None) => (id, qty),
                _ => return Err(ParseError::Malformed(line.to_string())),
            }
        }
    };

    validate_request(parse_number(id)?, parse_number(qty)?)
}

/// Integer following `"key"` and a colon
fn keyed_value(line: &str, key: &'static str) -> Result<i64, ParseError> {
    let quoted = format!("\"{}\"", key);
    let start = line.find(&quoted).ok_or(ParseError::MissingField(key))? + quoted.len();

    let rest = line[start..].trim_start();
    let rest = rest
        .strip_prefix(':')
        .ok_or_else(|| ParseError::Malformed(format!("Expected ':' after \"{}\"", key)))?
        .trim_start();

    let end = rest
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    parse_number(&rest[..end])
}

fn parse_number(text: &str) -> Result<i64, ParseError> {
    text.parse::<i64>()
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))
}
