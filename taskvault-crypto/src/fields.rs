//! Typed plaintext encodings for encrypted task fields.
//!
//! Each field type has a canonical byte encoding that the cipher seals:
//! text is UTF-8 verbatim, integers are decimal ASCII, booleans are `"1"`
//! or `"0"`, timestamps are RFC 3339 with timezone. Optional types reserve
//! a sentinel token for the absent value; required types have no null form,
//! so the sentinel is just an ordinary (if unlucky) value for them.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{CryptoError, CryptoResult};

/// Reserved plaintext marking an absent optional value.
pub const NULL_SENTINEL: &str = "__NULL__";

fn utf8(plaintext: &[u8], expected: &'static str) -> CryptoResult<String> {
    String::from_utf8(plaintext.to_vec()).map_err(|e| CryptoError::TypeMismatch {
        expected,
        detail: e.to_string(),
    })
}

/// Encodes required text. Any string is valid, including the sentinel and
/// the empty string.
pub fn encode_text(value: &str) -> String {
    value.to_string()
}

pub fn decode_text(plaintext: &[u8]) -> CryptoResult<String> {
    utf8(plaintext, "text")
}

/// Encodes optional text, using the sentinel for `None`.
///
/// A present value equal to the sentinel is rejected with
/// [`CryptoError::SentinelCollision`]; storing it would silently decode as
/// `None` later.
pub fn encode_opt_text(value: Option<&str>) -> CryptoResult<String> {
    match value {
        None => Ok(NULL_SENTINEL.to_string()),
        Some(s) if s == NULL_SENTINEL => Err(CryptoError::SentinelCollision),
        Some(s) => Ok(s.to_string()),
    }
}

pub fn decode_opt_text(plaintext: &[u8]) -> CryptoResult<Option<String>> {
    let text = utf8(plaintext, "text")?;
    if text == NULL_SENTINEL {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

/// Encodes an integer as decimal ASCII.
pub fn encode_int(value: i64) -> String {
    value.to_string()
}

pub fn decode_int(plaintext: &[u8]) -> CryptoResult<i64> {
    let text = utf8(plaintext, "integer")?;
    text.parse::<i64>().map_err(|e| CryptoError::TypeMismatch {
        expected: "integer",
        detail: e.to_string(),
    })
}

/// Encodes a boolean as `"1"` or `"0"`.
pub fn encode_bool(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// Decodes a boolean, accepting exactly `"1"` or `"0"`.
///
/// Anything else is a [`CryptoError::TypeMismatch`], never coerced to
/// `false`.
pub fn decode_bool(plaintext: &[u8]) -> CryptoResult<bool> {
    let text = utf8(plaintext, "boolean")?;
    match text.as_str() {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(CryptoError::TypeMismatch {
            expected: "boolean",
            detail: "expected \"1\" or \"0\"".to_string(),
        }),
    }
}

/// Encodes an optional timestamp as RFC 3339 with timezone, using the
/// sentinel for `None`. Sub-second precision is preserved.
pub fn encode_opt_timestamp(value: Option<DateTime<Utc>>) -> String {
    match value {
        None => NULL_SENTINEL.to_string(),
        Some(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    }
}

pub fn decode_opt_timestamp(plaintext: &[u8]) -> CryptoResult<Option<DateTime<Utc>>> {
    let text = utf8(plaintext, "timestamp")?;
    if text == NULL_SENTINEL {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| Some(ts.with_timezone(&Utc)))
        .map_err(|e| CryptoError::TypeMismatch {
            expected: "timestamp",
            detail: e.to_string(),
        })
}
