//! Value comparison helpers for the row-set evaluator.
//!
//! - is_numeric / as_numeric: numbers and numeric strings
//! - compare_values: ordering with the numeric-iff-both-numeric tie-break
//! - values_equal_ci: equality with case-insensitive strings
//! - like_to_regex / matches_like: SQL wildcard matching
//!
//! Case folding is ASCII-only throughout; the data this crate targets is
//! ASCII-oriented and multi-byte folding is out of scope.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use crate::row::value_to_text;

/// True for numbers and for strings that parse as a number.
#[inline]
pub fn is_numeric(value: &Value) -> bool {
    as_numeric(value).is_some()
}

/// Numeric view of a value: numbers directly, numeric strings parsed.
#[inline]
pub fn as_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Compare two values for ordering.
///
/// Numeric comparison applies only when BOTH operands are numeric (numbers
/// or numeric strings); otherwise both sides are string-cast and compared
/// lexically. This exact tie-break drives ORDER BY and the range operators
/// on mixed-type columns.
#[inline]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (as_numeric(a), as_numeric(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_to_text(a).cmp(&value_to_text(b)),
    }
}

/// Equality: case-insensitive for two strings, numeric when both sides are
/// numeric, strict JSON equality otherwise.
#[inline]
pub fn values_equal_ci(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.eq_ignore_ascii_case(y),
        _ => match (as_numeric(a), as_numeric(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

/// Translate a SQL LIKE pattern to an anchored regex: `%` matches any
/// sequence, `_` any single character, regex metacharacters are escaped.
pub fn like_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    // Bounded pattern size guards against pathological inputs
    if pattern.len() > 1000 {
        return Err(regex::Error::Syntax(
            "Pattern too long (max 1000 chars)".to_string(),
        ));
    }
    let mut regex_pattern = String::with_capacity(pattern.len() + 8);
    regex_pattern.push_str("(?i)^");
    for c in pattern.chars() {
        match c {
            '%' => regex_pattern.push_str(".*"),
            '_' => regex_pattern.push('.'),
            '^' | '$' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
            | '\\' => {
                regex_pattern.push('\\');
                regex_pattern.push(c);
            }
            _ => regex_pattern.push(c),
        }
    }
    regex_pattern.push('$');
    Regex::new(&regex_pattern)
}

/// Match a value against a LIKE pattern. An uncompilable pattern matches
/// nothing.
pub fn matches_like(value: &Value, pattern: &str) -> bool {
    let text = value_to_text(value);
    match like_to_regex(pattern) {
        Ok(re) => re.is_match(&text),
        Err(_) => false,
    }
}
