//! Field-to-value filter criteria with loose equality matching.
//!
//! # Responsibility
//! - Hold caller criteria as a flat JSON field map.
//! - Decide whether one record matches, comparing values the way the web
//!   front end compared them (`==`, not `===`).
//!
//! # Invariants
//! - Null criteria values impose no constraint.
//! - A field missing from the record never matches a non-null criterion.
//! - Arrays and objects are never equal to each other.

use crate::model::record::FieldMap;
use serde_json::Value;

/// Criteria for `EntityStore::filter`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    fields: FieldMap,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one `field == value` constraint, replacing any earlier one.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn from_map(fields: FieldMap) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Value::is_null)
    }

    /// Returns whether the flattened `record` satisfies every constraint.
    pub fn matches(&self, record: &FieldMap) -> bool {
        self.fields.iter().all(|(key, expected)| {
            if expected.is_null() {
                return true;
            }
            record
                .get(key)
                .is_some_and(|actual| loose_eq(actual, expected))
        })
    }
}

/// Type-coercing equality over JSON values.
///
/// Numbers and numeric strings compare numerically (including unsigned
/// `0x`/`0o`/`0b` literals), booleans coerce to 1/0, arrays coerce to their
/// comma-joined string form when compared with a primitive.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_eq(a.as_f64(), b.as_f64()),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            numbers_eq(n.as_f64(), string_to_number(s))
        }
        (Value::Bool(b), other) | (other, Value::Bool(b)) => {
            loose_eq(&Value::from(if *b { 1 } else { 0 }), other)
        }
        (Value::Array(items), primitive @ (Value::String(_) | Value::Number(_)))
        | (primitive @ (Value::String(_) | Value::Number(_)), Value::Array(items)) => {
            loose_eq(&Value::String(join_array(items)), primitive)
        }
        _ => false,
    }
}

fn numbers_eq(left: Option<f64>, right: Option<f64>) -> bool {
    match (left, right) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn string_to_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if let Some(value) = radix_literal(trimmed) {
        return value;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.contains("inf") || lowered.contains("nan") {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Unsigned `0x`/`0o`/`0b` literal. `Some(None)` marks a prefixed string
/// that is not a valid number; `None` means no radix prefix.
fn radix_literal(value: &str) -> Option<Option<f64>> {
    let radix = match value.get(..2)?.to_ascii_lowercase().as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    let digits = &value[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(None);
    }
    Some(u128::from_str_radix(digits, radix).ok().map(|n| n as f64))
}

fn join_array(items: &[Value]) -> String {
    items
        .iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(",")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", f as i64),
            Some(f) => f.to_string(),
            None => n.to_string(),
        },
        Value::Array(items) => join_array(items),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
