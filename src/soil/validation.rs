//! Input validation for soil analysis requests.
//!
//! Request bodies arrive loosely typed: numeric fields may be JSON numbers or
//! numeric strings. Everything is coerced here, once, before any engine runs.

use serde_json::Value;
use thiserror::Error;

use super::models::SoilType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field '{field}' must be numeric, got {value}")]
    NotNumeric { field: &'static str, value: String },

    #[error("Field '{field}' must be an integer, got {value}")]
    NotInteger { field: &'static str, value: String },

    #[error("Unknown soil type '{0}', expected one of Loamy, Clay, Sandy, Silty")]
    UnknownSoilType(String),

    #[error("Field '{field}' must be between {min} and {max}, got {value}")]
    InvalidLimit {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Coerces an optional JSON value into a finite `f64`.
///
/// `None` stays `None`; JSON `null` never reaches here since serde maps it to
/// `None` already.
pub fn coerce_number(field: &'static str, value: Option<&Value>) -> ValidationResult<Option<f64>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(ValidationError::NotNumeric {
            field,
            value: value.to_string(),
        }),
    }
}

/// Coerces an optional JSON value into an `i64`.
pub fn coerce_integer(field: &'static str, value: Option<&Value>) -> ValidationResult<Option<i64>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.map(Some).ok_or_else(|| ValidationError::NotInteger {
        field,
        value: value.to_string(),
    })
}

pub fn parse_soil_type(value: Option<&str>) -> ValidationResult<Option<SoilType>> {
    match value {
        None => Ok(None),
        Some(raw) => SoilType::parse(raw)
            .map(Some)
            .ok_or_else(|| ValidationError::UnknownSoilType(raw.to_string())),
    }
}

/// Returns the trimmed text, failing if it is absent or blank.
pub fn require_text<'a>(field: &'static str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ValidationError::MissingField(field)),
    }
}

pub fn check_range(
    field: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> ValidationResult<usize> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidLimit {
            field,
            value,
            min,
            max,
        })
    }
}
