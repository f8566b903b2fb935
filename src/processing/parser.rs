//! Text parsers for image metadata values
//!
//! XMP and EXIF values arrive as strings. Rationals use the `n/d` form
//! (`"672/100"`); coordinates are decimal strings that are read exactly and
//! then rounded to a fixed number of significant digits.

use thiserror::Error;

/// Errors raised while parsing a single metadata value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueParseError {
    #[error("value is empty")]
    Empty,

    #[error("not a number: {text}")]
    InvalidNumber { text: String },

    #[error("zero denominator in {text}")]
    ZeroDenominator { text: String },

    #[error("value is not finite: {text}")]
    NonFinite { text: String },

    #[error("precision must be at least one significant digit")]
    InvalidPrecision,
}

fn parse_number(text: &str) -> Result<f64, ValueParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValueParseError::Empty);
    }
    let value: f64 = trimmed.parse().map_err(|_| ValueParseError::InvalidNumber {
        text: text.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ValueParseError::NonFinite { text: text.to_string() });
    }
    Ok(value)
}

/// Parse `"n/d"` or a plain decimal
pub fn parse_rational(text: &str) -> Result<f64, ValueParseError> {
    match text.split_once('/') {
        Some((numerator, denominator)) => {
            let n = parse_number(numerator)?;
            let d = parse_number(denominator)?;
            if d == 0.0 {
                return Err(ValueParseError::ZeroDenominator { text: text.to_string() });
            }
            let value = n / d;
            if !value.is_finite() {
                return Err(ValueParseError::NonFinite { text: text.to_string() });
            }
            Ok(value)
        }
        None => parse_number(text),
    }
}

/// Parse a decimal coordinate rounded to `precision` significant digits
pub fn parse_coordinate(text: &str, precision: usize) -> Result<f64, ValueParseError> {
    if precision == 0 {
        return Err(ValueParseError::InvalidPrecision);
    }
    let value = parse_number(text)?;
    Ok(round_significant(value, precision))
}

/// Round to `digits` significant decimal digits
pub fn round_significant(value: f64, digits: usize) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    // The scientific formatter rounds half to even on the exact decimal value
    format!("{:.*e}", digits - 1, value).parse().unwrap_or(value)
}

/// Parse a positive pixel dimension, accepting rational or decimal forms
pub fn parse_dimension(text: &str) -> Result<u32, ValueParseError> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<u32>() {
        return Ok(value);
    }
    let value = parse_rational(trimmed)?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(ValueParseError::InvalidNumber { text: text.to_string() });
    }
    Ok(value as u32)
}
