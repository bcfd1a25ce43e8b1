//! Validation utilities for Pharma QC Records
//!
//! Input checks applied before any QC record is written.

use std::str::FromStr;

use rust_decimal::Decimal;

// ============================================================================
// Raw Material Validations
// ============================================================================

/// Validate material code format (1-20 chars, uppercase alphanumeric or '-')
pub fn validate_material_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("Material code is required");
    }
    if code.len() > 20 {
        return Err("Material code must be at most 20 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Material code must be uppercase alphanumeric");
    }
    Ok(())
}

/// Validate received quantity is positive
pub fn validate_received_quantity(qty: Decimal) -> Result<(), &'static str> {
    if qty <= Decimal::ZERO {
        return Err("Received quantity must be greater than zero");
    }
    Ok(())
}

/// Validate a free-text field is present
pub fn validate_required(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Value cannot be empty");
    }
    Ok(())
}

// ============================================================================
// Specification Validations
// ============================================================================

/// Validate that a specification carries either numeric bounds or a textual
/// limit, and that numeric bounds are ordered.
pub fn validate_spec_limits(
    lower: Option<Decimal>,
    upper: Option<Decimal>,
    textual: Option<&str>,
) -> Result<(), &'static str> {
    if let Some(text) = textual {
        if lower.is_some() || upper.is_some() {
            return Err("Specification cannot have both numeric and textual limits");
        }
        if text.trim().is_empty() {
            return Err("Textual limit cannot be empty");
        }
        return Ok(());
    }

    if let (Some(lower), Some(upper)) = (lower, upper) {
        if lower > upper {
            return Err("Lower limit cannot exceed upper limit");
        }
    }
    Ok(())
}

// ============================================================================
// Result Validations
// ============================================================================

/// Parse a submitted numeric measurement ("6.0", " 102 ", "1e-3")
pub fn parse_measurement(raw: &str) -> Result<Decimal, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Result value cannot be empty");
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| "Result value must be a number")
}

/// Exactly one of a numeric or textual result must be submitted
pub fn validate_result_values(
    numeric: Option<&str>,
    textual: Option<&str>,
) -> Result<(), &'static str> {
    let has_numeric = numeric.map_or(false, |v| !v.trim().is_empty());
    let has_textual = textual.map_or(false, |v| !v.trim().is_empty());

    match (has_numeric, has_textual) {
        (true, false) | (false, true) => Ok(()),
        (false, false) => Err("Either a numeric or a textual result is required"),
        (true, true) => Err("Submit either a numeric or a textual result, not both"),
    }
}
