//! WebAssembly module for Pharma QC Records
//!
//! Lets the client preview what the server will decide:
//! - Verdicts for numeric and textual results
//! - The overall COA verdict for a set of results
//! - Accession number formatting

use chrono::NaiveDate;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::{Limit, Verdict, MAX_ACCESSION_SEQUENCE};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::validation::*;

/// Judge a numeric result against an inclusive range. Either bound may be
/// omitted.
#[wasm_bindgen]
pub fn judge_numeric(
    value: &str,
    lower: Option<String>,
    upper: Option<String>,
) -> Result<String, JsValue> {
    numeric_verdict(value, lower.as_deref(), upper.as_deref())
        .map(|v| v.to_string())
        .map_err(|e| JsValue::from_str(&e))
}

/// Judge a textual result against an expected text, ignoring case and
/// surrounding whitespace
#[wasm_bindgen]
pub fn judge_textual(value: &str, limit: &str) -> String {
    Limit::Textual(limit).accepts(None, Some(value)).to_string()
}

/// Overall verdict for an array of "Pass"/"Fail" strings; undefined when
/// the array is empty
#[wasm_bindgen]
pub fn overall_verdict_of(verdicts: js_sys::Array) -> Result<Option<String>, JsValue> {
    let verdicts: Vec<String> = verdicts.iter().filter_map(|v| v.as_string()).collect();
    combine_verdicts(&verdicts)
        .map(|v| v.map(|v| v.to_string()))
        .map_err(|e| JsValue::from_str(&e))
}

/// Accession number for a `YYYY-MM-DD` day and sequence, e.g. `AR-20250101-0001`
#[wasm_bindgen]
pub fn format_accession(day: &str, sequence: u16) -> Result<String, JsValue> {
    accession_for(day, sequence).map_err(|e| JsValue::from_str(&e))
}

fn parse_bound(raw: Option<&str>) -> Result<Option<Decimal>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_measurement(raw).map(Some).map_err(str::to_string),
        None => Ok(None),
    }
}

fn numeric_verdict(value: &str, lower: Option<&str>, upper: Option<&str>) -> Result<Verdict, String> {
    let value = parse_measurement(value).map_err(str::to_string)?;
    let limit = Limit::Numeric {
        lower: parse_bound(lower)?,
        upper: parse_bound(upper)?,
    };
    Ok(limit.accepts(Some(value), None))
}

fn combine_verdicts(verdicts: &[String]) -> Result<Option<Verdict>, String> {
    let parsed = verdicts
        .iter()
        .map(|v| Verdict::from_str(v).ok_or_else(|| format!("Unknown verdict: {}", v)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(overall_verdict(parsed))
}

fn accession_for(day: &str, sequence: u16) -> Result<String, String> {
    let day = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| format!("Invalid day {}: {}", day, e))?;
    if sequence == 0 || sequence > MAX_ACCESSION_SEQUENCE {
        return Err(format!(
            "Sequence must be between 1 and {}",
            MAX_ACCESSION_SEQUENCE
        ));
    }
    Ok(shared::format_accession(day, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_verdict_is_inclusive() {
        assert_eq!(numeric_verdict("102.0", Some("98"), Some("102")), Ok(Verdict::Pass));
        assert_eq!(numeric_verdict("110", Some("98"), Some("102")), Ok(Verdict::Fail));
        assert_eq!(numeric_verdict("-4", None, Some("2")), Ok(Verdict::Pass));
        assert_eq!(numeric_verdict("5", Some(""), None), Ok(Verdict::Pass));
        assert!(numeric_verdict("abc", None, None).is_err());
        assert!(numeric_verdict("1", Some("low"), None).is_err());
    }

    #[test]
    fn test_judge_textual() {
        assert_eq!(judge_textual("  complies ", "Complies"), "Pass");
        assert_eq!(judge_textual("Does not comply", "Complies"), "Fail");
    }

    #[test]
    fn test_combine_verdicts() {
        let all_pass = vec!["Pass".to_string(), "Pass".to_string()];
        let one_fail = vec!["Pass".to_string(), "Fail".to_string()];
        assert_eq!(combine_verdicts(&all_pass), Ok(Some(Verdict::Pass)));
        assert_eq!(combine_verdicts(&one_fail), Ok(Some(Verdict::Fail)));
        assert_eq!(combine_verdicts(&[]), Ok(None));
        assert!(combine_verdicts(&["Maybe".to_string()]).is_err());
    }

    #[test]
    fn test_accession_for() {
        assert_eq!(accession_for("2025-01-01", 1).unwrap(), "AR-20250101-0001");
        assert_eq!(accession_for("2025-12-31", 9999).unwrap(), "AR-20251231-9999");
        assert!(accession_for("2025-01-01", 0).is_err());
        assert!(accession_for("2025-01-01", 10000).is_err());
        assert!(accession_for("01/01/2025", 1).is_err());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn overall_verdict_from_js_array() {
        let verdicts = js_sys::Array::new();
        verdicts.push(&JsValue::from_str("Pass"));
        verdicts.push(&JsValue::from_str("Fail"));
        assert_eq!(overall_verdict_of(verdicts).unwrap(), Some("Fail".to_string()));
        assert_eq!(overall_verdict_of(js_sys::Array::new()).unwrap(), None);
    }
}
