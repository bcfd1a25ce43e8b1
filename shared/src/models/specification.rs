//! Specification models and result judging

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Verdict;

/// Acceptance criteria for one test parameter of a raw material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specification {
    pub id: Uuid,
    pub material_id: Uuid,
    pub parameter: String,
    pub method: Option<String>,
    pub unit: Option<String>,
    pub lower_limit: Option<Decimal>,
    pub upper_limit: Option<Decimal>,
    pub textual_limit: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The kind of limit a specification carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit<'a> {
    /// Exact text, compared trimmed and case-insensitively
    Textual(&'a str),
    /// Inclusive range; a missing bound is unbounded on that side
    Numeric {
        lower: Option<Decimal>,
        upper: Option<Decimal>,
    },
}

impl Specification {
    /// A textual limit takes precedence over numeric bounds
    pub fn limit(&self) -> Limit<'_> {
        match self.textual_limit.as_deref() {
            Some(text) => Limit::Textual(text),
            None => Limit::Numeric {
                lower: self.lower_limit,
                upper: self.upper_limit,
            },
        }
    }

    /// Judge submitted values against this specification alone
    pub fn accepts(&self, numeric_value: Option<Decimal>, textual_value: Option<&str>) -> Verdict {
        self.limit().accepts(numeric_value, textual_value)
    }
}

impl Limit<'_> {
    pub fn accepts(&self, numeric_value: Option<Decimal>, textual_value: Option<&str>) -> Verdict {
        let passed = match *self {
            Limit::Textual(expected) => textual_value
                .map(|actual| actual.trim().to_lowercase() == expected.trim().to_lowercase())
                .unwrap_or(false),
            Limit::Numeric { lower, upper } => numeric_value
                .map(|value| {
                    lower.map_or(true, |lower| lower <= value)
                        && upper.map_or(true, |upper| value <= upper)
                })
                .unwrap_or(false),
        };

        if passed {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Judge a submitted result against the specifications found for its parameter.
///
/// The first specification whose parameter matches wins; any further
/// specifications for the same parameter are ignored. A parameter with no
/// specification cannot pass.
pub fn judge(
    parameter: &str,
    numeric_value: Option<Decimal>,
    textual_value: Option<&str>,
    matching_specs: &[Specification],
) -> Verdict {
    matching_specs
        .iter()
        .find(|spec| spec.parameter == parameter)
        .map(|spec| spec.accepts(numeric_value, textual_value))
        .unwrap_or(Verdict::Fail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(lower: Option<i64>, upper: Option<i64>) -> Specification {
        Specification {
            id: Uuid::new_v4(),
            material_id: Uuid::nil(),
            parameter: "Assay".to_string(),
            method: Some("HPLC".to_string()),
            unit: Some("%".to_string()),
            lower_limit: lower.map(Decimal::from),
            upper_limit: upper.map(Decimal::from),
            textual_limit: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn open_lower_bound() {
        let spec = numeric(None, Some(2));
        assert_eq!(spec.accepts(Some(Decimal::from(-50)), None), Verdict::Pass);
        assert_eq!(spec.accepts(Some(Decimal::new(21, 1)), None), Verdict::Fail);
    }

    #[test]
    fn open_upper_bound() {
        let spec = numeric(Some(98), None);
        assert_eq!(spec.accepts(Some(Decimal::from(1000)), None), Verdict::Pass);
        assert_eq!(spec.accepts(Some(Decimal::new(979, 1)), None), Verdict::Fail);
    }

    #[test]
    fn textual_limit_wins_over_bounds() {
        let mut spec = numeric(Some(0), Some(1));
        spec.textual_limit = Some("Complies".to_string());
        assert!(matches!(spec.limit(), Limit::Textual("Complies")));
        assert_eq!(spec.accepts(Some(Decimal::ZERO), None), Verdict::Fail);
    }

    #[test]
    fn other_parameters_are_not_matches() {
        let spec = numeric(Some(98), Some(102));
        assert_eq!(
            judge("pH", Some(Decimal::from(100)), None, &[spec]),
            Verdict::Fail
        );
    }
}
