//! Test result models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of judging a result, or of a whole sample's test battery
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "Pass",
            Verdict::Fail => "Fail",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pass" => Some(Verdict::Pass),
            "Fail" => Some(Verdict::Fail),
            _ => None,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single measurement recorded against a sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub sample_id: Uuid,
    pub parameter: String,
    pub result_value: Option<Decimal>,
    pub result_text: Option<String>,
    pub unit: Option<String>,
    pub verdict: Verdict,
    pub tested_by: String,
    pub tested_at: DateTime<Utc>,
}
