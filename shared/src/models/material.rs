//! Raw material models and the material status lifecycle

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Verdict;

/// A received consignment of raw material awaiting QC release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterial {
    pub id: Uuid,
    pub material_code: String,
    pub material_name: String,
    pub lot_no: String,
    pub vendor: Option<String>,
    pub received_qty: Decimal,
    pub unit: String,
    pub received_date: DateTime<Utc>,
    pub status: MaterialStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// QC status of a raw material
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MaterialStatus {
    PendingSampling,
    Sampled,
    Testing,
    Pass,
    Fail,
}

/// Events that move a material through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    SampleTaken,
    ResultRecorded,
    CoaIssued(Verdict),
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::SampleTaken => write!(f, "sample taken"),
            LifecycleEvent::ResultRecorded => write!(f, "result recorded"),
            LifecycleEvent::CoaIssued(verdict) => write!(f, "COA issued ({})", verdict),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply '{event}' to a material in status '{from}'")]
pub struct TransitionError {
    pub from: MaterialStatus,
    pub event: LifecycleEvent,
}

impl MaterialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialStatus::PendingSampling => "pending_sampling",
            MaterialStatus::Sampled => "sampled",
            MaterialStatus::Testing => "testing",
            MaterialStatus::Pass => "pass",
            MaterialStatus::Fail => "fail",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_sampling" => Some(MaterialStatus::PendingSampling),
            "sampled" => Some(MaterialStatus::Sampled),
            "testing" => Some(MaterialStatus::Testing),
            "pass" => Some(MaterialStatus::Pass),
            "fail" => Some(MaterialStatus::Fail),
            _ => None,
        }
    }

    /// Pass and Fail are terminal, though a regenerated COA may overwrite one
    /// with the other.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MaterialStatus::Pass | MaterialStatus::Fail)
    }

    /// Apply a lifecycle event, returning the next status.
    ///
    /// Statuses never move backwards: a second sample on an already tested
    /// material, or a new result after certification, leaves the status as
    /// is until the next COA re-derives it.
    pub fn apply(self, event: LifecycleEvent) -> Result<MaterialStatus, TransitionError> {
        use MaterialStatus::*;

        match (self, event) {
            (PendingSampling, LifecycleEvent::SampleTaken) => Ok(Sampled),
            (status, LifecycleEvent::SampleTaken) => Ok(status),
            (Sampled, LifecycleEvent::ResultRecorded) => Ok(Testing),
            (Testing | Pass | Fail, LifecycleEvent::ResultRecorded) => Ok(self),
            (Testing | Pass | Fail, LifecycleEvent::CoaIssued(verdict)) => Ok(verdict.into()),
            (from, event) => Err(TransitionError { from, event }),
        }
    }
}

impl From<Verdict> for MaterialStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => MaterialStatus::Pass,
            Verdict::Fail => MaterialStatus::Fail,
        }
    }
}

impl std::fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialStatus::PendingSampling => write!(f, "Pending Sampling"),
            MaterialStatus::Sampled => write!(f, "Sampled"),
            MaterialStatus::Testing => write!(f, "Testing"),
            MaterialStatus::Pass => write!(f, "Pass"),
            MaterialStatus::Fail => write!(f, "Fail"),
        }
    }
}

/// Material counts per status for the QC dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusSummary {
    pub pending_sampling: u64,
    pub sampled: u64,
    pub testing: u64,
    pub passed: u64,
    pub failed: u64,
}

impl StatusSummary {
    pub fn record(&mut self, status: MaterialStatus, count: u64) {
        match status {
            MaterialStatus::PendingSampling => self.pending_sampling += count,
            MaterialStatus::Sampled => self.sampled += count,
            MaterialStatus::Testing => self.testing += count,
            MaterialStatus::Pass => self.passed += count,
            MaterialStatus::Fail => self.failed += count,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending_sampling + self.sampled + self.testing + self.passed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let status = MaterialStatus::PendingSampling
            .apply(LifecycleEvent::SampleTaken)
            .and_then(|s| s.apply(LifecycleEvent::ResultRecorded))
            .and_then(|s| s.apply(LifecycleEvent::CoaIssued(Verdict::Pass)));
        assert_eq!(status, Ok(MaterialStatus::Pass));
    }

    #[test]
    fn cannot_test_before_sampling() {
        let err = MaterialStatus::PendingSampling
            .apply(LifecycleEvent::ResultRecorded)
            .unwrap_err();
        assert_eq!(err.from, MaterialStatus::PendingSampling);
    }

    #[test]
    fn cannot_certify_untested_material() {
        assert!(MaterialStatus::Sampled
            .apply(LifecycleEvent::CoaIssued(Verdict::Pass))
            .is_err());
        assert!(MaterialStatus::PendingSampling
            .apply(LifecycleEvent::CoaIssued(Verdict::Fail))
            .is_err());
    }

    #[test]
    fn regenerated_coa_overwrites_terminal_status() {
        assert_eq!(
            MaterialStatus::Fail.apply(LifecycleEvent::CoaIssued(Verdict::Pass)),
            Ok(MaterialStatus::Pass)
        );
    }

    #[test]
    fn never_moves_backwards() {
        assert_eq!(
            MaterialStatus::Testing.apply(LifecycleEvent::SampleTaken),
            Ok(MaterialStatus::Testing)
        );
        assert_eq!(
            MaterialStatus::Pass.apply(LifecycleEvent::ResultRecorded),
            Ok(MaterialStatus::Pass)
        );
    }

    #[test]
    fn storage_names_round_trip() {
        for status in [
            MaterialStatus::PendingSampling,
            MaterialStatus::Sampled,
            MaterialStatus::Testing,
            MaterialStatus::Pass,
            MaterialStatus::Fail,
        ] {
            assert_eq!(MaterialStatus::from_str(status.as_str()), Some(status));
        }
    }
}
