//! Certificate of Analysis models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Verdict;

/// Certificate of Analysis for a sample's full test battery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coa {
    pub id: Uuid,
    pub sample_id: Uuid,
    pub overall_verdict: Verdict,
    pub generated_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Roll per-result verdicts up into the sample's overall verdict.
///
/// Returns `None` when there is nothing to certify.
pub fn overall_verdict<I>(verdicts: I) -> Option<Verdict>
where
    I: IntoIterator<Item = Verdict>,
{
    verdicts.into_iter().fold(None, |overall, verdict| {
        match (overall, verdict) {
            (Some(Verdict::Fail), _) | (_, Verdict::Fail) => Some(Verdict::Fail),
            _ => Some(Verdict::Pass),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_battery_has_no_verdict() {
        assert_eq!(overall_verdict(Vec::new()), None);
    }

    #[test]
    fn all_pass() {
        assert_eq!(
            overall_verdict([Verdict::Pass, Verdict::Pass]),
            Some(Verdict::Pass)
        );
    }

    #[test]
    fn one_failure_fails_the_certificate() {
        assert_eq!(
            overall_verdict([Verdict::Pass, Verdict::Fail, Verdict::Pass]),
            Some(Verdict::Fail)
        );
    }
}
