//! Append-only audit trail of QC actions

use crate::error::AppResult;
use crate::repository::{AuditEntry, SharedRepository};
use crate::services::Actor;

/// Default and maximum page of audit entries returned at once
pub const DEFAULT_AUDIT_LIMIT: u32 = 100;
pub const MAX_AUDIT_LIMIT: u32 = 1000;

/// Audit service recording who did what
#[derive(Clone)]
pub struct AuditService {
    repo: SharedRepository,
}

impl AuditService {
    pub fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    /// Record an action after the change it describes has been committed.
    /// Failures are logged, never returned.
    pub async fn log_action(&self, actor: &Actor, action: String) {
        match self.repo.append_audit(&actor.user_id, &action).await {
            Ok(_) => tracing::debug!(user_id = %actor.user_id, %action, "audit entry recorded"),
            Err(e) => tracing::error!(
                user_id = %actor.user_id,
                %action,
                error = %e,
                "failed to record audit entry"
            ),
        }
    }

    /// Most recent entries first
    pub async fn recent(&self, limit: Option<u32>) -> AppResult<Vec<AuditEntry>> {
        let limit = limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, MAX_AUDIT_LIMIT);
        self.repo.list_audit(limit).await
    }
}
