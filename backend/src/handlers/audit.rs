//! Audit log handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::repository::AuditEntry;
use crate::services::AuditService;
use crate::AppState;
use shared::{Action, Resource};

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<u32>,
}

/// Most recent audit entries first
pub async fn list_audit_log(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    check_permission(&user, Resource::User, Action::Manage)?;

    let service = AuditService::new(state.repo.clone());
    Ok(Json(service.recent(query.limit).await?))
}
