//! Accession number preview

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::SampleService;
use crate::AppState;
use shared::{Action, Resource};

#[derive(Debug, Deserialize)]
pub struct NextAccessionQuery {
    /// Defaults to today (UTC)
    pub day: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct NextAccessionResponse {
    pub accession_number: String,
}

/// Preview the accession number the next sample would receive. Nothing is
/// reserved.
pub async fn next_accession(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NextAccessionQuery>,
) -> AppResult<Json<NextAccessionResponse>> {
    check_permission(&user, Resource::Qc, Action::View)?;

    let day = query.day.unwrap_or_else(|| Utc::now().date_naive());
    let service = SampleService::new(state.repo.clone(), state.config.accession.clone());
    let accession_number = service.next_accession_number(day).await?;
    Ok(Json(NextAccessionResponse { accession_number }))
}
