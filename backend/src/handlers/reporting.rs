//! Reporting handlers for the dashboard and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::reporting::{DashboardMetrics, ReportingService};
use crate::AppState;
use shared::{Action, Resource};

#[derive(Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>, // "json" or "csv"
}

/// Get dashboard metrics
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<DashboardMetrics>> {
    check_permission(&user, Resource::Qc, Action::View)?;

    let service = ReportingService::new(state.repo.clone());
    Ok(Json(service.get_dashboard_metrics().await?))
}

/// Get the COA register
pub async fn get_coa_register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::View)?;

    let service = ReportingService::new(state.repo.clone());
    let data = service.coa_register().await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"coa_register.csv\""),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}
