//! Certificate of Analysis HTTP handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::OptionalJson;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::{Actor, CoaService};
use crate::AppState;
use shared::{Action, Resource};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateCoaInput {
    pub notes: Option<String>,
}

/// Generate the sample's COA, or regenerate it
pub async fn generate_coa(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sample_id): Path<Uuid>,
    OptionalJson(input): OptionalJson<GenerateCoaInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::Approve)?;

    let service = CoaService::new(state.repo.clone());
    let coa = service
        .generate_or_update_coa(&Actor::from(&user), sample_id, input.notes)
        .await?;
    Ok(Json(coa))
}

pub async fn get_coa(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sample_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::View)?;

    let service = CoaService::new(state.repo.clone());
    Ok(Json(service.get_coa(sample_id).await?))
}
