//! Specification HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::specification::{AddSpecificationInput, SpecificationService};
use crate::services::Actor;
use crate::AppState;
use shared::{Action, Resource};

#[derive(Debug, Deserialize)]
pub struct SpecificationQuery {
    /// Exact, case-sensitive parameter name
    pub parameter: Option<String>,
}

pub async fn list_specifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
    Query(query): Query<SpecificationQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::View)?;

    let service = SpecificationService::new(state.repo.clone());
    let specs = service
        .list_specifications(material_id, query.parameter.as_deref())
        .await?;
    Ok(Json(specs))
}

pub async fn add_specification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
    Json(input): Json<AddSpecificationInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::Add)?;

    let service = SpecificationService::new(state.repo.clone());
    let spec = service
        .add_specification(&Actor::from(&user), material_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(spec)))
}
