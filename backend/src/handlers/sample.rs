//! Sample HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::OptionalJson;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::sample::{SampleService, TakeSampleInput};
use crate::services::Actor;
use crate::AppState;
use shared::{Action, Resource};

/// Take a sample of a material; the body may be empty
pub async fn take_sample(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
    OptionalJson(input): OptionalJson<TakeSampleInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::Add)?;

    let service = SampleService::new(state.repo.clone(), state.config.accession.clone());
    let sample = service
        .take_sample(&Actor::from(&user), material_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(sample)))
}

/// Get a sample with its results and COA
pub async fn get_sample(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sample_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::View)?;

    let service = SampleService::new(state.repo.clone(), state.config.accession.clone());
    Ok(Json(service.get_sample_detail(sample_id).await?))
}
