//! Test result HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::result::{RecordResultInput, ResultService};
use crate::services::Actor;
use crate::AppState;
use shared::{Action, Resource};

/// Record and judge a test result
pub async fn record_result(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sample_id): Path<Uuid>,
    Json(input): Json<RecordResultInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::Add)?;

    let service = ResultService::new(state.repo.clone());
    let result = service
        .record_result(&Actor::from(&user), sample_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}
