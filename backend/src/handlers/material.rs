//! Raw material HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{check_permission, CurrentUser};
use crate::services::material::{MaterialService, ReceiveMaterialInput};
use crate::services::Actor;
use crate::AppState;
use shared::{Action, MaterialStatus, Pagination, Resource};

#[derive(Debug, Deserialize)]
pub struct MaterialListQuery {
    /// snake_case status, e.g. `pending_sampling`
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List raw materials, optionally filtered by status
pub async fn list_materials(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MaterialListQuery>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::View)?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            MaterialStatus::from_str(s)
                .ok_or_else(|| AppError::validation("status", format!("Unknown status: {}", s)))?,
        ),
        None => None,
    };

    let service = MaterialService::new(state.repo.clone());
    let page = service
        .list_materials(status, Pagination::new(query.page, query.per_page))
        .await?;
    Ok(Json(page))
}

/// Receive a new raw material
pub async fn receive_material(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ReceiveMaterialInput>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::Add)?;

    let service = MaterialService::new(state.repo.clone());
    let material = service.receive_material(&Actor::from(&user), input).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

/// Get a material with its samples and specifications
pub async fn get_material(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    check_permission(&user, Resource::Qc, Action::View)?;

    let service = MaterialService::new(state.repo.clone());
    Ok(Json(service.get_material_detail(material_id).await?))
}

/// Delete a material and everything recorded against it
pub async fn delete_material(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(material_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    check_permission(&user, Resource::Qc, Action::Delete)?;

    let service = MaterialService::new(state.repo.clone());
    service
        .delete_material(&Actor::from(&user), material_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
