//! Raw material receipt and QC status tracking

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::repository::{NewMaterial, QcRepository, SharedRepository};
use crate::services::{Actor, AuditService};
use shared::{
    validate_material_code, validate_received_quantity, MaterialStatus, PaginatedResponse,
    Pagination, QcSample, RawMaterial, Specification, StatusSummary,
};

/// Material service for receiving and tracking raw materials
#[derive(Clone)]
pub struct MaterialService {
    repo: SharedRepository,
    audit: AuditService,
}

/// Input for receiving a raw material consignment
#[derive(Debug, Deserialize, Validate)]
pub struct ReceiveMaterialInput {
    #[validate(length(min = 1, max = 20, message = "Material code must be 1-20 characters"))]
    pub material_code: String,
    #[validate(length(min = 1, max = 200, message = "Material name is required"))]
    pub material_name: String,
    #[validate(length(min = 1, max = 50, message = "Lot number is required"))]
    pub lot_no: String,
    #[validate(length(max = 200, message = "Vendor must be at most 200 characters"))]
    pub vendor: Option<String>,
    pub received_qty: Decimal,
    #[validate(length(min = 1, max = 20, message = "Unit is required"))]
    pub unit: String,
    /// Defaults to the time of the request
    pub received_date: Option<DateTime<Utc>>,
}

/// Material with everything it owns
#[derive(Debug, Clone, Serialize)]
pub struct MaterialDetail {
    #[serde(flatten)]
    pub material: RawMaterial,
    pub samples: Vec<QcSample>,
    pub specifications: Vec<Specification>,
}

/// Look up a material or fail with `NotFound`
pub(crate) async fn require_material(
    repo: &dyn QcRepository,
    material_id: Uuid,
) -> AppResult<RawMaterial> {
    repo.get_material(material_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Raw material".to_string()))
}

impl MaterialService {
    /// Create a new MaterialService instance
    pub fn new(repo: SharedRepository) -> Self {
        let audit = AuditService::new(repo.clone());
        Self { repo, audit }
    }

    /// Receive a raw material; it starts out pending sampling
    pub async fn receive_material(
        &self,
        actor: &Actor,
        input: ReceiveMaterialInput,
    ) -> AppResult<RawMaterial> {
        input.validate()?;
        validate_material_code(&input.material_code)
            .map_err(|e| AppError::validation("material_code", e))?;
        validate_received_quantity(input.received_qty)
            .map_err(|e| AppError::validation("received_qty", e))?;

        let material = self
            .repo
            .insert_material(NewMaterial {
                material_code: input.material_code,
                material_name: input.material_name.trim().to_string(),
                lot_no: input.lot_no.trim().to_string(),
                vendor: input.vendor.filter(|v| !v.trim().is_empty()),
                received_qty: input.received_qty,
                unit: input.unit,
                received_date: input.received_date.unwrap_or_else(Utc::now),
                status: MaterialStatus::PendingSampling,
            })
            .await?;

        tracing::info!(
            material_id = %material.id,
            material_code = %material.material_code,
            lot_no = %material.lot_no,
            "raw material received"
        );
        self.audit
            .log_action(
                actor,
                format!(
                    "Received raw material {} ({}) lot {}",
                    material.material_code, material.material_name, material.lot_no
                ),
            )
            .await;

        Ok(material)
    }

    pub async fn get_material(&self, material_id: Uuid) -> AppResult<RawMaterial> {
        require_material(self.repo.as_ref(), material_id).await
    }

    /// Material with its samples and specifications
    pub async fn get_material_detail(&self, material_id: Uuid) -> AppResult<MaterialDetail> {
        let material = require_material(self.repo.as_ref(), material_id).await?;
        let samples = self.repo.list_samples(material_id).await?;
        let specifications = self.repo.list_specifications(material_id).await?;

        Ok(MaterialDetail {
            material,
            samples,
            specifications,
        })
    }

    /// List materials, newest receipt first
    pub async fn list_materials(
        &self,
        status: Option<MaterialStatus>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<RawMaterial>> {
        let (materials, total) = self.repo.list_materials(status, &pagination).await?;
        Ok(PaginatedResponse::new(materials, &pagination, total))
    }

    /// Delete a material together with its samples, specifications,
    /// results and certificates
    pub async fn delete_material(&self, actor: &Actor, material_id: Uuid) -> AppResult<()> {
        let material = require_material(self.repo.as_ref(), material_id).await?;

        if !self.repo.delete_material(material_id).await? {
            return Err(AppError::NotFound("Raw material".to_string()));
        }

        tracing::info!(material_id = %material_id, "raw material deleted");
        self.audit
            .log_action(
                actor,
                format!(
                    "Deleted raw material {} lot {}",
                    material.material_code, material.lot_no
                ),
            )
            .await;

        Ok(())
    }

    /// Material counts per status for the dashboard
    pub async fn status_summary(&self) -> AppResult<StatusSummary> {
        let mut summary = StatusSummary::default();
        for (status, count) in self.repo.count_materials_by_status().await? {
            summary.record(status, count);
        }
        Ok(summary)
    }
}
