//! Specification store: acceptance criteria per material and parameter

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::repository::{NewSpecification, SharedRepository};
use crate::services::material::require_material;
use crate::services::{Actor, AuditService};
use shared::{validate_required, validate_spec_limits, Specification};

/// Specification service
#[derive(Clone)]
pub struct SpecificationService {
    repo: SharedRepository,
    audit: AuditService,
}

/// Input for attaching a specification to a material
#[derive(Debug, Deserialize, Validate)]
pub struct AddSpecificationInput {
    #[validate(length(min = 1, max = 100, message = "Parameter must be 1-100 characters"))]
    pub parameter: String,
    #[validate(length(max = 100))]
    pub method: Option<String>,
    #[validate(length(max = 20))]
    pub unit: Option<String>,
    pub lower_limit: Option<Decimal>,
    pub upper_limit: Option<Decimal>,
    #[validate(length(max = 200))]
    pub textual_limit: Option<String>,
}

impl SpecificationService {
    pub fn new(repo: SharedRepository) -> Self {
        let audit = AuditService::new(repo.clone());
        Self { repo, audit }
    }

    /// Attach a specification. Allowed at any point in the material's
    /// lifecycle, including after sampling.
    pub async fn add_specification(
        &self,
        actor: &Actor,
        material_id: Uuid,
        input: AddSpecificationInput,
    ) -> AppResult<Specification> {
        input.validate()?;
        validate_required(&input.parameter).map_err(|e| AppError::validation("parameter", e))?;
        validate_spec_limits(
            input.lower_limit,
            input.upper_limit,
            input.textual_limit.as_deref(),
        )
        .map_err(|e| AppError::validation("limits", e))?;

        let material = require_material(self.repo.as_ref(), material_id).await?;

        let existing = self.repo.find_specs(material_id, &input.parameter).await?;
        if !existing.is_empty() {
            tracing::warn!(
                material_id = %material_id,
                parameter = %input.parameter,
                existing = existing.len(),
                "additional specification for parameter; results are judged against the first one only"
            );
        }

        let spec = self
            .repo
            .insert_specification(NewSpecification {
                material_id,
                parameter: input.parameter,
                method: input.method,
                unit: input.unit,
                lower_limit: input.lower_limit,
                upper_limit: input.upper_limit,
                textual_limit: input.textual_limit,
            })
            .await?;

        tracing::info!(
            material_id = %material_id,
            spec_id = %spec.id,
            parameter = %spec.parameter,
            "specification added"
        );
        self.audit
            .log_action(
                actor,
                format!(
                    "Added specification {} for {} lot {}",
                    spec.parameter, material.material_code, material.lot_no
                ),
            )
            .await;

        Ok(spec)
    }

    /// Specifications matching a parameter exactly (case-sensitive), oldest
    /// first. Empty when nothing matches.
    pub async fn find_specs(
        &self,
        material_id: Uuid,
        parameter: &str,
    ) -> AppResult<Vec<Specification>> {
        let specs = self.repo.find_specs(material_id, parameter).await?;
        tracing::debug!(
            material_id = %material_id,
            parameter,
            matches = specs.len(),
            "specification lookup"
        );
        Ok(specs)
    }

    /// All specifications of a material, or only those for `parameter`
    pub async fn list_specifications(
        &self,
        material_id: Uuid,
        parameter: Option<&str>,
    ) -> AppResult<Vec<Specification>> {
        require_material(self.repo.as_ref(), material_id).await?;

        match parameter {
            Some(parameter) => self.find_specs(material_id, parameter).await,
            None => self.repo.list_specifications(material_id).await,
        }
    }
}
