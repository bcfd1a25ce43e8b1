//! Test result recording and judgement

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::repository::{NewTestResult, SharedRepository};
use crate::services::material::require_material;
use crate::services::sample::require_sample;
use crate::services::{Actor, AuditService};
use shared::{judge, parse_measurement, validate_result_values, LifecycleEvent, TestResult};

/// Result service
#[derive(Clone)]
pub struct ResultService {
    repo: SharedRepository,
    audit: AuditService,
}

/// A measurement as submitted: JSON number or numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMeasurement {
    Number(serde_json::Number),
    Text(String),
}

impl RawMeasurement {
    fn as_text(&self) -> String {
        match self {
            RawMeasurement::Number(n) => n.to_string(),
            RawMeasurement::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for RawMeasurement {
    fn from(value: &str) -> Self {
        RawMeasurement::Text(value.to_string())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordResultInput {
    #[validate(length(min = 1, max = 100, message = "Parameter must be 1-100 characters"))]
    pub parameter: String,
    pub result_value: Option<RawMeasurement>,
    #[validate(length(max = 200))]
    pub result_text: Option<String>,
    /// Defaults to the unit of the specification the result is judged against
    #[validate(length(max = 20))]
    pub unit: Option<String>,
}

impl ResultService {
    pub fn new(repo: SharedRepository) -> Self {
        let audit = AuditService::new(repo.clone());
        Self { repo, audit }
    }

    /// Record a result for a sample and judge it against the material's
    /// specifications for the same parameter.
    ///
    /// A parameter without a specification is still recorded, as a Fail.
    pub async fn record_result(
        &self,
        actor: &Actor,
        sample_id: Uuid,
        input: RecordResultInput,
    ) -> AppResult<TestResult> {
        input.validate()?;

        let raw_value = input.result_value.as_ref().map(RawMeasurement::as_text);
        validate_result_values(raw_value.as_deref(), input.result_text.as_deref())
            .map_err(|e| AppError::validation("result_value", e))?;

        let result_value = raw_value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(parse_measurement)
            .transpose()
            .map_err(|e| AppError::validation("result_value", e))?;
        let result_text = input.result_text.filter(|t| !t.trim().is_empty());

        let sample = require_sample(self.repo.as_ref(), sample_id).await?;
        let material = require_material(self.repo.as_ref(), sample.material_id).await?;

        let specs = self.repo.find_specs(material.id, &input.parameter).await?;
        match specs.len() {
            0 => tracing::warn!(
                material_id = %material.id,
                parameter = %input.parameter,
                "no specification for parameter, result fails"
            ),
            1 => {}
            n => tracing::warn!(
                material_id = %material.id,
                parameter = %input.parameter,
                matches = n,
                "several specifications match, judging against the first"
            ),
        }

        let verdict = judge(
            &input.parameter,
            result_value,
            result_text.as_deref(),
            &specs,
        );
        let unit = input
            .unit
            .filter(|u| !u.trim().is_empty())
            .or_else(|| specs.first().and_then(|s| s.unit.clone()));

        let result = self
            .repo
            .insert_result(
                NewTestResult {
                    sample_id,
                    parameter: input.parameter,
                    result_value,
                    result_text,
                    unit,
                    verdict,
                    tested_by: actor.user_id.clone(),
                },
                material.id,
                LifecycleEvent::ResultRecorded,
            )
            .await?;

        tracing::info!(
            sample_id = %sample_id,
            accession_number = %sample.accession_number,
            parameter = %result.parameter,
            verdict = %result.verdict,
            "test result recorded"
        );
        self.audit
            .log_action(
                actor,
                format!(
                    "Recorded {} result {} for sample {}",
                    result.parameter, result.verdict, sample.accession_number
                ),
            )
            .await;

        Ok(result)
    }

    /// Results of a sample in submission order
    pub async fn list_results(&self, sample_id: Uuid) -> AppResult<Vec<TestResult>> {
        require_sample(self.repo.as_ref(), sample_id).await?;
        self.repo.list_results(sample_id).await
    }
}
