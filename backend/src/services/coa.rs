//! Certificate of Analysis aggregation

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{CoaUpsert, SharedRepository};
use crate::services::material::require_material;
use crate::services::sample::require_sample;
use crate::services::{Actor, AuditService};
use shared::{overall_verdict, Coa, LifecycleEvent};

/// COA service
#[derive(Clone)]
pub struct CoaService {
    repo: SharedRepository,
    audit: AuditService,
}

impl CoaService {
    pub fn new(repo: SharedRepository) -> Self {
        let audit = AuditService::new(repo.clone());
        Self { repo, audit }
    }

    /// Issue the sample's COA, or refresh it if one exists.
    ///
    /// The overall verdict is Pass only when every recorded result passed,
    /// and it becomes the material's status. Existing notes are kept unless
    /// new ones are given.
    pub async fn generate_or_update_coa(
        &self,
        actor: &Actor,
        sample_id: Uuid,
        notes: Option<String>,
    ) -> AppResult<Coa> {
        let sample = require_sample(self.repo.as_ref(), sample_id).await?;
        let results = self.repo.list_results(sample_id).await?;

        let verdict = overall_verdict(results.iter().map(|r| r.verdict))
            .ok_or_else(|| AppError::NoResults(sample.accession_number.clone()))?;

        let material = require_material(self.repo.as_ref(), sample.material_id).await?;

        let coa = self
            .repo
            .upsert_coa(
                CoaUpsert {
                    sample_id,
                    overall_verdict: verdict,
                    generated_at: Utc::now(),
                    notes: notes.filter(|n| !n.trim().is_empty()),
                },
                material.id,
                LifecycleEvent::CoaIssued(verdict),
            )
            .await?;

        tracing::info!(
            sample_id = %sample_id,
            accession_number = %sample.accession_number,
            material_id = %material.id,
            verdict = %verdict,
            results = results.len(),
            "certificate of analysis issued"
        );
        self.audit
            .log_action(
                actor,
                format!(
                    "Generated COA for sample {}: {}",
                    sample.accession_number, verdict
                ),
            )
            .await;

        Ok(coa)
    }

    pub async fn get_coa(&self, sample_id: Uuid) -> AppResult<Coa> {
        require_sample(self.repo.as_ref(), sample_id).await?;
        self.repo
            .get_coa(sample_id)
            .await?
            .ok_or_else(|| AppError::NotFound("COA".to_string()))
    }
}
