//! Sampling and accession-register numbering

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::{AccessionConfig, AccessionMode};
use crate::error::{AppError, AppResult};
use crate::repository::{NewSample, QcRepository, SharedRepository};
use crate::services::material::require_material;
use crate::services::{Actor, AuditService};
use shared::{
    format_accession, next_sequence, Coa, LifecycleEvent, QcSample, TestResult,
    MAX_ACCESSION_SEQUENCE, RANDOM_SEQUENCE_MIN,
};

/// Sample service
#[derive(Clone)]
pub struct SampleService {
    repo: SharedRepository,
    audit: AuditService,
    accession: AccessionConfig,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TakeSampleInput {
    /// Defaults to the time of the request; its UTC date picks the accession day
    pub sample_date: Option<DateTime<Utc>>,
    #[validate(length(max = 500, message = "Remarks must be at most 500 characters"))]
    pub remarks: Option<String>,
}

/// Sample with its results and certificate
#[derive(Debug, Clone, Serialize)]
pub struct SampleDetail {
    #[serde(flatten)]
    pub sample: QcSample,
    pub results: Vec<TestResult>,
    pub coa: Option<Coa>,
}

pub(crate) async fn require_sample(repo: &dyn QcRepository, sample_id: Uuid) -> AppResult<QcSample> {
    repo.get_sample(sample_id)
        .await?
        .ok_or_else(|| AppError::NotFound("QC sample".to_string()))
}

impl SampleService {
    pub fn new(repo: SharedRepository, accession: AccessionConfig) -> Self {
        let audit = AuditService::new(repo.clone());
        Self {
            repo,
            audit,
            accession,
        }
    }

    /// Propose the next accession number for `day`.
    ///
    /// The number is not reserved; uniqueness is settled when the sample is
    /// inserted.
    pub async fn next_accession_number(&self, day: NaiveDate) -> AppResult<String> {
        match self.accession.mode {
            AccessionMode::Sequential => {
                let highest = self.repo.highest_accession_sequence(day).await?;
                let sequence = next_sequence(day, highest)?;
                Ok(format_accession(day, sequence))
            }
            AccessionMode::Random => {
                for _ in 0..self.accession.max_attempts {
                    let sequence =
                        rand::thread_rng().gen_range(RANDOM_SEQUENCE_MIN..=MAX_ACCESSION_SEQUENCE);
                    let candidate = format_accession(day, sequence);
                    if !self.repo.accession_exists(&candidate).await? {
                        return Ok(candidate);
                    }
                    tracing::debug!(accession_number = %candidate, "random accession number taken");
                }
                Err(AppError::Conflict {
                    resource: "accession_number".to_string(),
                    message: format!("No free accession number found for {}", day),
                })
            }
        }
    }

    /// Take a sample of a material under a freshly minted accession number.
    ///
    /// A number lost to a concurrent insert is re-minted, at most
    /// `accession.max_attempts` times in total.
    pub async fn take_sample(
        &self,
        actor: &Actor,
        material_id: Uuid,
        input: TakeSampleInput,
    ) -> AppResult<QcSample> {
        input.validate()?;

        let material = require_material(self.repo.as_ref(), material_id).await?;

        let sample_date = input.sample_date.unwrap_or_else(Utc::now);
        let day = sample_date.date_naive();
        let remarks = input.remarks.filter(|r| !r.trim().is_empty());

        for attempt in 1..=self.accession.max_attempts {
            let accession_number = self.next_accession_number(day).await?;

            let inserted = self
                .repo
                .insert_sample(
                    NewSample {
                        material_id,
                        accession_number: accession_number.clone(),
                        sample_date,
                        sampler: actor.user_id.clone(),
                        remarks: remarks.clone(),
                    },
                    LifecycleEvent::SampleTaken,
                )
                .await;

            match inserted {
                Ok(sample) => {
                    tracing::info!(
                        material_id = %material_id,
                        sample_id = %sample.id,
                        accession_number = %sample.accession_number,
                        "sample taken"
                    );
                    self.audit
                        .log_action(
                            actor,
                            format!(
                                "Took sample {} of {} lot {}",
                                sample.accession_number, material.material_code, material.lot_no
                            ),
                        )
                        .await;
                    return Ok(sample);
                }
                Err(AppError::DuplicateEntry(_)) => {
                    tracing::warn!(
                        %accession_number,
                        attempt,
                        max_attempts = self.accession.max_attempts,
                        "accession number collided, minting another"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict {
            resource: "accession_number".to_string(),
            message: format!(
                "Could not mint a unique accession number after {} attempts",
                self.accession.max_attempts
            ),
        })
    }

    pub async fn get_sample(&self, sample_id: Uuid) -> AppResult<QcSample> {
        require_sample(self.repo.as_ref(), sample_id).await
    }

    /// Sample with its results in submission order and its COA, if any
    pub async fn get_sample_detail(&self, sample_id: Uuid) -> AppResult<SampleDetail> {
        let sample = require_sample(self.repo.as_ref(), sample_id).await?;
        let results = self.repo.list_results(sample_id).await?;
        let coa = self.repo.get_coa(sample_id).await?;

        Ok(SampleDetail {
            sample,
            results,
            coa,
        })
    }
}
