//! QC sample models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical sample drawn from a raw material for testing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcSample {
    pub id: Uuid,
    pub material_id: Uuid,
    pub accession_number: String,
    pub sample_date: DateTime<Utc>,
    pub sampler: String,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}
