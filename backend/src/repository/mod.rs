//! Persistence for QC records
//!
//! `QcRepository` is the storage boundary consumed by the services. Writes
//! that touch more than one entity (a new sample plus the material status it
//! implies, a COA plus the material verdict) are single calls so that each
//! implementation can make them atomic. Those calls take the `LifecycleEvent`
//! rather than a target status; it is applied to the material's status as
//! stored at write time.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use shared::{
    Coa, LifecycleEvent, MaterialStatus, Pagination, QcSample, RawMaterial, Specification,
    TestResult, Verdict,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryQcRepository;
pub use postgres::PgQcRepository;

/// Repository handle shared across handlers
pub type SharedRepository = Arc<dyn QcRepository>;

/// Fields for a newly received raw material
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub material_code: String,
    pub material_name: String,
    pub lot_no: String,
    pub vendor: Option<String>,
    pub received_qty: Decimal,
    pub unit: String,
    pub received_date: DateTime<Utc>,
    pub status: MaterialStatus,
}

#[derive(Debug, Clone)]
pub struct NewSpecification {
    pub material_id: Uuid,
    pub parameter: String,
    pub method: Option<String>,
    pub unit: Option<String>,
    pub lower_limit: Option<Decimal>,
    pub upper_limit: Option<Decimal>,
    pub textual_limit: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSample {
    pub material_id: Uuid,
    pub accession_number: String,
    pub sample_date: DateTime<Utc>,
    pub sampler: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTestResult {
    pub sample_id: Uuid,
    pub parameter: String,
    pub result_value: Option<Decimal>,
    pub result_text: Option<String>,
    pub unit: Option<String>,
    pub verdict: Verdict,
    pub tested_by: String,
}

/// Values written when a COA is generated or regenerated
#[derive(Debug, Clone)]
pub struct CoaUpsert {
    pub sample_id: Uuid,
    pub overall_verdict: Verdict,
    pub generated_at: DateTime<Utc>,
    /// Replaces existing notes only when present
    pub notes: Option<String>,
}

/// One line of the certificate register
#[derive(Debug, Clone, Serialize)]
pub struct CoaRegisterEntry {
    pub accession_number: String,
    pub material_code: String,
    pub material_name: String,
    pub lot_no: String,
    pub overall_verdict: Verdict,
    pub generated_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// An append-only audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// Storage operations for the QC workflow
#[axum::async_trait]
pub trait QcRepository: Send + Sync {
    /// Check the store is reachable
    async fn ping(&self) -> AppResult<()>;

    // Raw materials

    async fn insert_material(&self, material: NewMaterial) -> AppResult<RawMaterial>;

    async fn get_material(&self, material_id: Uuid) -> AppResult<Option<RawMaterial>>;

    /// Newest first, with the total number of matching rows
    async fn list_materials(
        &self,
        status: Option<MaterialStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<RawMaterial>, u64)>;

    async fn count_materials_by_status(&self) -> AppResult<Vec<(MaterialStatus, u64)>>;

    /// Delete a material with its samples, specifications, results and COAs.
    /// Returns false when the material did not exist.
    async fn delete_material(&self, material_id: Uuid) -> AppResult<bool>;

    // Specifications

    async fn insert_specification(&self, spec: NewSpecification) -> AppResult<Specification>;

    /// Specifications for an exact, case-sensitive parameter name, oldest first
    async fn find_specs(&self, material_id: Uuid, parameter: &str)
        -> AppResult<Vec<Specification>>;

    async fn list_specifications(&self, material_id: Uuid) -> AppResult<Vec<Specification>>;

    // Samples

    /// Highest accession sequence already issued for `day`
    async fn highest_accession_sequence(&self, day: NaiveDate) -> AppResult<Option<u16>>;

    async fn accession_exists(&self, accession_number: &str) -> AppResult<bool>;

    /// Insert a sample and advance its material's status in one step.
    /// A taken accession number fails with `DuplicateEntry`.
    async fn insert_sample(&self, sample: NewSample, event: LifecycleEvent)
        -> AppResult<QcSample>;

    async fn get_sample(&self, sample_id: Uuid) -> AppResult<Option<QcSample>>;

    async fn list_samples(&self, material_id: Uuid) -> AppResult<Vec<QcSample>>;

    // Test results

    /// Insert a result and advance the owning material's status in one step
    async fn insert_result(
        &self,
        result: NewTestResult,
        material_id: Uuid,
        event: LifecycleEvent,
    ) -> AppResult<TestResult>;

    async fn list_results(&self, sample_id: Uuid) -> AppResult<Vec<TestResult>>;

    // Certificates of analysis

    /// Create or update the sample's COA and advance the material's status
    /// in one step
    async fn upsert_coa(
        &self,
        coa: CoaUpsert,
        material_id: Uuid,
        event: LifecycleEvent,
    ) -> AppResult<Coa>;

    async fn get_coa(&self, sample_id: Uuid) -> AppResult<Option<Coa>>;

    /// All COAs, newest first
    async fn list_coa_register(&self) -> AppResult<Vec<CoaRegisterEntry>>;

    // Audit log

    async fn append_audit(&self, user_id: &str, action: &str) -> AppResult<AuditEntry>;

    /// Most recent entries first
    async fn list_audit(&self, limit: u32) -> AppResult<Vec<AuditEntry>>;
}
