//! In-process QC repository
//!
//! Keeps every table in insertion order behind one lock, so each trait call
//! is atomic. Enforces the same uniqueness and cascade rules as the Postgres
//! schema.

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AuditEntry, CoaRegisterEntry, CoaUpsert, NewMaterial, NewSample, NewSpecification,
    NewTestResult, QcRepository,
};
use crate::error::{AppError, AppResult};
use shared::{
    highest_sequence, Coa, LifecycleEvent, MaterialStatus, Pagination, QcSample, RawMaterial,
    Specification, TestResult,
};

#[derive(Default)]
struct Tables {
    materials: Vec<RawMaterial>,
    specifications: Vec<Specification>,
    samples: Vec<QcSample>,
    results: Vec<TestResult>,
    coas: Vec<Coa>,
    audit_log: Vec<AuditEntry>,
}

impl Tables {
    /// Apply `event` to the material's current status. Callers hold the
    /// write lock, so no other write can interleave.
    fn advance_status(&mut self, material_id: Uuid, event: LifecycleEvent) -> AppResult<()> {
        let material = self
            .materials
            .iter_mut()
            .find(|m| m.id == material_id)
            .ok_or_else(|| AppError::NotFound("Raw material".to_string()))?;

        material.status = material.status.apply(event)?;
        material.updated_at = Utc::now();
        Ok(())
    }

    fn has_material(&self, material_id: Uuid) -> bool {
        self.materials.iter().any(|m| m.id == material_id)
    }
}

/// QC repository held entirely in memory
#[derive(Default)]
pub struct MemoryQcRepository {
    tables: RwLock<Tables>,
}

impl MemoryQcRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[axum::async_trait]
impl QcRepository for MemoryQcRepository {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn insert_material(&self, material: NewMaterial) -> AppResult<RawMaterial> {
        let now = Utc::now();
        let material = RawMaterial {
            id: Uuid::new_v4(),
            material_code: material.material_code,
            material_name: material.material_name,
            lot_no: material.lot_no,
            vendor: material.vendor,
            received_qty: material.received_qty,
            unit: material.unit,
            received_date: material.received_date,
            status: material.status,
            created_at: now,
            updated_at: now,
        };

        self.tables.write().await.materials.push(material.clone());
        Ok(material)
    }

    async fn get_material(&self, material_id: Uuid) -> AppResult<Option<RawMaterial>> {
        let tables = self.tables.read().await;
        Ok(tables.materials.iter().find(|m| m.id == material_id).cloned())
    }

    async fn list_materials(
        &self,
        status: Option<MaterialStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<RawMaterial>, u64)> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&RawMaterial> = tables
            .materials
            .iter()
            .filter(|m| status.map_or(true, |s| m.status == s))
            .collect();
        matching.sort_by(|a, b| {
            b.received_date
                .cmp(&a.received_date)
                .then(b.created_at.cmp(&a.created_at))
        });

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.per_page as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn count_materials_by_status(&self) -> AppResult<Vec<(MaterialStatus, u64)>> {
        let tables = self.tables.read().await;

        let mut counts: Vec<(MaterialStatus, u64)> = Vec::new();
        for material in &tables.materials {
            match counts.iter_mut().find(|(status, _)| *status == material.status) {
                Some((_, count)) => *count += 1,
                None => counts.push((material.status, 1)),
            }
        }
        Ok(counts)
    }

    async fn delete_material(&self, material_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.has_material(material_id) {
            return Ok(false);
        }

        let sample_ids: Vec<Uuid> = tables
            .samples
            .iter()
            .filter(|s| s.material_id == material_id)
            .map(|s| s.id)
            .collect();

        tables.results.retain(|r| !sample_ids.contains(&r.sample_id));
        tables.coas.retain(|c| !sample_ids.contains(&c.sample_id));
        tables.samples.retain(|s| s.material_id != material_id);
        tables.specifications.retain(|s| s.material_id != material_id);
        tables.materials.retain(|m| m.id != material_id);

        Ok(true)
    }

    async fn insert_specification(&self, spec: NewSpecification) -> AppResult<Specification> {
        let mut tables = self.tables.write().await;
        if !tables.has_material(spec.material_id) {
            return Err(AppError::NotFound("Raw material".to_string()));
        }

        let spec = Specification {
            id: Uuid::new_v4(),
            material_id: spec.material_id,
            parameter: spec.parameter,
            method: spec.method,
            unit: spec.unit,
            lower_limit: spec.lower_limit,
            upper_limit: spec.upper_limit,
            textual_limit: spec.textual_limit,
            created_at: Utc::now(),
        };

        tables.specifications.push(spec.clone());
        Ok(spec)
    }

    async fn find_specs(
        &self,
        material_id: Uuid,
        parameter: &str,
    ) -> AppResult<Vec<Specification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .specifications
            .iter()
            .filter(|s| s.material_id == material_id && s.parameter == parameter)
            .cloned()
            .collect())
    }

    async fn list_specifications(&self, material_id: Uuid) -> AppResult<Vec<Specification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .specifications
            .iter()
            .filter(|s| s.material_id == material_id)
            .cloned()
            .collect())
    }

    async fn highest_accession_sequence(&self, day: NaiveDate) -> AppResult<Option<u16>> {
        let tables = self.tables.read().await;
        Ok(highest_sequence(
            day,
            tables.samples.iter().map(|s| s.accession_number.as_str()),
        ))
    }

    async fn accession_exists(&self, accession_number: &str) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .samples
            .iter()
            .any(|s| s.accession_number == accession_number))
    }

    async fn insert_sample(
        &self,
        sample: NewSample,
        event: LifecycleEvent,
    ) -> AppResult<QcSample> {
        let mut tables = self.tables.write().await;

        if tables
            .samples
            .iter()
            .any(|s| s.accession_number == sample.accession_number)
        {
            return Err(AppError::DuplicateEntry("accession_number".to_string()));
        }

        let sample = QcSample {
            id: Uuid::new_v4(),
            material_id: sample.material_id,
            accession_number: sample.accession_number,
            sample_date: sample.sample_date,
            sampler: sample.sampler,
            remarks: sample.remarks,
            created_at: Utc::now(),
        };

        tables.advance_status(sample.material_id, event)?;
        tables.samples.push(sample.clone());
        Ok(sample)
    }

    async fn get_sample(&self, sample_id: Uuid) -> AppResult<Option<QcSample>> {
        let tables = self.tables.read().await;
        Ok(tables.samples.iter().find(|s| s.id == sample_id).cloned())
    }

    async fn list_samples(&self, material_id: Uuid) -> AppResult<Vec<QcSample>> {
        let tables = self.tables.read().await;
        let mut samples: Vec<QcSample> = tables
            .samples
            .iter()
            .filter(|s| s.material_id == material_id)
            .cloned()
            .collect();
        samples.sort_by(|a, b| {
            a.sample_date
                .cmp(&b.sample_date)
                .then_with(|| a.accession_number.cmp(&b.accession_number))
        });
        Ok(samples)
    }

    async fn insert_result(
        &self,
        result: NewTestResult,
        material_id: Uuid,
        event: LifecycleEvent,
    ) -> AppResult<TestResult> {
        let mut tables = self.tables.write().await;
        if !tables.samples.iter().any(|s| s.id == result.sample_id) {
            return Err(AppError::NotFound("QC sample".to_string()));
        }

        let result = TestResult {
            id: Uuid::new_v4(),
            sample_id: result.sample_id,
            parameter: result.parameter,
            result_value: result.result_value,
            result_text: result.result_text,
            unit: result.unit,
            verdict: result.verdict,
            tested_by: result.tested_by,
            tested_at: Utc::now(),
        };

        tables.advance_status(material_id, event)?;
        tables.results.push(result.clone());
        Ok(result)
    }

    async fn list_results(&self, sample_id: Uuid) -> AppResult<Vec<TestResult>> {
        let tables = self.tables.read().await;
        Ok(tables
            .results
            .iter()
            .filter(|r| r.sample_id == sample_id)
            .cloned()
            .collect())
    }

    async fn upsert_coa(
        &self,
        coa: CoaUpsert,
        material_id: Uuid,
        event: LifecycleEvent,
    ) -> AppResult<Coa> {
        let mut tables = self.tables.write().await;
        if !tables.samples.iter().any(|s| s.id == coa.sample_id) {
            return Err(AppError::NotFound("QC sample".to_string()));
        }

        tables.advance_status(material_id, event)?;

        if let Some(existing) = tables.coas.iter_mut().find(|c| c.sample_id == coa.sample_id) {
            existing.overall_verdict = coa.overall_verdict;
            existing.generated_at = coa.generated_at;
            if coa.notes.is_some() {
                existing.notes = coa.notes;
            }
            return Ok(existing.clone());
        }

        let created = Coa {
            id: Uuid::new_v4(),
            sample_id: coa.sample_id,
            overall_verdict: coa.overall_verdict,
            generated_at: coa.generated_at,
            notes: coa.notes,
        };
        tables.coas.push(created.clone());
        Ok(created)
    }

    async fn get_coa(&self, sample_id: Uuid) -> AppResult<Option<Coa>> {
        let tables = self.tables.read().await;
        Ok(tables.coas.iter().find(|c| c.sample_id == sample_id).cloned())
    }

    async fn list_coa_register(&self) -> AppResult<Vec<CoaRegisterEntry>> {
        let tables = self.tables.read().await;

        let mut entries: Vec<CoaRegisterEntry> = tables
            .coas
            .iter()
            .filter_map(|coa| {
                let sample = tables.samples.iter().find(|s| s.id == coa.sample_id)?;
                let material = tables.materials.iter().find(|m| m.id == sample.material_id)?;
                Some(CoaRegisterEntry {
                    accession_number: sample.accession_number.clone(),
                    material_code: material.material_code.clone(),
                    material_name: material.material_name.clone(),
                    lot_no: material.lot_no.clone(),
                    overall_verdict: coa.overall_verdict,
                    generated_at: coa.generated_at,
                    notes: coa.notes.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));

        Ok(entries)
    }

    async fn append_audit(&self, user_id: &str, action: &str) -> AppResult<AuditEntry> {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            action: action.to_string(),
            timestamp: Utc::now(),
        };

        self.tables.write().await.audit_log.push(entry.clone());
        Ok(entry)
    }

    async fn list_audit(&self, limit: u32) -> AppResult<Vec<AuditEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit_log
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
