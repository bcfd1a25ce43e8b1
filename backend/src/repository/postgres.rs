//! PostgreSQL-backed QC repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    AuditEntry, CoaRegisterEntry, CoaUpsert, NewMaterial, NewSample, NewSpecification,
    NewTestResult, QcRepository,
};
use crate::error::{AppError, AppResult};
use shared::{
    accession_prefix, Coa, LifecycleEvent, MaterialStatus, Pagination, QcSample, RawMaterial,
    Specification, TestResult, Verdict,
};

/// QC repository over a Postgres connection pool
#[derive(Clone)]
pub struct PgQcRepository {
    db: PgPool,
}

impl PgQcRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const MATERIAL_COLUMNS: &str = "id, material_code, material_name, lot_no, vendor, received_qty, \
     unit, received_date, status, created_at, updated_at";

const SPECIFICATION_COLUMNS: &str =
    "id, material_id, parameter, method, unit, lower_limit, upper_limit, textual_limit, created_at";

const SAMPLE_COLUMNS: &str =
    "id, material_id, accession_number, sample_date, sampler, remarks, created_at";

const RESULT_COLUMNS: &str =
    "id, sample_id, parameter, result_value, result_text, unit, verdict, tested_by, tested_at";

const COA_COLUMNS: &str = "id, sample_id, overall_verdict, generated_at, notes";

/// Database row for a raw material
#[derive(Debug, sqlx::FromRow)]
struct MaterialRow {
    id: Uuid,
    material_code: String,
    material_name: String,
    lot_no: String,
    vendor: Option<String>,
    received_qty: Decimal,
    unit: String,
    received_date: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MaterialRow> for RawMaterial {
    type Error = AppError;

    fn try_from(row: MaterialRow) -> Result<Self, Self::Error> {
        Ok(RawMaterial {
            id: row.id,
            material_code: row.material_code,
            material_name: row.material_name,
            lot_no: row.lot_no,
            vendor: row.vendor,
            received_qty: row.received_qty,
            unit: row.unit,
            received_date: row.received_date,
            status: status_from_str(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SpecificationRow {
    id: Uuid,
    material_id: Uuid,
    parameter: String,
    method: Option<String>,
    unit: Option<String>,
    lower_limit: Option<Decimal>,
    upper_limit: Option<Decimal>,
    textual_limit: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SpecificationRow> for Specification {
    fn from(row: SpecificationRow) -> Self {
        Specification {
            id: row.id,
            material_id: row.material_id,
            parameter: row.parameter,
            method: row.method,
            unit: row.unit,
            lower_limit: row.lower_limit,
            upper_limit: row.upper_limit,
            textual_limit: row.textual_limit,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SampleRow {
    id: Uuid,
    material_id: Uuid,
    accession_number: String,
    sample_date: DateTime<Utc>,
    sampler: String,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SampleRow> for QcSample {
    fn from(row: SampleRow) -> Self {
        QcSample {
            id: row.id,
            material_id: row.material_id,
            accession_number: row.accession_number,
            sample_date: row.sample_date,
            sampler: row.sampler,
            remarks: row.remarks,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ResultRow {
    id: Uuid,
    sample_id: Uuid,
    parameter: String,
    result_value: Option<Decimal>,
    result_text: Option<String>,
    unit: Option<String>,
    verdict: String,
    tested_by: String,
    tested_at: DateTime<Utc>,
}

impl TryFrom<ResultRow> for TestResult {
    type Error = AppError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        Ok(TestResult {
            id: row.id,
            sample_id: row.sample_id,
            parameter: row.parameter,
            result_value: row.result_value,
            result_text: row.result_text,
            unit: row.unit,
            verdict: verdict_from_str(&row.verdict)?,
            tested_by: row.tested_by,
            tested_at: row.tested_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CoaRow {
    id: Uuid,
    sample_id: Uuid,
    overall_verdict: String,
    generated_at: DateTime<Utc>,
    notes: Option<String>,
}

impl TryFrom<CoaRow> for Coa {
    type Error = AppError;

    fn try_from(row: CoaRow) -> Result<Self, Self::Error> {
        Ok(Coa {
            id: row.id,
            sample_id: row.sample_id,
            overall_verdict: verdict_from_str(&row.overall_verdict)?,
            generated_at: row.generated_at,
            notes: row.notes,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RegisterRow {
    accession_number: String,
    material_code: String,
    material_name: String,
    lot_no: String,
    overall_verdict: String,
    generated_at: DateTime<Utc>,
    notes: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    user_id: String,
    action: String,
    timestamp: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        AuditEntry {
            id: row.id,
            user_id: row.user_id,
            action: row.action,
            timestamp: row.timestamp,
        }
    }
}

fn status_from_str(s: &str) -> AppResult<MaterialStatus> {
    MaterialStatus::from_str(s)
        .ok_or_else(|| AppError::Internal(format!("Unknown material status in database: {}", s)))
}

fn verdict_from_str(s: &str) -> AppResult<Verdict> {
    Verdict::from_str(s)
        .ok_or_else(|| AppError::Internal(format!("Unknown verdict in database: {}", s)))
}

fn collect<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Apply `event` to a material's status inside an open transaction.
/// The row stays locked until the transaction ends.
async fn advance_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    material_id: Uuid,
    event: LifecycleEvent,
) -> AppResult<()> {
    let current: Option<String> =
        sqlx::query_scalar("SELECT status FROM raw_materials WHERE id = $1 FOR UPDATE")
            .bind(material_id)
            .fetch_optional(&mut **tx)
            .await?;
    let current = current.ok_or_else(|| AppError::NotFound("Raw material".to_string()))?;
    let next = status_from_str(&current)?.apply(event)?;

    sqlx::query("UPDATE raw_materials SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(next.as_str())
        .bind(material_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[axum::async_trait]
impl QcRepository for PgQcRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn insert_material(&self, material: NewMaterial) -> AppResult<RawMaterial> {
        let row = sqlx::query_as::<_, MaterialRow>(&format!(
            r#"
            INSERT INTO raw_materials (
                material_code, material_name, lot_no, vendor, received_qty, unit,
                received_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MATERIAL_COLUMNS}
            "#
        ))
        .bind(&material.material_code)
        .bind(&material.material_name)
        .bind(&material.lot_no)
        .bind(&material.vendor)
        .bind(material.received_qty)
        .bind(&material.unit)
        .bind(material.received_date)
        .bind(material.status.as_str())
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn get_material(&self, material_id: Uuid) -> AppResult<Option<RawMaterial>> {
        sqlx::query_as::<_, MaterialRow>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM raw_materials WHERE id = $1"
        ))
        .bind(material_id)
        .fetch_optional(&self.db)
        .await?
        .map(RawMaterial::try_from)
        .transpose()
    }

    async fn list_materials(
        &self,
        status: Option<MaterialStatus>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<RawMaterial>, u64)> {
        let status = status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM raw_materials WHERE ($1::VARCHAR IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, MaterialRow>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM raw_materials
            WHERE ($1::VARCHAR IS NULL OR status = $1)
            ORDER BY received_date DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(i64::from(pagination.per_page))
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        Ok((collect(rows)?, total.max(0) as u64))
    }

    async fn count_materials_by_status(&self) -> AppResult<Vec<(MaterialStatus, u64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM raw_materials GROUP BY status",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|(status, count)| -> AppResult<(MaterialStatus, u64)> {
                Ok((status_from_str(&status)?, count.max(0) as u64))
            })
            .collect()
    }

    async fn delete_material(&self, material_id: Uuid) -> AppResult<bool> {
        // Samples, specifications, results and COAs go with it via ON DELETE CASCADE
        let deleted = sqlx::query("DELETE FROM raw_materials WHERE id = $1")
            .bind(material_id)
            .execute(&self.db)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn insert_specification(&self, spec: NewSpecification) -> AppResult<Specification> {
        let row = sqlx::query_as::<_, SpecificationRow>(&format!(
            r#"
            INSERT INTO specifications (
                material_id, parameter, method, unit, lower_limit, upper_limit, textual_limit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SPECIFICATION_COLUMNS}
            "#
        ))
        .bind(spec.material_id)
        .bind(&spec.parameter)
        .bind(&spec.method)
        .bind(&spec.unit)
        .bind(spec.lower_limit)
        .bind(spec.upper_limit)
        .bind(&spec.textual_limit)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn find_specs(
        &self,
        material_id: Uuid,
        parameter: &str,
    ) -> AppResult<Vec<Specification>> {
        let rows = sqlx::query_as::<_, SpecificationRow>(&format!(
            r#"
            SELECT {SPECIFICATION_COLUMNS}
            FROM specifications
            WHERE material_id = $1 AND parameter = $2
            ORDER BY seq ASC
            "#
        ))
        .bind(material_id)
        .bind(parameter)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Specification::from).collect())
    }

    async fn list_specifications(&self, material_id: Uuid) -> AppResult<Vec<Specification>> {
        let rows = sqlx::query_as::<_, SpecificationRow>(&format!(
            "SELECT {SPECIFICATION_COLUMNS} FROM specifications WHERE material_id = $1 ORDER BY seq ASC"
        ))
        .bind(material_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Specification::from).collect())
    }

    async fn highest_accession_sequence(&self, day: NaiveDate) -> AppResult<Option<u16>> {
        let prefix = accession_prefix(day);

        // The suffix follows the fixed-width "AR-YYYYMMDD-" prefix
        let highest: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT MAX(CAST(SUBSTRING(accession_number FROM $2) AS INTEGER))
            FROM qc_samples
            WHERE accession_number LIKE $1 || '%'
              AND SUBSTRING(accession_number FROM $2) ~ '^[0-9]{4}$'
            "#,
        )
        .bind(&prefix)
        .bind(prefix.len() as i32 + 1)
        .fetch_one(&self.db)
        .await?;

        highest
            .map(|seq| {
                u16::try_from(seq)
                    .map_err(|_| AppError::Internal(format!("Accession sequence out of range: {}", seq)))
            })
            .transpose()
    }

    async fn accession_exists(&self, accession_number: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM qc_samples WHERE accession_number = $1)",
        )
        .bind(accession_number)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn insert_sample(
        &self,
        sample: NewSample,
        event: LifecycleEvent,
    ) -> AppResult<QcSample> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, SampleRow>(&format!(
            r#"
            INSERT INTO qc_samples (material_id, accession_number, sample_date, sampler, remarks)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SAMPLE_COLUMNS}
            "#
        ))
        .bind(sample.material_id)
        .bind(&sample.accession_number)
        .bind(sample.sample_date)
        .bind(&sample.sampler)
        .bind(&sample.remarks)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "accession_number"))?;

        advance_status(&mut tx, sample.material_id, event).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn get_sample(&self, sample_id: Uuid) -> AppResult<Option<QcSample>> {
        let row = sqlx::query_as::<_, SampleRow>(&format!(
            "SELECT {SAMPLE_COLUMNS} FROM qc_samples WHERE id = $1"
        ))
        .bind(sample_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(QcSample::from))
    }

    async fn list_samples(&self, material_id: Uuid) -> AppResult<Vec<QcSample>> {
        let rows = sqlx::query_as::<_, SampleRow>(&format!(
            r#"
            SELECT {SAMPLE_COLUMNS}
            FROM qc_samples
            WHERE material_id = $1
            ORDER BY sample_date ASC, accession_number ASC
            "#
        ))
        .bind(material_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(QcSample::from).collect())
    }

    async fn insert_result(
        &self,
        result: NewTestResult,
        material_id: Uuid,
        event: LifecycleEvent,
    ) -> AppResult<TestResult> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ResultRow>(&format!(
            r#"
            INSERT INTO test_results (
                sample_id, parameter, result_value, result_text, unit, verdict, tested_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(result.sample_id)
        .bind(&result.parameter)
        .bind(result.result_value)
        .bind(&result.result_text)
        .bind(&result.unit)
        .bind(result.verdict.as_str())
        .bind(&result.tested_by)
        .fetch_one(&mut *tx)
        .await?;

        advance_status(&mut tx, material_id, event).await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn list_results(&self, sample_id: Uuid) -> AppResult<Vec<TestResult>> {
        let rows = sqlx::query_as::<_, ResultRow>(&format!(
            "SELECT {RESULT_COLUMNS} FROM test_results WHERE sample_id = $1 ORDER BY tested_at ASC"
        ))
        .bind(sample_id)
        .fetch_all(&self.db)
        .await?;

        collect(rows)
    }

    async fn upsert_coa(
        &self,
        coa: CoaUpsert,
        material_id: Uuid,
        event: LifecycleEvent,
    ) -> AppResult<Coa> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, CoaRow>(&format!(
            r#"
            INSERT INTO coas (sample_id, overall_verdict, generated_at, notes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (sample_id) DO UPDATE
            SET overall_verdict = EXCLUDED.overall_verdict,
                generated_at = EXCLUDED.generated_at,
                notes = COALESCE(EXCLUDED.notes, coas.notes)
            RETURNING {COA_COLUMNS}
            "#
        ))
        .bind(coa.sample_id)
        .bind(coa.overall_verdict.as_str())
        .bind(coa.generated_at)
        .bind(&coa.notes)
        .fetch_one(&mut *tx)
        .await?;

        advance_status(&mut tx, material_id, event).await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn get_coa(&self, sample_id: Uuid) -> AppResult<Option<Coa>> {
        sqlx::query_as::<_, CoaRow>(&format!("SELECT {COA_COLUMNS} FROM coas WHERE sample_id = $1"))
            .bind(sample_id)
            .fetch_optional(&self.db)
            .await?
            .map(Coa::try_from)
            .transpose()
    }

    async fn list_coa_register(&self) -> AppResult<Vec<CoaRegisterEntry>> {
        let rows = sqlx::query_as::<_, RegisterRow>(
            r#"
            SELECT s.accession_number, m.material_code, m.material_name, m.lot_no,
                   c.overall_verdict, c.generated_at, c.notes
            FROM coas c
            JOIN qc_samples s ON s.id = c.sample_id
            JOIN raw_materials m ON m.id = s.material_id
            ORDER BY c.generated_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| -> AppResult<CoaRegisterEntry> {
                Ok(CoaRegisterEntry {
                    accession_number: row.accession_number,
                    material_code: row.material_code,
                    material_name: row.material_name,
                    lot_no: row.lot_no,
                    overall_verdict: verdict_from_str(&row.overall_verdict)?,
                    generated_at: row.generated_at,
                    notes: row.notes,
                })
            })
            .collect()
    }

    async fn append_audit(&self, user_id: &str, action: &str) -> AppResult<AuditEntry> {
        let row = sqlx::query_as::<_, AuditRow>(
            r#"
            INSERT INTO audit_log (user_id, action)
            VALUES ($1, $2)
            RETURNING id, user_id, action, timestamp
            "#,
        )
        .bind(user_id)
        .bind(action)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn list_audit(&self, limit: u32) -> AppResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT id, user_id, action, timestamp FROM audit_log ORDER BY timestamp DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}
