//! Reporting service for the QC dashboard and certificate register export

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::repository::{CoaRegisterEntry, SharedRepository};
use crate::services::MaterialService;
use shared::StatusSummary;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    repo: SharedRepository,
}

/// Dashboard metrics
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_materials: u64,
    pub materials_by_status: StatusSummary,
    pub coas_issued: u64,
    pub coas_passed: u64,
    pub coas_failed: u64,
}

impl ReportingService {
    pub fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    pub async fn get_dashboard_metrics(&self) -> AppResult<DashboardMetrics> {
        let summary = MaterialService::new(self.repo.clone()).status_summary().await?;
        let register = self.repo.list_coa_register().await?;
        let coas_passed = register
            .iter()
            .filter(|entry| entry.overall_verdict.is_pass())
            .count() as u64;

        Ok(DashboardMetrics {
            total_materials: summary.total(),
            materials_by_status: summary,
            coas_issued: register.len() as u64,
            coas_passed,
            coas_failed: register.len() as u64 - coas_passed,
        })
    }

    /// Every issued COA with its sample and material, newest first
    pub async fn coa_register(&self) -> AppResult<Vec<CoaRegisterEntry>> {
        self.repo.list_coa_register().await
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
