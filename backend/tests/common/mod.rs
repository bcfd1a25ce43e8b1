//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use pharma_qc_backend::config::{AccessionConfig, AccessionMode};
use pharma_qc_backend::repository::{MemoryQcRepository, SharedRepository};
use pharma_qc_backend::services::material::ReceiveMaterialInput;
use pharma_qc_backend::services::result::RecordResultInput;
use pharma_qc_backend::services::sample::TakeSampleInput;
use pharma_qc_backend::services::specification::AddSpecificationInput;
use pharma_qc_backend::services::{
    Actor, AuditService, CoaService, MaterialService, ResultService, SampleService,
    SpecificationService,
};

/// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn on_day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 30, 0).unwrap()
}

pub fn qc_officer() -> Actor {
    Actor::new("qc.officer")
}

/// Every service wired to one in-memory store
pub struct Lab {
    pub repo: SharedRepository,
    pub materials: MaterialService,
    pub specs: SpecificationService,
    pub samples: SampleService,
    pub results: ResultService,
    pub coas: CoaService,
    pub audit: AuditService,
}

impl Lab {
    pub fn new() -> Self {
        Self::with_accession(AccessionConfig::default())
    }

    pub fn with_accession(accession: AccessionConfig) -> Self {
        let repo: SharedRepository = Arc::new(MemoryQcRepository::new());
        Self {
            materials: MaterialService::new(repo.clone()),
            specs: SpecificationService::new(repo.clone()),
            samples: SampleService::new(repo.clone(), accession),
            results: ResultService::new(repo.clone()),
            coas: CoaService::new(repo.clone()),
            audit: AuditService::new(repo.clone()),
            repo,
        }
    }

    pub fn random_accession(max_attempts: u32) -> Self {
        Self::with_accession(AccessionConfig {
            mode: AccessionMode::Random,
            max_attempts,
        })
    }
}

pub fn paracetamol() -> ReceiveMaterialInput {
    ReceiveMaterialInput {
        material_code: "RM001".to_string(),
        material_name: "Paracetamol".to_string(),
        lot_no: "LOT-2025-001".to_string(),
        vendor: Some("Acme Pharma Chemicals".to_string()),
        received_qty: dec("250.000"),
        unit: "kg".to_string(),
        received_date: Some(on_day(2025, 1, 1)),
    }
}

pub fn numeric_spec(parameter: &str, lower: Option<&str>, upper: Option<&str>) -> AddSpecificationInput {
    AddSpecificationInput {
        parameter: parameter.to_string(),
        method: None,
        unit: None,
        lower_limit: lower.map(dec),
        upper_limit: upper.map(dec),
        textual_limit: None,
    }
}

pub fn textual_spec(parameter: &str, limit: &str) -> AddSpecificationInput {
    AddSpecificationInput {
        parameter: parameter.to_string(),
        method: Some("Visual".to_string()),
        unit: None,
        lower_limit: None,
        upper_limit: None,
        textual_limit: Some(limit.to_string()),
    }
}

pub fn sample_on(date: DateTime<Utc>) -> TakeSampleInput {
    TakeSampleInput {
        sample_date: Some(date),
        remarks: None,
    }
}

pub fn numeric_result(parameter: &str, value: &str) -> RecordResultInput {
    RecordResultInput {
        parameter: parameter.to_string(),
        result_value: Some(value.into()),
        result_text: None,
        unit: None,
    }
}

pub fn textual_result(parameter: &str, text: &str) -> RecordResultInput {
    RecordResultInput {
        parameter: parameter.to_string(),
        result_value: None,
        result_text: Some(text.to_string()),
        unit: None,
    }
}
