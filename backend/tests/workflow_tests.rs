//! Tests for the QC workflow: receipt, sampling, testing and certification

mod common;

use common::*;
use pharma_qc_backend::error::AppError;
use pharma_qc_backend::repository::QcRepository;
use pharma_qc_backend::services::result::RecordResultInput;
use shared::{MaterialStatus, Pagination, Verdict};

// =============================================================================
// End-to-end scenarios
// =============================================================================

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn paracetamol_with_out_of_range_assay_fails() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        assert_eq!(material.status, MaterialStatus::PendingSampling);

        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();
        assert_eq!(sample.accession_number, "AR-20250101-0001");
        assert_eq!(sample.sampler, "qc.officer");
        let material = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material.status, MaterialStatus::Sampled);

        lab.specs
            .add_specification(&actor, material.id, numeric_spec("pH", Some("5.5"), Some("7.5")))
            .await
            .unwrap();
        let ph = lab
            .results
            .record_result(&actor, sample.id, numeric_result("pH", "6.0"))
            .await
            .unwrap();
        assert_eq!(ph.verdict, Verdict::Pass);
        assert_eq!(ph.tested_by, "qc.officer");
        let material = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material.status, MaterialStatus::Testing);

        lab.specs
            .add_specification(&actor, material.id, numeric_spec("Assay", Some("98"), Some("102")))
            .await
            .unwrap();
        let assay = lab
            .results
            .record_result(&actor, sample.id, numeric_result("Assay", "110"))
            .await
            .unwrap();
        assert_eq!(assay.verdict, Verdict::Fail);

        let coa = lab
            .coas
            .generate_or_update_coa(&actor, sample.id, None)
            .await
            .unwrap();
        assert_eq!(coa.overall_verdict, Verdict::Fail);
        let material = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material.status, MaterialStatus::Fail);
    }

    #[tokio::test]
    async fn assay_at_upper_limit_passes() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&actor, material.id, numeric_spec("Assay", Some("98"), Some("102")))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();

        let assay = lab
            .results
            .record_result(&actor, sample.id, numeric_result("Assay", "102.0"))
            .await
            .unwrap();
        assert_eq!(assay.verdict, Verdict::Pass);

        let coa = lab
            .coas
            .generate_or_update_coa(&actor, sample.id, None)
            .await
            .unwrap();
        assert_eq!(coa.overall_verdict, Verdict::Pass);
        let material = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material.status, MaterialStatus::Pass);
    }

    #[tokio::test]
    async fn textual_result_is_judged_case_insensitively() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&actor, material.id, textual_spec("Description", "Complies"))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();

        let passed = lab
            .results
            .record_result(&actor, sample.id, textual_result("Description", "complies "))
            .await
            .unwrap();
        let failed = lab
            .results
            .record_result(&actor, sample.id, textual_result("Description", "Does not comply"))
            .await
            .unwrap();

        assert_eq!(passed.verdict, Verdict::Pass);
        assert_eq!(failed.verdict, Verdict::Fail);
    }
}

// =============================================================================
// Result recording
// =============================================================================

mod result_recording {
    use super::*;

    #[tokio::test]
    async fn result_without_specification_is_recorded_as_fail() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();

        let result = lab
            .results
            .record_result(&actor, sample.id, numeric_result("Loss on drying", "0.2"))
            .await
            .unwrap();
        assert_eq!(result.verdict, Verdict::Fail);
        assert_eq!(lab.results.list_results(sample.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unit_defaults_to_the_specification_unit() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        let mut assay = numeric_spec("Assay", Some("98"), Some("102"));
        assay.unit = Some("%".to_string());
        lab.specs.add_specification(&actor, material.id, assay).await.unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();

        let result = lab
            .results
            .record_result(&actor, sample.id, numeric_result("Assay", "99.1"))
            .await
            .unwrap();
        assert_eq!(result.unit.as_deref(), Some("%"));
    }

    #[tokio::test]
    async fn first_specification_wins_when_several_match() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&actor, material.id, numeric_spec("Assay", Some("98"), Some("102")))
            .await
            .unwrap();
        lab.specs
            .add_specification(&actor, material.id, numeric_spec("Assay", Some("99.5"), Some("100.5")))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();

        let result = lab
            .results
            .record_result(&actor, sample.id, numeric_result("Assay", "101"))
            .await
            .unwrap();
        assert_eq!(result.verdict, Verdict::Pass);

        let specs = lab.specs.find_specs(material.id, "Assay").await.unwrap();
        assert_eq!(specs.len(), 2);
        assert!(lab.specs.find_specs(material.id, "assay").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn result_needs_exactly_one_value() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();

        let neither = RecordResultInput {
            parameter: "Assay".to_string(),
            result_value: None,
            result_text: None,
            unit: None,
        };
        let err = lab.results.record_result(&actor, sample.id, neither).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let garbage = numeric_result("Assay", "ninety-nine");
        let err = lab.results.record_result(&actor, sample.id, garbage).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        assert!(lab.results.list_results(sample.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn result_for_unknown_sample_is_not_found() {
        let lab = Lab::new();
        let err = lab
            .results
            .record_result(&qc_officer(), uuid::Uuid::new_v4(), numeric_result("pH", "6.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

// =============================================================================
// COA generation
// =============================================================================

mod coa_generation {
    use super::*;

    #[tokio::test]
    async fn generation_is_idempotent() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&actor, material.id, numeric_spec("pH", Some("5.5"), Some("7.5")))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();
        lab.results
            .record_result(&actor, sample.id, numeric_result("pH", "6.0"))
            .await
            .unwrap();

        let first = lab
            .coas
            .generate_or_update_coa(&actor, sample.id, Some("Released for production".to_string()))
            .await
            .unwrap();
        let second = lab
            .coas
            .generate_or_update_coa(&actor, sample.id, None)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.overall_verdict, second.overall_verdict);
        assert_eq!(second.notes.as_deref(), Some("Released for production"));
        assert_eq!(lab.repo.list_coa_register().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sample_without_results_is_rejected() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();

        let err = lab
            .coas
            .generate_or_update_coa(&actor, sample.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoResults(ref accession) if *accession == sample.accession_number));
        assert!(lab.repo.get_coa(sample.id).await.unwrap().is_none());
        assert!(matches!(
            lab.coas.get_coa(sample.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        let material = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material.status, MaterialStatus::Sampled);
    }

    #[tokio::test]
    async fn regeneration_follows_new_results() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&actor, material.id, numeric_spec("Assay", Some("98"), Some("102")))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();
        lab.results
            .record_result(&actor, sample.id, numeric_result("Assay", "100"))
            .await
            .unwrap();

        let passed = lab.coas.generate_or_update_coa(&actor, sample.id, None).await.unwrap();
        assert_eq!(passed.overall_verdict, Verdict::Pass);

        // Results may still be added once the material is certified
        lab.results
            .record_result(&actor, sample.id, numeric_result("Assay", "97"))
            .await
            .unwrap();
        let material_now = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material_now.status, MaterialStatus::Pass);

        let failed = lab.coas.generate_or_update_coa(&actor, sample.id, None).await.unwrap();
        assert_eq!(failed.id, passed.id);
        assert_eq!(failed.overall_verdict, Verdict::Fail);
        let material_now = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material_now.status, MaterialStatus::Fail);
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn later_samples_do_not_regress_status() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        let first = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();
        lab.results
            .record_result(&actor, first.id, numeric_result("pH", "6.0"))
            .await
            .unwrap();

        lab.samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 2)))
            .await
            .unwrap();

        let material = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material.status, MaterialStatus::Testing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn results_racing_a_coa_never_undo_its_verdict() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&actor, material.id, numeric_spec("pH", Some("5.0"), Some("7.0")))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();
        lab.results
            .record_result(&actor, sample.id, numeric_result("pH", "6.0"))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let results = lab.results.clone();
            let result_actor = actor.clone();
            handles.push(tokio::spawn(async move {
                results
                    .record_result(&result_actor, sample.id, numeric_result("pH", &format!("6.{}", i % 10)))
                    .await
                    .map(|_| ())
            }));
            if i == 10 {
                let coas = lab.coas.clone();
                let actor = actor.clone();
                handles.push(tokio::spawn(async move {
                    coas.generate_or_update_coa(&actor, sample.id, None)
                        .await
                        .map(|_| ())
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let material = lab.materials.get_material(material.id).await.unwrap();
        assert_eq!(material.status, MaterialStatus::Pass);
    }

    #[tokio::test]
    async fn sampling_unknown_material_is_not_found() {
        let lab = Lab::new();
        let err = lab
            .samples
            .take_sample(&qc_officer(), uuid::Uuid::new_v4(), sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

// =============================================================================
// Materials, deletion and audit
// =============================================================================

mod materials {
    use super::*;

    #[tokio::test]
    async fn receipt_is_validated() {
        let lab = Lab::new();
        let actor = qc_officer();

        let mut bad_code = paracetamol();
        bad_code.material_code = "rm 001".to_string();
        assert!(matches!(
            lab.materials.receive_material(&actor, bad_code).await.unwrap_err(),
            AppError::Validation { .. }
        ));

        let mut no_quantity = paracetamol();
        no_quantity.received_qty = dec("0");
        assert!(matches!(
            lab.materials.receive_material(&actor, no_quantity).await.unwrap_err(),
            AppError::Validation { .. }
        ));

        let mut crossed = numeric_spec("Assay", Some("102"), Some("98"));
        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        assert!(matches!(
            lab.specs.add_specification(&actor, material.id, crossed).await.unwrap_err(),
            AppError::Validation { .. }
        ));
        crossed = numeric_spec("Assay", Some("98"), Some("102"));
        assert!(lab.specs.add_specification(&actor, material.id, crossed).await.is_ok());
    }

    #[tokio::test]
    async fn listing_filters_by_status_and_paginates() {
        let lab = Lab::new();
        let actor = qc_officer();

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(lab.materials.receive_material(&actor, paracetamol()).await.unwrap().id);
        }
        lab.samples
            .take_sample(&actor, ids[0], sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();

        let pending = lab
            .materials
            .list_materials(Some(MaterialStatus::PendingSampling), Pagination::default())
            .await
            .unwrap();
        assert_eq!(pending.pagination.total_items, 2);

        let first_page = lab
            .materials
            .list_materials(None, Pagination::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(first_page.data.len(), 2);
        assert_eq!(first_page.pagination.total_items, 3);
        assert_eq!(first_page.pagination.total_pages, 2);

        let summary = lab.materials.status_summary().await.unwrap();
        assert_eq!(summary.pending_sampling, 2);
        assert_eq!(summary.sampled, 1);
        assert_eq!(summary.total(), 3);
    }

    #[tokio::test]
    async fn deleting_a_material_cascades() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&actor, material.id, numeric_spec("pH", Some("5.5"), Some("7.5")))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();
        lab.results
            .record_result(&actor, sample.id, numeric_result("pH", "6.0"))
            .await
            .unwrap();
        lab.coas.generate_or_update_coa(&actor, sample.id, None).await.unwrap();

        lab.materials.delete_material(&actor, material.id).await.unwrap();

        assert!(lab.repo.get_material(material.id).await.unwrap().is_none());
        assert!(lab.repo.get_sample(sample.id).await.unwrap().is_none());
        assert!(lab.repo.list_results(sample.id).await.unwrap().is_empty());
        assert!(lab.repo.get_coa(sample.id).await.unwrap().is_none());
        assert!(lab.repo.list_specifications(material.id).await.unwrap().is_empty());

        let again = lab.materials.delete_material(&actor, material.id).await.unwrap_err();
        assert!(matches!(again, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn detail_views_include_owned_records() {
        let lab = Lab::new();
        let actor = qc_officer();

        let material = lab.materials.receive_material(&actor, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&actor, material.id, numeric_spec("pH", Some("5.5"), Some("7.5")))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&actor, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();
        lab.results
            .record_result(&actor, sample.id, numeric_result("pH", "6.0"))
            .await
            .unwrap();

        let detail = lab.materials.get_material_detail(material.id).await.unwrap();
        assert_eq!(detail.samples.len(), 1);
        assert_eq!(detail.specifications.len(), 1);

        let sample_detail = lab.samples.get_sample_detail(sample.id).await.unwrap();
        assert_eq!(sample_detail.results.len(), 1);
        assert!(sample_detail.coa.is_none());
    }

    #[tokio::test]
    async fn every_mutation_is_audited_with_its_actor() {
        let lab = Lab::new();
        let receiver = pharma_qc_backend::services::Actor::new("warehouse.clerk");
        let analyst = qc_officer();

        let material = lab.materials.receive_material(&receiver, paracetamol()).await.unwrap();
        lab.specs
            .add_specification(&analyst, material.id, numeric_spec("pH", Some("5.5"), Some("7.5")))
            .await
            .unwrap();
        let sample = lab
            .samples
            .take_sample(&analyst, material.id, sample_on(on_day(2025, 1, 1)))
            .await
            .unwrap();
        lab.results
            .record_result(&analyst, sample.id, numeric_result("pH", "6.0"))
            .await
            .unwrap();
        lab.coas.generate_or_update_coa(&analyst, sample.id, None).await.unwrap();

        let entries = lab.audit.recent(None).await.unwrap();
        assert_eq!(entries.len(), 5);
        assert!(entries[0].action.contains("Generated COA"));
        assert_eq!(entries[4].user_id, "warehouse.clerk");
        assert!(entries[..4].iter().all(|e| e.user_id == "qc.officer"));
    }
}
