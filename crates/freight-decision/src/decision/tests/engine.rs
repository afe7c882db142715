use std::sync::Arc;

use super::common::*;
use crate::decision::ahp::{default_judgments, AhpJudgment};
use crate::decision::audit::{AuditFilter, AuditLedger, AuditOutcome};
use crate::decision::criteria::Criterion;
use crate::decision::engine::{
    DecisionEngine, DecisionError, EngineConfig, RankingRequest, WeightSource, RANK_OPERATION,
};
use crate::decision::topsis::{PerformanceRecord, RankingError};
use crate::decision::ValidationError;

#[test]
fn rank_orders_fixture_and_records_one_entry() {
    let (engine, ledger) = build_engine();

    let outcome = engine.rank(fixture_request()).expect("ranking succeeds");

    let ids: Vec<&str> = outcome.rankings.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["F2", "F1", "F3"]);
    assert!((outcome.rankings[0].closeness - 0.550622).abs() < 1e-6);
    assert_eq!(outcome.weights, fixture_weights());
    assert_eq!(outcome.consistency, None);

    let entries = ledger.query(&AuditFilter::default()).expect("query");
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(Some(entry.id), outcome.audit_entry);
    assert_eq!(entry.operation, RANK_OPERATION);
    assert_eq!(entry.outcome, AuditOutcome::Succeeded);
    assert_eq!(entry.dataset_version, "v1.0.0-test");
    assert_eq!(entry.dataset_hash, "sha256-fixture");
    assert_eq!(entry.session_id, outcome.session_id);
    assert_eq!(entry.weights, Some(fixture_weights()));
    assert_eq!(entry.output[0]["id"], "F2");
}

#[test]
fn failed_rankings_are_audited_and_surface_the_error() {
    let (engine, ledger) = build_engine();

    let empty = RankingRequest {
        alternatives: Vec::new(),
        ..fixture_request()
    };
    let error = engine.rank(empty).expect_err("empty matrix");
    assert!(matches!(error, DecisionError::Ranking(RankingError::EmptyMatrix)));

    let mut partial = fixture_request();
    partial.alternatives[1].values.remove(&Criterion::Reliability);
    let error = engine.rank(partial).expect_err("missing criterion");
    assert!(matches!(
        error,
        DecisionError::Ranking(RankingError::CriterionMismatch { ref alternative, criterion })
            if alternative == "F2" && criterion == Criterion::Reliability
    ));

    let negative = RankingRequest {
        weights: WeightSource::Explicit(crate::decision::CriteriaWeights::new(0.5, -0.2, 0.7)),
        ..fixture_request()
    };
    assert!(matches!(
        engine.rank(negative),
        Err(DecisionError::InvalidWeights(_))
    ));

    let summary = ledger.summary().expect("summary");
    assert_eq!(summary.total_entries, 3);
    assert_eq!(summary.failed_entries, 3);
}

#[test]
fn ledger_grows_by_one_per_call() {
    let (engine, ledger) = build_engine();

    for call in 1..=4 {
        let request = if call % 2 == 0 {
            RankingRequest {
                alternatives: Vec::new(),
                ..fixture_request()
            }
        } else {
            fixture_request()
        };
        let _ = engine.rank(request);
        assert_eq!(ledger.len().expect("len"), call);
    }
}

#[test]
fn unavailable_ledger_never_blocks_the_result() {
    let engine = DecisionEngine::new(EngineConfig::default(), Arc::new(UnavailableLedger));

    let outcome = engine.rank(fixture_request()).expect("ranking still succeeds");

    assert_eq!(outcome.rankings.len(), 3);
    assert_eq!(outcome.audit_entry, None);
    assert!(engine.audit().summary().is_err());
}

#[test]
fn explicit_weights_are_normalized_before_ranking() {
    let (engine, _) = build_engine();
    let request = RankingRequest {
        weights: WeightSource::Explicit(crate::decision::CriteriaWeights::new(4.0, 3.0, 3.0)),
        ..fixture_request()
    };

    let outcome = engine.rank(request).expect("ranking");

    assert!((outcome.weights.sum() - 1.0).abs() < 1e-12);
    assert_eq!(outcome.rankings[0].id, "F2");
}

#[test]
fn judgments_resolve_to_weights_with_a_consistency_report() {
    let (engine, _) = build_engine();
    let request = RankingRequest {
        weights: WeightSource::Judgments(default_judgments()),
        ..fixture_request()
    };

    let outcome = engine.rank(request).expect("ranking");

    let report = outcome.consistency.expect("derived weights carry a report");
    assert!((report.ratio - 0.100948).abs() < 1e-6);
    assert!(!report.consistent);
    assert!((outcome.weights.get(Criterion::Reliability) - 0.562618).abs() < 1e-6);
    // Reliability dominates, so the most reliable forwarder leads.
    assert_eq!(outcome.rankings[0].id, "F3");
}

#[test]
fn strict_engines_reject_inconsistent_judgments() {
    let (engine, ledger) = build_engine_with(EngineConfig {
        reject_inconsistent: true,
        ..EngineConfig::default()
    });

    let error = engine
        .derive_weights(&default_judgments())
        .expect_err("ratio above threshold");
    assert!(matches!(error, DecisionError::InconsistentJudgments { .. }));

    let request = RankingRequest {
        weights: WeightSource::Judgments(default_judgments()),
        ..fixture_request()
    };
    assert!(engine.rank(request).is_err());
    let entries = ledger.query(&AuditFilter::default()).expect("query");
    assert!(entries[0].outcome.is_failure());
    assert_eq!(entries[0].weights, None);

    let lenient = EngineConfig {
        consistency_threshold: 0.15,
        reject_inconsistent: true,
        ..EngineConfig::default()
    };
    let (engine, _) = build_engine_with(lenient);
    assert!(engine.derive_weights(&default_judgments()).is_ok());
}

#[test]
fn degenerate_judgments_fail_weight_resolution() {
    let (engine, _) = build_engine();
    let zero = AhpJudgment::new(0.3, 0.4, 0.3, Criterion::Cost, Criterion::Time);

    assert!(matches!(
        engine.resolve_weights(&WeightSource::Judgments(vec![zero])),
        Err(DecisionError::Weights(_))
    ));
    assert_eq!(
        engine
            .resolve_weights(&WeightSource::Default)
            .expect("defaults")
            .weights,
        fixture_weights()
    );
}

#[test]
fn sessions_tag_entries_and_can_be_reset() {
    let (engine, ledger) = build_engine();
    let first = engine.session_id();
    assert!(first.starts_with("session-"));

    engine.rank(fixture_request()).expect("ranking");
    let second = engine.reset_session();
    assert_ne!(first, second);
    engine.rank(fixture_request()).expect("ranking");

    let filter = AuditFilter::default().session_id(second.clone());
    assert_eq!(ledger.query(&filter).expect("query").len(), 1);
    assert_eq!(engine.session_id(), second);
}

#[test]
fn rank_dataset_aggregates_validates_and_hashes() {
    let (engine, ledger) = build_engine();
    let rows = shipment_rows();

    let outcome = engine
        .rank_dataset(&rows, "v1.0.0-deepbase-test", WeightSource::Default)
        .expect("dataset ranks");

    let ids: Vec<&str> = outcome.rankings.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Kuehne Nagel", "DHL Express", "AGL"]);
    assert!((outcome.rankings[0].closeness - 0.656398).abs() < 1e-6);
    assert_eq!(outcome.rankings[0].criteria[Criterion::Cost].raw, 10.0);
    assert_eq!(outcome.rankings[0].criteria[Criterion::Time].raw, 4.5);
    assert_eq!(outcome.rankings[0].source_rows, vec!["REQ-1", "REQ-2"]);
    assert!(outcome.dataset.hash.starts_with("sha256-"));

    let entries = ledger
        .query(&AuditFilter::default().dataset_version("v1.0.0-deepbase-test"))
        .expect("query");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].dataset_hash, outcome.dataset.hash);
}

#[test]
fn rank_dataset_never_ranks_a_forwarder_without_deliveries() {
    let (engine, _) = build_engine();
    let rows = vec![
        shipment_row("REQ-1", "Kuehne Nagel", "kuehne_nagel", "900", "2024-02-01", "2024-02-04"),
        shipment_row("REQ-2", "Kuehne Nagel", "kuehne_nagel", "950", "2024-02-05", "2024-02-08"),
        shipment_row("REQ-3", "AGL", "agl", "", "2024-02-02", "")
            .with("delivery_status", "Cancelled"),
    ];

    let outcome = engine
        .rank_dataset(&rows, "v-cancelled", WeightSource::Default)
        .expect("dataset ranks");

    let ids: Vec<&str> = outcome.rankings.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Kuehne Nagel"]);
    assert_eq!(outcome.rankings[0].criteria[Criterion::Cost].raw, 9.25);
    assert_eq!(outcome.rankings[0].criteria[Criterion::Time].raw, 3.0);
}

#[test]
fn rank_dataset_rejects_invalid_rows_before_ranking() {
    let (engine, ledger) = build_engine();
    let mut rows = shipment_rows();
    rows[2] = rows[2].clone().with("weight_kg", "heavy");

    let error = engine
        .rank_dataset(&rows, "v-bad", WeightSource::Default)
        .expect_err("malformed weight");
    assert!(matches!(
        error,
        DecisionError::Validation(ValidationError::MalformedValue { row: 2, .. })
    ));
    assert!(matches!(
        engine.rank_dataset(&[], "v-empty", WeightSource::Default),
        Err(DecisionError::Validation(ValidationError::EmptyDataset))
    ));
    assert_eq!(ledger.len().expect("len"), 0);
}

#[test]
fn explanations_follow_ranking_order() {
    let (engine, _) = build_engine();
    let outcome = engine.rank(fixture_request()).expect("ranking");

    let explanations = engine.explain(&outcome);

    assert_eq!(explanations.len(), 3);
    assert_eq!(explanations[0].alternative, "F2");
    assert_eq!(explanations[2].rank, 3);
    assert!(explanations
        .iter()
        .all(|explanation| explanation.formula == "TOPSIS+AHP"));
}

#[test]
fn ranking_is_deterministic_across_calls() {
    let (engine, _) = build_engine();
    let records: Vec<PerformanceRecord> = fixture_records();
    let request = RankingRequest {
        alternatives: records,
        ..fixture_request()
    };

    let first = engine.rank(request.clone()).expect("ranking");
    let second = engine.rank(request).expect("ranking");

    assert_eq!(
        serde_json::to_vec(&first.rankings).expect("serialize"),
        serde_json::to_vec(&second.rankings).expect("serialize")
    );
}
