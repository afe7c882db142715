use std::sync::Arc;

use freight_decision::decision::{
    compare, default_judgments, read_shipments, summarize, AuditFilter, AuditLedger,
    DecisionEngine, EngineConfig, InMemoryAuditLedger, SpreadBand, WeightSource,
};

fn engine() -> (DecisionEngine<InMemoryAuditLedger>, Arc<InMemoryAuditLedger>) {
    let ledger = Arc::new(InMemoryAuditLedger::new());
    (DecisionEngine::new(EngineConfig::default(), ledger.clone()), ledger)
}

fn fixture_rows() -> Vec<freight_decision::decision::RawShipment> {
    let data = include_bytes!("fixtures/shipments.csv");
    read_shipments(&data[..]).expect("fixture parses")
}

#[test]
fn default_weights_favour_the_fastest_forwarder() {
    let (engine, ledger) = engine();

    let outcome = engine
        .rank_dataset(&fixture_rows(), "v1.0.0-fixture", WeightSource::Default)
        .expect("dataset ranks");

    let ids: Vec<&str> = outcome.rankings.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["DHL Express", "Kuehne Nagel", "Kenya Airways"]);
    assert!((outcome.rankings[0].closeness - 0.742721).abs() < 1e-6);
    assert!((outcome.rankings[2].closeness - 0.147876).abs() < 1e-6);

    let summary = summarize(&outcome.rankings);
    assert_eq!(summary.spread, SpreadBand::Significant);
    assert_eq!(ledger.len().expect("len"), 1);
}

#[test]
fn expert_judgments_shift_the_lead_to_reliability() {
    let (engine, _) = engine();

    let outcome = engine
        .rank_dataset(
            &fixture_rows(),
            "v1.0.0-fixture",
            WeightSource::Judgments(default_judgments()),
        )
        .expect("dataset ranks");

    assert_eq!(outcome.rankings[0].id, "Kuehne Nagel");
    assert!((outcome.rankings[0].closeness - 0.697462).abs() < 1e-5);
    let consistency = outcome.consistency.expect("derived weights report consistency");
    assert!(!consistency.consistent);

    let comparison = compare(&outcome.rankings[0], &outcome.rankings[1]);
    assert_eq!(comparison.preferred, "Kuehne Nagel");
    assert!(!comparison.near_tie);
}

#[test]
fn explanations_trace_back_to_shipments() {
    let (engine, _) = engine();
    let outcome = engine
        .rank_dataset(&fixture_rows(), "v1.0.0-fixture", WeightSource::Default)
        .expect("dataset ranks");

    let explanations = engine.explain(&outcome);

    let dhl = &explanations[0];
    assert_eq!(dhl.alternative, "DHL Express");
    assert_eq!(dhl.source_rows, vec!["SR_24-003", "SR_24-006"]);
    assert_eq!(dhl.weights, outcome.weights);
    assert_eq!(dhl.breakdown[freight_decision::decision::Criterion::Time].attainment, 1.0);
}

#[test]
fn audit_trail_separates_dataset_versions() {
    let (engine, ledger) = engine();
    let rows = fixture_rows();

    engine
        .rank_dataset(&rows, "v1.0.0-jan", WeightSource::Default)
        .expect("ranks");
    engine
        .rank_dataset(&rows[..3], "v1.0.0-feb", WeightSource::Default)
        .expect("ranks");
    let _ = engine.rank_dataset(&rows[6..7], "v1.0.0-hand", WeightSource::Default);

    let summary = ledger.summary().expect("summary");
    assert_eq!(summary.total_entries, 3);
    // Hand-carried shipments leave nothing to rank.
    assert_eq!(summary.failed_entries, 1);
    assert_eq!(summary.version_breakdown.get("v1.0.0-feb"), Some(&1));

    let hash_for = |version: &str| {
        let entries = ledger
            .query(&AuditFilter::default().dataset_version(version))
            .expect("query");
        assert_eq!(entries.len(), 1);
        entries[0].dataset_hash.clone()
    };
    assert_ne!(hash_for("v1.0.0-jan"), hash_for("v1.0.0-feb"));
}
