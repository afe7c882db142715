use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::decision::audit::{AuditEntry, AuditFilter, AuditLedger, LedgerError};
use crate::decision::dataset::{DatasetIdentity, RawShipment};
use crate::decision::engine::{DecisionEngine, EngineConfig, RankingRequest, WeightSource};
use crate::decision::topsis::{AlternativePerformance, PerformanceRecord};
use crate::decision::{decision_router, CriteriaWeights, InMemoryAuditLedger};

pub(super) fn dataset() -> DatasetIdentity {
    DatasetIdentity::new("v1.0.0-test", "sha256-fixture")
}

pub(super) fn fixture_records() -> Vec<PerformanceRecord> {
    vec![
        AlternativePerformance::new("F1", 10.0, 5.0, 0.9).into(),
        AlternativePerformance::new("F2", 8.0, 6.0, 0.8).into(),
        AlternativePerformance::new("F3", 12.0, 4.0, 0.95).into(),
    ]
}

pub(super) fn fixture_weights() -> CriteriaWeights {
    CriteriaWeights::new(0.4, 0.3, 0.3)
}

pub(super) fn fixture_request() -> RankingRequest {
    RankingRequest {
        alternatives: fixture_records(),
        weights: WeightSource::Explicit(fixture_weights()),
        dataset: dataset(),
    }
}

pub(super) fn build_engine() -> (DecisionEngine<InMemoryAuditLedger>, Arc<InMemoryAuditLedger>) {
    build_engine_with(EngineConfig::default())
}

pub(super) fn build_engine_with(
    config: EngineConfig,
) -> (DecisionEngine<InMemoryAuditLedger>, Arc<InMemoryAuditLedger>) {
    let ledger = Arc::new(InMemoryAuditLedger::new());
    let engine = DecisionEngine::new(config, ledger.clone());
    (engine, ledger)
}

pub(super) fn shipment_row(
    reference: &str,
    forwarder: &str,
    quote_column: &str,
    quote: &str,
    collected: &str,
    arrived: &str,
) -> RawShipment {
    RawShipment::new()
        .with("request_reference", reference)
        .with("origin_country", "Kenya")
        .with("destination_country", "South Sudan")
        .with("weight_kg", "100")
        .with("delivery_status", "Delivered")
        .with("final_quote_awarded_freight_forwader_carrier", forwarder)
        .with(quote_column, quote)
        .with("date_of_collection", collected)
        .with("date_of_arrival_destination", arrived)
}

pub(super) fn shipment_rows() -> Vec<RawShipment> {
    vec![
        shipment_row("REQ-1", "Kuehne Nagel", "kuehne_nagel", "900", "2024-02-01", "2024-02-05"),
        shipment_row("REQ-2", "Kuehne Nagel", "kuehne_nagel", "1100", "2024-02-03", "2024-02-08"),
        shipment_row("REQ-3", "DHL Express", "dhl_express", "1400", "2024-02-02", "2024-02-04"),
        shipment_row("REQ-4", "AGL", "agl", "700", "2024-02-01", "2024-02-10"),
    ]
}

#[derive(Default)]
pub(super) struct UnavailableLedger;

impl AuditLedger for UnavailableLedger {
    fn record(&self, _entry: AuditEntry) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }

    fn query(&self, _filter: &AuditFilter) -> Result<Vec<AuditEntry>, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }
}

pub(super) fn router_with_engine(engine: DecisionEngine<InMemoryAuditLedger>) -> axum::Router {
    decision_router(Arc::new(engine))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
