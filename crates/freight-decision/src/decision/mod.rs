//! Multi-criteria forwarder selection: AHP weighting, TOPSIS ranking, shipment intake,
//! audit trail, and structured explanations.

pub mod aggregate;
pub mod ahp;
pub mod audit;
pub mod criteria;
pub mod dataset;
pub mod engine;
pub mod explain;
pub mod router;
pub mod topsis;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate, AggregationOptions};
pub use ahp::{
    default_judgments, default_weights, derive_weights, derive_weights_with_threshold,
    AhpJudgment, PairwiseMatrix, WeightDerivation, WeightDerivationError, CONSISTENCY_THRESHOLD,
};
pub use audit::{
    snapshot, AuditEntry, AuditFilter, AuditLedger, AuditOutcome, AuditSummary,
    InMemoryAuditLedger, LedgerError,
};
pub use criteria::{
    CriteriaWeights, Criterion, CriterionMap, Direction, WeightError, WEIGHT_TOLERANCE,
};
pub use dataset::{
    load_shipments, open_shipments, read_shipments, validate, DatasetError, DatasetIdentity,
    RawShipment, Shipment, ValidationError,
};
pub use engine::{
    ConsistencyReport, DecisionEngine, DecisionError, EngineConfig, RankingOutcome,
    RankingRequest, ResolvedWeights, WeightSource, RANK_OPERATION,
};
pub use explain::{
    compare, explain, summarize, ComparisonExplanation, CriterionBreakdown, DecisionExplanation,
    RankingSummary, SpreadBand,
};
pub use router::decision_router;
pub use topsis::{
    analyze, rank, AlternativePerformance, CriterionScore, DecisionMatrix, PerformanceRecord,
    RankedAlternative, RankingError, TopsisAnalysis,
};
