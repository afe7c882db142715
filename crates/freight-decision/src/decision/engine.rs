use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::aggregate::{aggregate, AggregationOptions};
use super::ahp::{
    default_weights, derive_weights_with_threshold, AhpJudgment, WeightDerivation,
    WeightDerivationError, CONSISTENCY_THRESHOLD,
};
use super::audit::{snapshot, AuditEntry, AuditLedger, LedgerError};
use super::criteria::{CriteriaWeights, WeightError, WEIGHT_TOLERANCE};
use super::dataset::{load_shipments, DatasetIdentity, RawShipment, ValidationError};
use super::explain::{explain, DecisionExplanation};
use super::topsis::{analyze, DecisionMatrix, PerformanceRecord, RankedAlternative, RankingError};

/// Operation name stamped on audit entries for ranking calls.
pub const RANK_OPERATION: &str = "topsis_rank";

/// Runtime knobs for the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub consistency_threshold: f64,
    pub weight_tolerance: f64,
    /// Fail weight derivation outright instead of warning when judgments are inconsistent.
    pub reject_inconsistent: bool,
    #[serde(default)]
    pub aggregation: AggregationOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            consistency_threshold: CONSISTENCY_THRESHOLD,
            weight_tolerance: WEIGHT_TOLERANCE,
            reject_inconsistent: false,
            aggregation: AggregationOptions::default(),
        }
    }
}

/// Where the weights for a ranking call come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// Caller-supplied weights; rescaled to sum to one before use.
    Explicit(CriteriaWeights),
    Judgments(Vec<AhpJudgment>),
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub ratio: f64,
    pub threshold: f64,
    pub consistent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWeights {
    pub weights: CriteriaWeights,
    /// Present only when the weights were derived from judgments.
    pub consistency: Option<ConsistencyReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRequest {
    pub alternatives: Vec<PerformanceRecord>,
    #[serde(default)]
    pub weights: WeightSource,
    pub dataset: DatasetIdentity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub rankings: Vec<RankedAlternative>,
    pub weights: CriteriaWeights,
    pub consistency: Option<ConsistencyReport>,
    pub dataset: DatasetIdentity,
    pub session_id: String,
    /// Identifier of the audit entry, absent when the ledger could not record it.
    pub audit_entry: Option<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ranking(#[from] RankingError),
    #[error(transparent)]
    Weights(#[from] WeightDerivationError),
    #[error("invalid weights: {0}")]
    InvalidWeights(#[from] WeightError),
    #[error("judgments are inconsistent (ratio {ratio:.4} exceeds {threshold})")]
    InconsistentJudgments { ratio: f64, threshold: f64 },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Facade tying weight resolution, ranking, explanation, and auditing together.
pub struct DecisionEngine<L> {
    config: EngineConfig,
    ledger: Arc<L>,
    session: RwLock<String>,
}

fn new_session_id() -> String {
    format!("session-{}", Uuid::new_v4())
}

impl<L> DecisionEngine<L>
where
    L: AuditLedger + 'static,
{
    pub fn new(config: EngineConfig, ledger: Arc<L>) -> Self {
        Self {
            config,
            ledger,
            session: RwLock::new(new_session_id()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session_id(&self) -> String {
        match self.session.read() {
            Ok(session) => session.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Starts a new audit session and returns its identifier.
    pub fn reset_session(&self) -> String {
        let next = new_session_id();
        match self.session.write() {
            Ok(mut session) => *session = next.clone(),
            Err(poisoned) => *poisoned.into_inner() = next.clone(),
        }
        info!(session_id = %next, "started decision session");
        next
    }

    pub fn derive_weights(
        &self,
        judgments: &[AhpJudgment],
    ) -> Result<WeightDerivation, DecisionError> {
        let threshold = self.config.consistency_threshold;
        let derivation = derive_weights_with_threshold(judgments, threshold)?;
        debug!(
            judgments = judgments.len(),
            consistency_ratio = derivation.consistency_ratio,
            "derived criteria weights"
        );

        if !derivation.consistency_ok {
            warn!(
                consistency_ratio = derivation.consistency_ratio,
                threshold, "pairwise judgments exceed the consistency threshold"
            );
            if self.config.reject_inconsistent {
                return Err(DecisionError::InconsistentJudgments {
                    ratio: derivation.consistency_ratio,
                    threshold,
                });
            }
        }

        Ok(derivation)
    }

    pub fn resolve_weights(&self, source: &WeightSource) -> Result<ResolvedWeights, DecisionError> {
        match source {
            WeightSource::Explicit(weights) => Ok(ResolvedWeights {
                weights: weights.normalized()?,
                consistency: None,
            }),
            WeightSource::Judgments(judgments) => {
                let derivation = self.derive_weights(judgments)?;
                Ok(ResolvedWeights {
                    weights: derivation.weights,
                    consistency: Some(ConsistencyReport {
                        ratio: derivation.consistency_ratio,
                        threshold: self.config.consistency_threshold,
                        consistent: derivation.consistency_ok,
                    }),
                })
            }
            WeightSource::Default => Ok(ResolvedWeights {
                weights: default_weights(),
                consistency: None,
            }),
        }
    }

    /// Ranks the alternatives and appends exactly one audit entry, whatever the outcome.
    pub fn rank(&self, request: RankingRequest) -> Result<RankingOutcome, DecisionError> {
        let session_id = self.session_id();
        info!(
            dataset_version = %request.dataset.version,
            alternatives = request.alternatives.len(),
            "ranking request received"
        );

        let entry = AuditEntry::new(RANK_OPERATION, &request.dataset, session_id.clone())
            .with_input(snapshot(&request));

        let resolved = match self.resolve_weights(&request.weights) {
            Ok(resolved) => resolved,
            Err(error) => return Err(self.reject(entry, error)),
        };
        let entry = entry.with_weights(resolved.weights);

        let rankings = match DecisionMatrix::from_records(request.alternatives)
            .and_then(|matrix| analyze(&matrix, &resolved.weights, self.config.weight_tolerance))
        {
            Ok(analysis) => analysis.rankings,
            Err(error) => return Err(self.reject(entry, error.into())),
        };

        let entry = entry.with_output(snapshot(&rankings));
        let audit_entry = self.append(entry);
        if let Some(leader) = rankings.first() {
            info!(leader = %leader.id, closeness = leader.closeness, "ranking completed");
        }

        Ok(RankingOutcome {
            rankings,
            weights: resolved.weights,
            consistency: resolved.consistency,
            dataset: request.dataset,
            session_id,
            audit_entry,
        })
    }

    /// Validates, types, and aggregates raw shipment rows before ranking them.
    ///
    /// Validation failures surface before any ranking happens and are not audited.
    pub fn rank_dataset(
        &self,
        rows: &[RawShipment],
        version: impl Into<String>,
        weights: WeightSource,
    ) -> Result<RankingOutcome, DecisionError> {
        let shipments = load_shipments(rows)?;
        let dataset = DatasetIdentity::for_rows(version, rows);
        let alternatives: Vec<PerformanceRecord> = aggregate(&shipments, &self.config.aggregation)
            .into_iter()
            .map(PerformanceRecord::from)
            .collect();
        debug!(
            shipments = shipments.len(),
            forwarders = alternatives.len(),
            dataset_hash = %dataset.hash,
            "aggregated shipment dataset"
        );

        self.rank(RankingRequest {
            alternatives,
            weights,
            dataset,
        })
    }

    pub fn explain(&self, outcome: &RankingOutcome) -> Vec<DecisionExplanation> {
        outcome
            .rankings
            .iter()
            .map(|ranked| explain(ranked, &outcome.weights))
            .collect()
    }

    pub fn audit(&self) -> &L {
        &self.ledger
    }

    fn reject(&self, entry: AuditEntry, error: DecisionError) -> DecisionError {
        warn!(error = %error, "ranking failed");
        self.append(entry.failed(error.to_string()));
        error
    }

    fn append(&self, entry: AuditEntry) -> Option<Uuid> {
        let id = entry.id;
        match self.ledger.record(entry) {
            Ok(()) => Some(id),
            Err(error) => {
                warn!(error = %error, "audit entry was not recorded");
                None
            }
        }
    }
}
