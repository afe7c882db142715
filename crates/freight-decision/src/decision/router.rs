use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ahp::{default_judgments, AhpJudgment};
use super::audit::{AuditFilter, AuditLedger};
use super::engine::{DecisionEngine, DecisionError, RankingOutcome, RankingRequest};
use super::explain::{summarize, DecisionExplanation, RankingSummary};

/// Router builder exposing weight derivation, ranking, and audit lookups.
pub fn decision_router<L>(engine: Arc<DecisionEngine<L>>) -> Router
where
    L: AuditLedger + 'static,
{
    Router::new()
        .route("/api/v1/decisions/weights", post(weights_handler::<L>))
        .route("/api/v1/decisions/rank", post(rank_handler::<L>))
        .route("/api/v1/audit", get(audit_handler::<L>))
        .route("/api/v1/audit/summary", get(audit_summary_handler::<L>))
        .with_state(engine)
}

/// HTTP status for an engine failure; caller mistakes are client errors.
pub fn status_for(error: &DecisionError) -> StatusCode {
    match error {
        DecisionError::InvalidWeights(_) => StatusCode::BAD_REQUEST,
        DecisionError::Validation(_)
        | DecisionError::Ranking(_)
        | DecisionError::Weights(_)
        | DecisionError::InconsistentJudgments { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DecisionError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: DecisionError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_for(&error), axum::Json(payload)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WeightsRequest {
    #[serde(default)]
    judgments: Option<Vec<AhpJudgment>>,
}

pub(crate) async fn weights_handler<L>(
    State(engine): State<Arc<DecisionEngine<L>>>,
    axum::Json(request): axum::Json<WeightsRequest>,
) -> Response
where
    L: AuditLedger + 'static,
{
    let judgments = request.judgments.unwrap_or_else(default_judgments);
    match engine.derive_weights(&judgments) {
        Ok(derivation) => (StatusCode::OK, axum::Json(derivation)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankBody {
    #[serde(flatten)]
    request: RankingRequest,
    #[serde(default)]
    explain: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankResponse {
    #[serde(flatten)]
    outcome: RankingOutcome,
    summary: RankingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanations: Option<Vec<DecisionExplanation>>,
}

pub(crate) async fn rank_handler<L>(
    State(engine): State<Arc<DecisionEngine<L>>>,
    axum::Json(body): axum::Json<RankBody>,
) -> Response
where
    L: AuditLedger + 'static,
{
    match engine.rank(body.request) {
        Ok(outcome) => {
            let explanations = body.explain.then(|| engine.explain(&outcome));
            let response = RankResponse {
                summary: summarize(&outcome.rankings),
                outcome,
                explanations,
            };
            (StatusCode::OK, axum::Json(response)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn audit_handler<L>(
    State(engine): State<Arc<DecisionEngine<L>>>,
    Query(filter): Query<AuditFilter>,
) -> Response
where
    L: AuditLedger + 'static,
{
    match engine.audit().query(&filter) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn audit_summary_handler<L>(
    State(engine): State<Arc<DecisionEngine<L>>>,
) -> Response
where
    L: AuditLedger + 'static,
{
    match engine.audit().summary() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error.into()),
    }
}
