use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::Utc;
use freight_decision::decision::dataset::generate_version;
use freight_decision::decision::{
    decision_router, read_shipments, summarize, AuditLedger, DecisionEngine, DecisionExplanation,
    RankingOutcome, RankingSummary, WeightSource,
};
use freight_decision::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct DatasetRankRequest {
    /// Raw shipment export, header row included.
    pub(crate) csv: String,
    #[serde(default)]
    pub(crate) dataset_version: Option<String>,
    #[serde(default)]
    pub(crate) weights: WeightSource,
    #[serde(default)]
    pub(crate) explain: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DatasetRankResponse {
    pub(crate) shipment_rows: usize,
    pub(crate) outcome: RankingOutcome,
    pub(crate) summary: RankingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) explanations: Option<Vec<DecisionExplanation>>,
}

pub(crate) fn with_decision_routes<L>(engine: Arc<DecisionEngine<L>>) -> axum::Router
where
    L: AuditLedger + 'static,
{
    decision_router(engine.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/datasets/rank",
            axum::routing::post(dataset_rank_endpoint::<L>),
        )
        .layer(Extension(engine))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn dataset_rank_endpoint<L>(
    Extension(engine): Extension<Arc<DecisionEngine<L>>>,
    Json(payload): Json<DatasetRankRequest>,
) -> Result<Json<DatasetRankResponse>, AppError>
where
    L: AuditLedger + 'static,
{
    let DatasetRankRequest {
        csv,
        dataset_version,
        weights,
        explain,
    } = payload;

    let rows = read_shipments(Cursor::new(csv.into_bytes()))?;
    let version = dataset_version.unwrap_or_else(|| generate_version(Utc::now()));
    let outcome = engine.rank_dataset(&rows, version, weights)?;
    let explanations = explain.then(|| engine.explain(&outcome));

    Ok(Json(DatasetRankResponse {
        shipment_rows: rows.len(),
        summary: summarize(&outcome.rankings),
        outcome,
        explanations,
    }))
}
