use freight_decision::decision::AhpJudgment;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Judgment set passed on the command line as one JSON array.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JudgmentList(pub(crate) Vec<AhpJudgment>);

pub(crate) fn parse_judgments(raw: &str) -> Result<JudgmentList, String> {
    serde_json::from_str::<Vec<AhpJudgment>>(raw.trim())
        .map(JudgmentList)
        .map_err(|err| format!("failed to parse judgments as a JSON array ({err})"))
}
