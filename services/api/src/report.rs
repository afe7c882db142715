use crate::infra::{parse_judgments, JudgmentList};
use chrono::Utc;
use clap::Args;
use freight_decision::config::AppConfig;
use freight_decision::decision::dataset::generate_version;
use freight_decision::decision::{
    default_judgments, open_shipments, summarize, CriteriaWeights, Criterion, DecisionEngine,
    DecisionExplanation, InMemoryAuditLedger, RankingOutcome, WeightDerivation, WeightSource,
};
use freight_decision::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    /// Shipment CSV export to aggregate and rank
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Dataset version label recorded in the audit trail (generated when omitted)
    #[arg(long)]
    pub(crate) dataset_version: Option<String>,
    /// Explicit cost weight; requires the time and reliability weights too
    #[arg(long, requires_all = ["time", "reliability"], conflicts_with = "judgments")]
    pub(crate) cost: Option<f64>,
    /// Explicit transit time weight
    #[arg(long, requires_all = ["cost", "reliability"], conflicts_with = "judgments")]
    pub(crate) time: Option<f64>,
    /// Explicit reliability weight
    #[arg(long, requires_all = ["cost", "time"], conflicts_with = "judgments")]
    pub(crate) reliability: Option<f64>,
    /// Pairwise judgments as a JSON array, used to derive weights via AHP
    #[arg(long, value_parser = parse_judgments)]
    pub(crate) judgments: Option<JudgmentList>,
    /// Print a per-criterion breakdown for every forwarder
    #[arg(long)]
    pub(crate) explain: bool,
    /// Emit the ranking outcome as JSON instead of a text report
    #[arg(long)]
    pub(crate) json: bool,
}

impl RankArgs {
    fn weight_source(&self) -> WeightSource {
        if let Some(JudgmentList(judgments)) = &self.judgments {
            return WeightSource::Judgments(judgments.clone());
        }

        match (self.cost, self.time, self.reliability) {
            (Some(cost), Some(time), Some(reliability)) => {
                WeightSource::Explicit(CriteriaWeights::new(cost, time, reliability))
            }
            _ => WeightSource::Default,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct WeightsArgs {
    /// Pairwise judgments as a JSON array (defaults to the calibrated expert set)
    #[arg(long, value_parser = parse_judgments)]
    pub(crate) judgments: Option<JudgmentList>,
}

fn build_engine(config: AppConfig) -> DecisionEngine<InMemoryAuditLedger> {
    DecisionEngine::new(config.engine, Arc::new(InMemoryAuditLedger::new()))
}

pub(crate) fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let engine = build_engine(AppConfig::load()?);
    let rows = open_shipments(&args.csv)?;
    let version = args
        .dataset_version
        .clone()
        .unwrap_or_else(|| generate_version(Utc::now()));

    let outcome = engine.rank_dataset(&rows, version, args.weight_source())?;
    let explanations = if args.explain {
        engine.explain(&outcome)
    } else {
        Vec::new()
    };

    if args.json {
        let payload = serde_json::json!({
            "outcome": outcome,
            "summary": summarize(&outcome.rankings),
            "explanations": explanations,
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Ranking payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_ranking(&outcome, rows.len());
    for explanation in &explanations {
        render_explanation(explanation);
    }
    Ok(())
}

pub(crate) fn run_weights(args: WeightsArgs) -> Result<(), AppError> {
    let engine = build_engine(AppConfig::load()?);
    let judgments = args
        .judgments
        .map(|JudgmentList(judgments)| judgments)
        .unwrap_or_else(default_judgments);

    let derivation = engine.derive_weights(&judgments)?;
    render_weights(&derivation, engine.config().consistency_threshold);
    Ok(())
}

fn render_ranking(outcome: &RankingOutcome, shipment_rows: usize) {
    println!("Forwarder ranking (TOPSIS)");
    println!(
        "Dataset {} ({} shipment rows, {})",
        outcome.dataset.version, shipment_rows, outcome.dataset.hash
    );
    println!(
        "Weights: cost {:.3} | time {:.3} | reliability {:.3}",
        outcome.weights.get(Criterion::Cost),
        outcome.weights.get(Criterion::Time),
        outcome.weights.get(Criterion::Reliability)
    );
    if let Some(consistency) = &outcome.consistency {
        println!(
            "Consistency ratio {:.4} (threshold {}) -> {}",
            consistency.ratio,
            consistency.threshold,
            if consistency.consistent {
                "consistent"
            } else {
                "review judgments"
            }
        );
    }

    for ranked in &outcome.rankings {
        println!(
            "  {}. {} | Ci {:.4} | cost/kg {:.2} | transit {:.1} d | reliability {:.0}% | {} shipments",
            ranked.rank,
            ranked.id,
            ranked.closeness,
            ranked.criteria[Criterion::Cost].raw,
            ranked.criteria[Criterion::Time].raw,
            ranked.criteria[Criterion::Reliability].raw * 100.0,
            ranked.source_rows.len()
        );
    }

    let summary = summarize(&outcome.rankings);
    println!(
        "Spread {:.1}% ({:?}) across {} forwarders",
        summary.spread_ratio * 100.0,
        summary.spread,
        summary.alternatives
    );
}

fn render_explanation(explanation: &DecisionExplanation) {
    println!(
        "\n{} (rank {}, {})",
        explanation.alternative, explanation.rank, explanation.formula
    );
    for (criterion, item) in explanation.breakdown.iter() {
        println!(
            "  - {}: raw {:.3} | weighted {:.4} | attainment {:.0}% | share {:.0}%",
            criterion,
            item.raw,
            item.weighted,
            item.attainment * 100.0,
            item.share * 100.0
        );
    }
}

fn render_weights(derivation: &WeightDerivation, threshold: f64) {
    println!("AHP criteria weights");
    for (criterion, weight) in derivation.weights.as_map().iter() {
        println!("  - {criterion}: {weight:.4}");
    }
    println!(
        "Consistency ratio {:.4} (threshold {threshold}) -> {}",
        derivation.consistency_ratio,
        if derivation.consistency_ok {
            "consistent"
        } else {
            "review judgments"
        }
    );
    println!("Pairwise matrix:");
    for row in Criterion::ALL {
        let cells: Vec<String> = Criterion::ALL
            .iter()
            .map(|column| format!("{:>7.3}", derivation.pairwise.get(row, *column)))
            .collect();
        println!("  {:<12}{}", row.label(), cells.join(" "));
    }
}
