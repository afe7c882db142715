//! Structured, deterministic breakdowns of ranking results.

use serde::{Deserialize, Serialize};

use super::criteria::{CriteriaWeights, Criterion, CriterionMap};
use super::topsis::RankedAlternative;

pub const FORMULA: &str = "TOPSIS+AHP";

/// Relative closeness gap under which two alternatives count as interchangeable.
pub const NEAR_TIE_MARGIN: f64 = 0.05;

const MODERATE_SPREAD: f64 = 0.15;
const SIGNIFICANT_SPREAD: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionBreakdown {
    pub raw: f64,
    pub normalized: f64,
    pub weighted: f64,
    pub weight: f64,
    pub ideal: f64,
    pub anti_ideal: f64,
    /// Position between the anti-ideal (0.0) and the ideal (1.0).
    pub attainment: f64,
    /// Fraction of the alternative's weighted attainment contributed by this criterion.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionExplanation {
    pub alternative: String,
    pub rank: usize,
    pub closeness: f64,
    pub d_plus: f64,
    pub d_minus: f64,
    pub criteria: Vec<Criterion>,
    pub formula: String,
    pub weights: CriteriaWeights,
    pub breakdown: CriterionMap<CriterionBreakdown>,
    /// Criteria ordered by contribution, strongest first.
    pub strengths: Vec<Criterion>,
    pub source_rows: Vec<String>,
}

pub fn explain(ranked: &RankedAlternative, weights: &CriteriaWeights) -> DecisionExplanation {
    let attainment = ranked.criteria.map(|_, score| {
        let span = score.ideal - score.anti_ideal;
        if span == 0.0 {
            1.0
        } else {
            ((score.weighted - score.anti_ideal) / span).clamp(0.0, 1.0)
        }
    });
    let contributions = attainment.map(|criterion, value| value * weights.get(criterion));
    let total: f64 = contributions.iter().map(|(_, value)| *value).sum();

    let breakdown = ranked.criteria.map(|criterion, score| CriterionBreakdown {
        raw: score.raw,
        normalized: score.normalized,
        weighted: score.weighted,
        weight: weights.get(criterion),
        ideal: score.ideal,
        anti_ideal: score.anti_ideal,
        attainment: attainment[criterion],
        share: if total > 0.0 {
            contributions[criterion] / total
        } else {
            0.0
        },
    });

    let mut strengths = Criterion::ALL.to_vec();
    strengths.sort_by(|left, right| {
        contributions[*right]
            .total_cmp(&contributions[*left])
            .then_with(|| left.cmp(right))
    });

    DecisionExplanation {
        alternative: ranked.id.clone(),
        rank: ranked.rank,
        closeness: ranked.closeness,
        d_plus: ranked.d_plus,
        d_minus: ranked.d_minus,
        criteria: Criterion::ALL.to_vec(),
        formula: FORMULA.to_string(),
        weights: *weights,
        breakdown,
        strengths,
        source_rows: ranked.source_rows.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadBand {
    Minor,
    Moderate,
    Significant,
}

impl SpreadBand {
    pub fn classify(spread_ratio: f64) -> Self {
        if spread_ratio > SIGNIFICANT_SPREAD {
            SpreadBand::Significant
        } else if spread_ratio > MODERATE_SPREAD {
            SpreadBand::Moderate
        } else {
            SpreadBand::Minor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub alternatives: usize,
    pub leader: Option<String>,
    pub leader_closeness: Option<f64>,
    pub trailer: Option<String>,
    pub trailer_closeness: Option<f64>,
    /// `(leader - trailer) / leader`, zero when the leader scores zero.
    pub spread_ratio: f64,
    pub spread: SpreadBand,
}

/// Expects rankings in rank order, as returned by the ranking module.
pub fn summarize(rankings: &[RankedAlternative]) -> RankingSummary {
    let leader = rankings.first();
    let trailer = rankings.last();

    let spread_ratio = match (leader, trailer) {
        (Some(top), Some(bottom)) if top.closeness > 0.0 => {
            (top.closeness - bottom.closeness) / top.closeness
        }
        _ => 0.0,
    };

    RankingSummary {
        alternatives: rankings.len(),
        leader: leader.map(|ranked| ranked.id.clone()),
        leader_closeness: leader.map(|ranked| ranked.closeness),
        trailer: trailer.map(|ranked| ranked.id.clone()),
        trailer_closeness: trailer.map(|ranked| ranked.closeness),
        spread_ratio,
        spread: SpreadBand::classify(spread_ratio),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonExplanation {
    pub preferred: String,
    pub other: String,
    pub absolute_difference: f64,
    /// Gap relative to the higher closeness coefficient.
    pub relative_difference: f64,
    pub near_tie: bool,
    /// Criteria where the preferred alternative sits closer to the ideal.
    pub advantages: Vec<Criterion>,
}

pub fn compare(first: &RankedAlternative, second: &RankedAlternative) -> ComparisonExplanation {
    let first_wins = match first.closeness.total_cmp(&second.closeness) {
        std::cmp::Ordering::Equal => first.id <= second.id,
        ordering => ordering.is_gt(),
    };
    let (preferred, other) = if first_wins {
        (first, second)
    } else {
        (second, first)
    };

    let absolute_difference = preferred.closeness - other.closeness;
    let relative_difference = if preferred.closeness > 0.0 {
        absolute_difference / preferred.closeness
    } else {
        0.0
    };

    let advantages = Criterion::ALL
        .into_iter()
        .filter(|criterion| {
            let gap = |ranked: &RankedAlternative| {
                (ranked.criteria[*criterion].weighted - ranked.criteria[*criterion].ideal).abs()
            };
            gap(preferred) < gap(other)
        })
        .collect();

    ComparisonExplanation {
        preferred: preferred.id.clone(),
        other: other.id.clone(),
        absolute_difference,
        relative_difference,
        near_tie: absolute_difference < NEAR_TIE_MARGIN,
        advantages,
    }
}
