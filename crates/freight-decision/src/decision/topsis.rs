//! TOPSIS ranking over vector-normalized, weighted performance rows.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::criteria::{
    CriteriaWeights, Criterion, CriterionMap, Direction, WeightError, WEIGHT_TOLERANCE,
};

/// Closeness assigned when an alternative coincides with both the ideal and anti-ideal point.
pub const DEGENERATE_CLOSENESS: f64 = 0.5;

/// Aggregated performance of one forwarder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativePerformance {
    pub id: String,
    pub values: CriterionMap<f64>,
    #[serde(default)]
    pub source_rows: Vec<String>,
}

impl AlternativePerformance {
    pub fn new(id: impl Into<String>, cost: f64, time: f64, reliability: f64) -> Self {
        let values = CriterionMap::from_fn(|criterion| match criterion {
            Criterion::Cost => cost,
            Criterion::Time => time,
            Criterion::Reliability => reliability,
        });
        Self {
            id: id.into(),
            values,
            source_rows: Vec::new(),
        }
    }

    pub fn with_source_rows(mut self, rows: Vec<String>) -> Self {
        self.source_rows = rows;
        self
    }
}

/// Boundary form of a performance row where criteria may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub id: String,
    pub values: BTreeMap<Criterion, f64>,
    #[serde(default)]
    pub source_rows: Vec<String>,
}

impl From<AlternativePerformance> for PerformanceRecord {
    fn from(value: AlternativePerformance) -> Self {
        Self {
            id: value.id,
            values: value
                .values
                .iter()
                .map(|(criterion, raw)| (criterion, *raw))
                .collect(),
            source_rows: value.source_rows,
        }
    }
}

/// Ordered, validated set of alternatives sharing the full criterion set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionMatrix {
    rows: Vec<AlternativePerformance>,
}

impl DecisionMatrix {
    pub fn new(rows: Vec<AlternativePerformance>) -> Result<Self, RankingError> {
        if rows.is_empty() {
            return Err(RankingError::EmptyMatrix);
        }

        let mut seen = BTreeSet::new();
        for row in &rows {
            if !seen.insert(row.id.as_str()) {
                return Err(RankingError::DuplicateAlternative(row.id.clone()));
            }
            for (criterion, value) in row.values.iter() {
                if !value.is_finite() || *value < 0.0 {
                    return Err(RankingError::InvalidValue {
                        alternative: row.id.clone(),
                        criterion,
                    });
                }
            }
        }

        Ok(Self { rows })
    }

    /// Builds a matrix from loosely-typed records, rejecting rows that lack a criterion.
    pub fn from_records(records: Vec<PerformanceRecord>) -> Result<Self, RankingError> {
        if records.is_empty() {
            return Err(RankingError::EmptyMatrix);
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            for criterion in Criterion::ALL {
                if !record.values.contains_key(&criterion) {
                    return Err(RankingError::CriterionMismatch {
                        alternative: record.id,
                        criterion,
                    });
                }
            }

            let values = CriterionMap::from_fn(|criterion| record.values[&criterion]);
            rows.push(AlternativePerformance {
                id: record.id,
                values,
                source_rows: record.source_rows,
            });
        }

        Self::new(rows)
    }

    pub fn rows(&self) -> &[AlternativePerformance] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, criterion: Criterion) -> Vec<f64> {
        self.rows.iter().map(|row| row.values[criterion]).collect()
    }
}

/// Per-criterion trace of how an alternative was scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub raw: f64,
    pub normalized: f64,
    pub weighted: f64,
    pub ideal: f64,
    pub anti_ideal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlternative {
    pub id: String,
    pub rank: usize,
    pub closeness: f64,
    pub d_plus: f64,
    pub d_minus: f64,
    pub criteria: CriterionMap<CriterionScore>,
    pub source_rows: Vec<String>,
}

/// Every intermediate structure of one TOPSIS run, in input row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopsisAnalysis {
    pub normalized: Vec<CriterionMap<f64>>,
    pub weighted: Vec<CriterionMap<f64>>,
    pub ideal: CriterionMap<f64>,
    pub anti_ideal: CriterionMap<f64>,
    pub rankings: Vec<RankedAlternative>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankingError {
    #[error("decision matrix has no alternatives")]
    EmptyMatrix,
    #[error("alternative '{alternative}' does not match the criterion set at '{criterion}'")]
    CriterionMismatch {
        alternative: String,
        criterion: Criterion,
    },
    #[error("invalid weights: {0}")]
    InvalidWeights(#[from] WeightError),
    #[error("alternative '{0}' appears more than once")]
    DuplicateAlternative(String),
    #[error("alternative '{alternative}' has a negative or non-finite {criterion} value")]
    InvalidValue {
        alternative: String,
        criterion: Criterion,
    },
}

/// Divides each value by the Euclidean norm of the column; a zero column stays zero.
///
/// The norm is taken over values scaled by the column maximum so large raw figures
/// cannot overflow the sum of squares.
pub fn normalize_column(values: &[f64]) -> Vec<f64> {
    let scale = values.iter().fold(0.0_f64, |max, value| max.max(value.abs()));
    if scale == 0.0 {
        return vec![0.0; values.len()];
    }
    let norm = scale
        * values
            .iter()
            .map(|value| (value / scale).powi(2))
            .sum::<f64>()
            .sqrt();
    values.iter().map(|value| value / norm).collect()
}

pub fn euclidean_distance(left: &CriterionMap<f64>, right: &CriterionMap<f64>) -> f64 {
    Criterion::ALL
        .iter()
        .map(|criterion| {
            let delta = left[*criterion] - right[*criterion];
            delta * delta
        })
        .sum::<f64>()
        .sqrt()
}

pub fn rank(
    matrix: &DecisionMatrix,
    weights: &CriteriaWeights,
) -> Result<Vec<RankedAlternative>, RankingError> {
    analyze(matrix, weights, WEIGHT_TOLERANCE).map(|analysis| analysis.rankings)
}

pub fn analyze(
    matrix: &DecisionMatrix,
    weights: &CriteriaWeights,
    tolerance: f64,
) -> Result<TopsisAnalysis, RankingError> {
    weights.validate(tolerance)?;
    if matrix.is_empty() {
        return Err(RankingError::EmptyMatrix);
    }

    let columns = CriterionMap::from_fn(|criterion| normalize_column(&matrix.column(criterion)));
    let normalized: Vec<CriterionMap<f64>> = (0..matrix.len())
        .map(|index| columns.map(|_, column| column[index]))
        .collect();
    let weighted: Vec<CriterionMap<f64>> = normalized
        .iter()
        .map(|row| row.map(|criterion, value| value * weights.get(criterion)))
        .collect();

    let ideal = CriterionMap::from_fn(|criterion| {
        let column = weighted.iter().map(|row| row[criterion]);
        match criterion.direction() {
            Direction::Minimize => column.fold(f64::INFINITY, f64::min),
            Direction::Maximize => column.fold(f64::NEG_INFINITY, f64::max),
        }
    });
    let anti_ideal = CriterionMap::from_fn(|criterion| {
        let column = weighted.iter().map(|row| row[criterion]);
        match criterion.direction() {
            Direction::Minimize => column.fold(f64::NEG_INFINITY, f64::max),
            Direction::Maximize => column.fold(f64::INFINITY, f64::min),
        }
    });

    let mut rankings: Vec<RankedAlternative> = matrix
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let d_plus = euclidean_distance(&weighted[index], &ideal);
            let d_minus = euclidean_distance(&weighted[index], &anti_ideal);
            let denominator = d_plus + d_minus;
            let closeness = if denominator > 0.0 {
                (d_minus / denominator).clamp(0.0, 1.0)
            } else {
                DEGENERATE_CLOSENESS
            };

            let criteria = CriterionMap::from_fn(|criterion| CriterionScore {
                raw: row.values[criterion],
                normalized: normalized[index][criterion],
                weighted: weighted[index][criterion],
                ideal: ideal[criterion],
                anti_ideal: anti_ideal[criterion],
            });

            RankedAlternative {
                id: row.id.clone(),
                rank: 0,
                closeness,
                d_plus,
                d_minus,
                criteria,
                source_rows: row.source_rows.clone(),
            }
        })
        .collect();

    rankings.sort_by(compare_ranked);
    for (position, ranked) in rankings.iter_mut().enumerate() {
        ranked.rank = position + 1;
    }

    Ok(TopsisAnalysis {
        normalized,
        weighted,
        ideal,
        anti_ideal,
        rankings,
    })
}

fn compare_ranked(left: &RankedAlternative, right: &RankedAlternative) -> Ordering {
    right
        .closeness
        .total_cmp(&left.closeness)
        .then_with(|| left.id.cmp(&right.id))
}
