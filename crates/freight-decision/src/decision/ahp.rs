//! Neutrosophic AHP: pairwise judgments collapse to crisp ratios, the geometric mean of each
//! row approximates the principal eigenvector, and Saaty's consistency ratio grades the input.

use serde::{Deserialize, Serialize};

use super::criteria::{CriteriaWeights, Criterion, CriterionMap};

/// Consistency ratio above which judgments are flagged as unreliable.
pub const CONSISTENCY_THRESHOLD: f64 = 0.1;

/// Smallest magnitude a pairwise entry may take before it is inverted or multiplied.
pub const MIN_PAIRWISE_MAGNITUDE: f64 = 0.01;

/// Saaty's random consistency index for matrices of order 1 through 10.
const RANDOM_INDEX: [f64; 10] = [0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49];
const RANDOM_INDEX_FALLBACK: f64 = 1.5;

/// Expert comparison of two criteria expressed as a triangular neutrosophic number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AhpJudgment {
    pub truth: f64,
    pub indeterminacy: f64,
    pub falsity: f64,
    pub criteria: (Criterion, Criterion),
}

impl AhpJudgment {
    pub fn new(truth: f64, indeterminacy: f64, falsity: f64, a: Criterion, b: Criterion) -> Self {
        Self {
            truth,
            indeterminacy,
            falsity,
            criteria: (a, b),
        }
    }

    /// Relative importance of the first criterion over the second.
    pub fn crisp(&self) -> f64 {
        self.truth - self.falsity
    }

    fn check(&self) -> Result<(), WeightDerivationError> {
        let (a, b) = self.criteria;
        if a == b {
            return Err(WeightDerivationError::InvalidJudgment {
                a,
                b,
                reason: "a criterion cannot be compared with itself",
            });
        }

        let memberships = [self.truth, self.indeterminacy, self.falsity];
        if memberships
            .iter()
            .any(|value| !value.is_finite() || !(0.0..=1.0).contains(value))
        {
            return Err(WeightDerivationError::InvalidJudgment {
                a,
                b,
                reason: "memberships must lie in [0, 1]",
            });
        }

        Ok(())
    }
}

/// Square reciprocal matrix of pairwise importance ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairwiseMatrix(CriterionMap<CriterionMap<f64>>);

impl PairwiseMatrix {
    pub fn neutral() -> Self {
        Self(CriterionMap::from_fn(|_| CriterionMap::from_fn(|_| 1.0)))
    }

    pub fn get(&self, row: Criterion, column: Criterion) -> f64 {
        self.0[row][column]
    }

    fn set(&mut self, row: Criterion, column: Criterion, value: f64) {
        self.0[row][column] = value;
    }

    pub fn from_judgments(judgments: &[AhpJudgment]) -> Result<Self, WeightDerivationError> {
        let mut matrix = Self::neutral();

        for judgment in judgments {
            judgment.check()?;
            let (a, b) = judgment.criteria;
            let crisp = judgment.crisp();
            if crisp == 0.0 {
                return Err(WeightDerivationError::DivisionByZero { a, b });
            }

            let clamped = if crisp.abs() < MIN_PAIRWISE_MAGNITUDE {
                MIN_PAIRWISE_MAGNITUDE.copysign(crisp)
            } else {
                crisp
            };

            matrix.set(a, b, clamped);
            matrix.set(b, a, 1.0 / clamped);
        }

        Ok(matrix)
    }

    /// Ratio matrix `w_i / w_j`; perfectly consistent by construction.
    pub fn from_weights(weights: &CriteriaWeights) -> Self {
        Self(CriterionMap::from_fn(|row| {
            CriterionMap::from_fn(|column| {
                let denominator = weights.get(column).max(f64::MIN_POSITIVE);
                weights.get(row) / denominator
            })
        }))
    }

    fn clamped(&self, row: Criterion, column: Criterion) -> f64 {
        self.get(row, column).max(MIN_PAIRWISE_MAGNITUDE)
    }

    /// Geometric-mean approximation of the principal eigenvector.
    pub fn geometric_mean_weights(&self) -> CriteriaWeights {
        let order = Criterion::ALL.len() as f64;
        let roots = CriterionMap::from_fn(|row| {
            let product: f64 = Criterion::ALL
                .iter()
                .map(|column| self.clamped(row, *column))
                .product();
            product.powf(1.0 / order)
        });

        let sum: f64 = roots.iter().map(|(_, root)| *root).sum();
        CriteriaWeights::from_map(roots.map(|_, root| root / sum))
    }

    /// Saaty consistency ratio of the matrix against the supplied priority vector.
    pub fn consistency_ratio(&self, weights: &CriteriaWeights) -> f64 {
        let n = Criterion::ALL.len();
        let random_index = RANDOM_INDEX
            .get(n - 1)
            .copied()
            .unwrap_or(RANDOM_INDEX_FALLBACK);
        if random_index == 0.0 {
            return 0.0;
        }

        let lambda_max = Criterion::ALL
            .iter()
            .map(|row| {
                let weighted: f64 = Criterion::ALL
                    .iter()
                    .map(|column| self.clamped(*row, *column) * weights.get(*column))
                    .sum();
                weighted / weights.get(*row)
            })
            .sum::<f64>()
            / n as f64;

        let consistency_index = (lambda_max - n as f64) / (n as f64 - 1.0);
        (consistency_index / random_index).max(0.0)
    }
}

/// Weights derived from judgments along with the advisory consistency grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightDerivation {
    pub weights: CriteriaWeights,
    pub consistency_ratio: f64,
    pub consistency_ok: bool,
    pub pairwise: PairwiseMatrix,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightDerivationError {
    #[error("judgment {a} vs {b} collapses to zero and cannot be inverted")]
    DivisionByZero { a: Criterion, b: Criterion },
    #[error("judgment {a} vs {b} is invalid: {reason}")]
    InvalidJudgment {
        a: Criterion,
        b: Criterion,
        reason: &'static str,
    },
}

pub fn derive_weights(judgments: &[AhpJudgment]) -> Result<WeightDerivation, WeightDerivationError> {
    derive_weights_with_threshold(judgments, CONSISTENCY_THRESHOLD)
}

pub fn derive_weights_with_threshold(
    judgments: &[AhpJudgment],
    threshold: f64,
) -> Result<WeightDerivation, WeightDerivationError> {
    let pairwise = PairwiseMatrix::from_judgments(judgments)?;
    let weights = pairwise.geometric_mean_weights();
    let consistency_ratio = pairwise.consistency_ratio(&weights);

    Ok(WeightDerivation {
        weights,
        consistency_ratio,
        consistency_ok: consistency_ratio <= threshold,
        pairwise,
    })
}

/// Calibrated expert judgments used when a caller supplies none.
pub fn default_judgments() -> Vec<AhpJudgment> {
    vec![
        AhpJudgment::new(0.7, 0.2, 0.1, Criterion::Cost, Criterion::Time),
        AhpJudgment::new(0.6, 0.3, 0.1, Criterion::Cost, Criterion::Reliability),
        AhpJudgment::new(0.5, 0.3, 0.2, Criterion::Time, Criterion::Reliability),
    ]
}

/// Fallback weight vector for callers that reject derived weights.
pub fn default_weights() -> CriteriaWeights {
    CriteriaWeights::new(0.4, 0.3, 0.3)
}
