use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tolerance used when checking that a weight vector sums to one.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Dimension along which forwarders are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Cost,
    Time,
    Reliability,
}

/// Whether lower or higher raw values are preferred for a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Minimize,
    Maximize,
}

impl Criterion {
    pub const ALL: [Criterion; 3] = [Criterion::Cost, Criterion::Time, Criterion::Reliability];

    pub fn direction(self) -> Direction {
        match self {
            Criterion::Cost | Criterion::Time => Direction::Minimize,
            Criterion::Reliability => Direction::Maximize,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Criterion::Cost => "cost",
            Criterion::Time => "time",
            Criterion::Reliability => "reliability",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cost" => Some(Criterion::Cost),
            "time" | "transit_time" => Some(Criterion::Time),
            "reliability" => Some(Criterion::Reliability),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Criterion::Cost => 0,
            Criterion::Time => 1,
            Criterion::Reliability => 2,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Complete mapping from every [`Criterion`] to a value.
///
/// Serialized as a JSON object keyed by criterion label. Deserialization fails when any
/// criterion is absent, so partially populated maps never reach the ranking code.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CriterionMap<T> {
    values: [T; 3],
}

impl<T> CriterionMap<T> {
    pub fn from_fn(mut f: impl FnMut(Criterion) -> T) -> Self {
        Self {
            values: Criterion::ALL.map(&mut f),
        }
    }

    pub fn get(&self, criterion: Criterion) -> &T {
        &self.values[criterion.index()]
    }

    pub fn get_mut(&mut self, criterion: Criterion) -> &mut T {
        &mut self.values[criterion.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, &T)> + '_ {
        Criterion::ALL.into_iter().zip(self.values.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Criterion, &T) -> U) -> CriterionMap<U> {
        CriterionMap::from_fn(|criterion| f(criterion, self.get(criterion)))
    }
}

impl<T> Index<Criterion> for CriterionMap<T> {
    type Output = T;

    fn index(&self, criterion: Criterion) -> &T {
        self.get(criterion)
    }
}

impl<T> IndexMut<Criterion> for CriterionMap<T> {
    fn index_mut(&mut self, criterion: Criterion) -> &mut T {
        self.get_mut(criterion)
    }
}

impl<T: Serialize> Serialize for CriterionMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for CriterionMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw = BTreeMap::<Criterion, T>::deserialize(deserializer)?;
        let mut take = |criterion: Criterion| {
            raw.remove(&criterion)
                .ok_or_else(|| D::Error::custom(format!("missing criterion '{criterion}'")))
        };

        Ok(Self {
            values: [
                take(Criterion::Cost)?,
                take(Criterion::Time)?,
                take(Criterion::Reliability)?,
            ],
        })
    }
}

/// Relative importance assigned to each criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaWeights(CriterionMap<f64>);

impl CriteriaWeights {
    pub fn new(cost: f64, time: f64, reliability: f64) -> Self {
        Self(CriterionMap {
            values: [cost, time, reliability],
        })
    }

    pub fn from_map(values: CriterionMap<f64>) -> Self {
        Self(values)
    }

    pub fn uniform() -> Self {
        Self::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        *self.0.get(criterion)
    }

    pub fn as_map(&self) -> &CriterionMap<f64> {
        &self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().map(|(_, weight)| *weight).sum()
    }

    /// Returns a copy with one criterion replaced, leaving the others untouched.
    pub fn with_weight(mut self, criterion: Criterion, weight: f64) -> Self {
        self.0[criterion] = weight;
        self
    }

    /// Rescales the vector so it sums to one.
    pub fn normalized(&self) -> Result<Self, WeightError> {
        self.check_entries()?;
        let sum = self.sum();
        if sum <= 0.0 {
            return Err(WeightError::ZeroSum);
        }

        Ok(Self(self.0.map(|_, weight| weight / sum)))
    }

    /// Checks that the vector is already normalized within `tolerance`.
    pub fn validate(&self, tolerance: f64) -> Result<(), WeightError> {
        self.check_entries()?;
        let sum = self.sum();
        if sum <= 0.0 {
            return Err(WeightError::ZeroSum);
        }
        if (sum - 1.0).abs() > tolerance {
            return Err(WeightError::NotNormalized { sum });
        }
        Ok(())
    }

    fn check_entries(&self) -> Result<(), WeightError> {
        for (criterion, weight) in self.0.iter() {
            if !weight.is_finite() {
                return Err(WeightError::NonFinite { criterion });
            }
            if *weight < 0.0 {
                return Err(WeightError::Negative {
                    criterion,
                    value: *weight,
                });
            }
        }
        Ok(())
    }
}

/// Reasons a weight vector cannot be used for ranking.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("weight for {criterion} is negative ({value})")]
    Negative { criterion: Criterion, value: f64 },
    #[error("weight for {criterion} is not a finite number")]
    NonFinite { criterion: Criterion },
    #[error("weights sum to zero")]
    ZeroSum,
    #[error("weights sum to {sum}, expected 1.0")]
    NotNormalized { sum: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_fixed_per_criterion() {
        assert_eq!(Criterion::Cost.direction(), Direction::Minimize);
        assert_eq!(Criterion::Time.direction(), Direction::Minimize);
        assert_eq!(Criterion::Reliability.direction(), Direction::Maximize);
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let samples = [
            CriteriaWeights::new(4.0, 3.0, 3.0),
            CriteriaWeights::new(0.1, 0.0, 0.0),
            CriteriaWeights::new(1e-6, 7.5, 123.0),
            CriteriaWeights::new(1.0 / 3.0, 1.0 / 7.0, 1.0 / 11.0),
        ];

        for weights in samples {
            let normalized = weights.normalized().expect("valid weights");
            assert!((normalized.sum() - 1.0).abs() <= WEIGHT_TOLERANCE);
            normalized
                .validate(WEIGHT_TOLERANCE)
                .expect("normalized weights validate");
        }
    }

    #[test]
    fn rejects_negative_and_zero_sum_vectors() {
        match CriteriaWeights::new(0.5, -0.1, 0.6).normalized() {
            Err(WeightError::Negative { criterion, .. }) => assert_eq!(criterion, Criterion::Time),
            other => panic!("expected negative weight error, got {other:?}"),
        }
        assert_eq!(
            CriteriaWeights::new(0.0, 0.0, 0.0).normalized(),
            Err(WeightError::ZeroSum)
        );
        assert!(matches!(
            CriteriaWeights::new(f64::NAN, 0.5, 0.5).validate(WEIGHT_TOLERANCE),
            Err(WeightError::NonFinite {
                criterion: Criterion::Cost
            })
        ));
    }

    #[test]
    fn validate_flags_unnormalized_vectors() {
        let err = CriteriaWeights::new(0.4, 0.4, 0.4)
            .validate(WEIGHT_TOLERANCE)
            .expect_err("sum is 1.2");
        assert!(matches!(err, WeightError::NotNormalized { .. }));
    }

    #[test]
    fn criterion_map_round_trips_through_json_and_requires_every_key() {
        let weights = CriteriaWeights::new(0.4, 0.3, 0.3);
        let json = serde_json::to_value(weights).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "cost": 0.4, "time": 0.3, "reliability": 0.3 })
        );

        let missing = serde_json::from_value::<CriteriaWeights>(
            serde_json::json!({ "cost": 0.5, "time": 0.5 }),
        )
        .expect_err("reliability missing");
        assert!(missing.to_string().contains("reliability"));
    }

    #[test]
    fn parse_accepts_labels_and_aliases() {
        assert_eq!(Criterion::parse(" Cost "), Some(Criterion::Cost));
        assert_eq!(Criterion::parse("transit_time"), Some(Criterion::Time));
        assert_eq!(Criterion::parse("speed"), None);
    }
}
