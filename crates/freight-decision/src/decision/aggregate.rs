//! Reduces typed shipments into one performance row per awarded forwarder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::criteria::Criterion;
use super::dataset::{forwarder_key, Shipment};
use super::topsis::AlternativePerformance;

/// Tunables for the on-time threshold and the forwarder exclusion list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationOptions {
    /// Award labels that are not forwarders (hand carriage, humanitarian air service).
    pub excluded_forwarders: Vec<String>,
    /// On-time threshold in days for forwarders with a short history.
    pub default_on_time_days: f64,
    /// Multiplier on the forwarder's own average transit once the history is long enough.
    pub on_time_buffer: f64,
    pub relative_threshold_min_shipments: usize,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            excluded_forwarders: vec!["Hand carried".to_string(), "UNHAS".to_string()],
            default_on_time_days: 6.0,
            on_time_buffer: 1.2,
            relative_threshold_min_shipments: 5,
        }
    }
}

impl AggregationOptions {
    fn is_excluded(&self, name: &str) -> bool {
        self.excluded_forwarders
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(name))
    }
}

struct ForwarderGroup<'a> {
    display_name: &'a str,
    shipments: Vec<&'a Shipment>,
}

/// Forwarders without a priced award or a completed delivery have no cost or transit
/// figure and are left out of the result.
pub fn aggregate(shipments: &[Shipment], options: &AggregationOptions) -> Vec<AlternativePerformance> {
    let mut groups: BTreeMap<String, ForwarderGroup<'_>> = BTreeMap::new();

    for shipment in shipments {
        let Some(name) = shipment.awarded_forwarder.as_deref() else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || options.is_excluded(name) {
            continue;
        }

        groups
            .entry(forwarder_key(name))
            .or_insert_with(|| ForwarderGroup {
                display_name: name,
                shipments: Vec::new(),
            })
            .shipments
            .push(shipment);
    }

    let mut performance: Vec<AlternativePerformance> = groups
        .into_values()
        .filter_map(|group| summarize(&group, options))
        .collect();
    performance.sort_by(|left, right| left.id.cmp(&right.id));
    performance
}

fn summarize(
    group: &ForwarderGroup<'_>,
    options: &AggregationOptions,
) -> Option<AlternativePerformance> {
    let total = group.shipments.len();

    let cost_per_kg: Vec<f64> = group
        .shipments
        .iter()
        .filter(|shipment| shipment.weight_kg > 0.0)
        .filter_map(|shipment| {
            shipment
                .awarded_quote()
                .map(|quote| quote / shipment.weight_kg)
        })
        .collect();

    let completed: Vec<&&Shipment> = group
        .shipments
        .iter()
        .filter(|shipment| {
            shipment.is_delivered() && shipment.collected_at.is_some() && shipment.arrived_at.is_some()
        })
        .collect();
    let transit_days: Vec<f64> = completed
        .iter()
        .filter_map(|shipment| shipment.transit_days())
        .filter(|days| *days > 0.0)
        .collect();

    let missing = if cost_per_kg.is_empty() {
        Some(Criterion::Cost)
    } else if transit_days.is_empty() {
        Some(Criterion::Time)
    } else {
        None
    };
    if let Some(criterion) = missing {
        warn!(
            forwarder = group.display_name,
            missing = %criterion,
            shipments = total,
            "forwarder left out of the decision matrix"
        );
        return None;
    }

    let average_transit = mean(&transit_days);

    let threshold = if total > options.relative_threshold_min_shipments {
        average_transit * options.on_time_buffer
    } else {
        options.default_on_time_days
    };
    let on_time = transit_days.iter().filter(|days| **days <= threshold).count();
    let on_time_rate = ratio(on_time, transit_days.len());
    let completion_rate = ratio(completed.len(), total);

    let performance = AlternativePerformance::new(
        group.display_name,
        mean(&cost_per_kg),
        average_transit,
        (on_time_rate + completion_rate) / 2.0,
    )
    .with_source_rows(
        group
            .shipments
            .iter()
            .map(|shipment| shipment.request_reference.clone())
            .collect(),
    );
    Some(performance)
}

/// Callers guarantee a non-empty sample.
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
