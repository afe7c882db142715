use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::normalizer::forwarder_key;
use super::validator::ValidationError;

pub const REQUEST_REFERENCE: &str = "request_reference";
pub const ORIGIN_COUNTRY: &str = "origin_country";
pub const DESTINATION_COUNTRY: &str = "destination_country";
pub const WEIGHT_KG: &str = "weight_kg";
pub const VOLUME_CBM: &str = "volume_cbm";
pub const DELIVERY_STATUS: &str = "delivery_status";
pub const DATE_OF_COLLECTION: &str = "date_of_collection";
pub const DATE_OF_ARRIVAL: &str = "date_of_arrival_destination";
pub const AWARDED_FORWARDER: &str = "final_quote_awarded_freight_forwader_carrier";
pub const AWARDED_FORWARDER_ALIAS: &str = "awarded_forwarder";

pub const REQUIRED_FIELDS: [&str; 5] = [
    REQUEST_REFERENCE,
    ORIGIN_COUNTRY,
    DESTINATION_COUNTRY,
    WEIGHT_KG,
    DELIVERY_STATUS,
];

/// Forwarders whose quotes appear as dedicated columns in the shipment export.
pub const KNOWN_FORWARDERS: [&str; 9] = [
    "kenya_airways",
    "kuehne_nagel",
    "scan_global_logistics",
    "dhl_express",
    "dhl_global",
    "bwosi",
    "agl",
    "siginon",
    "frieght_in_time",
];

/// Untyped shipment row as it arrived from an export, keyed by normalized column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawShipment {
    fields: BTreeMap<String, String>,
}

impl RawShipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Trimmed value of a field; blank cells read as absent.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawShipment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}

/// Typed shipment derived from a validated [`RawShipment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub request_reference: String,
    pub origin_country: String,
    pub destination_country: String,
    pub weight_kg: f64,
    pub volume_cbm: Option<f64>,
    pub delivery_status: String,
    pub awarded_forwarder: Option<String>,
    pub collected_at: Option<NaiveDateTime>,
    pub arrived_at: Option<NaiveDateTime>,
    pub forwarder_quotes: BTreeMap<String, f64>,
}

impl Shipment {
    /// `row` is the zero-based position used in error reports.
    pub fn from_raw(row: usize, raw: &RawShipment) -> Result<Self, ValidationError> {
        let required = |field: &str| {
            raw.get(field)
                .map(str::to_string)
                .ok_or_else(|| ValidationError::MissingField {
                    row,
                    field: field.to_string(),
                })
        };

        let weight_kg = parse_amount(row, raw, WEIGHT_KG)?.ok_or_else(|| {
            ValidationError::MissingField {
                row,
                field: WEIGHT_KG.to_string(),
            }
        })?;

        let mut forwarder_quotes = BTreeMap::new();
        for forwarder in KNOWN_FORWARDERS {
            if let Some(quote) = parse_amount(row, raw, forwarder)? {
                forwarder_quotes.insert(forwarder.to_string(), quote);
            }
        }

        Ok(Self {
            request_reference: required(REQUEST_REFERENCE)?,
            origin_country: required(ORIGIN_COUNTRY)?,
            destination_country: required(DESTINATION_COUNTRY)?,
            weight_kg,
            volume_cbm: parse_amount(row, raw, VOLUME_CBM)?,
            delivery_status: required(DELIVERY_STATUS)?,
            awarded_forwarder: raw
                .get(AWARDED_FORWARDER)
                .or_else(|| raw.get(AWARDED_FORWARDER_ALIAS))
                .map(str::to_string),
            collected_at: parse_timestamp(row, raw, DATE_OF_COLLECTION)?,
            arrived_at: parse_timestamp(row, raw, DATE_OF_ARRIVAL)?,
            forwarder_quotes,
        })
    }

    pub fn is_delivered(&self) -> bool {
        self.delivery_status.eq_ignore_ascii_case("delivered")
    }

    /// Quote submitted by the forwarder that won this shipment.
    pub fn awarded_quote(&self) -> Option<f64> {
        let awarded = self.awarded_forwarder.as_deref()?;
        self.forwarder_quotes.get(&forwarder_key(awarded)).copied()
    }

    /// Days between collection and arrival, including fractions of a day.
    pub fn transit_days(&self) -> Option<f64> {
        let collected = self.collected_at?;
        let arrived = self.arrived_at?;
        Some((arrived - collected).num_seconds() as f64 / 86_400.0)
    }
}

pub(crate) fn parse_amount(
    row: usize,
    raw: &RawShipment,
    field: &str,
) -> Result<Option<f64>, ValidationError> {
    let Some(value) = raw.get(field) else {
        return Ok(None);
    };

    match value.replace(',', "").parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(Some(amount)),
        _ => Err(ValidationError::MalformedValue {
            row,
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

pub(crate) fn parse_timestamp(
    row: usize,
    raw: &RawShipment,
    field: &str,
) -> Result<Option<NaiveDateTime>, ValidationError> {
    let Some(value) = raw.get(field) else {
        return Ok(None);
    };

    parse_datetime(value)
        .map(Some)
        .ok_or_else(|| ValidationError::MalformedValue {
            row,
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }

    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
