//! Shipment intake: CSV parsing, validation, typing, and dataset identity.

mod identity;
mod normalizer;
mod parser;
mod record;
mod validator;

pub use identity::{content_hash, generate_version, DatasetIdentity};
pub use record::{RawShipment, Shipment, KNOWN_FORWARDERS, REQUIRED_FIELDS};
pub use validator::{validate, ValidationError};

pub(crate) use normalizer::forwarder_key;

use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read shipment export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid shipment CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub fn read_shipments<R: Read>(reader: R) -> Result<Vec<RawShipment>, DatasetError> {
    Ok(parser::parse_rows(reader)?)
}

pub fn open_shipments<P: AsRef<Path>>(path: P) -> Result<Vec<RawShipment>, DatasetError> {
    let file = std::fs::File::open(path)?;
    read_shipments(file)
}

/// Validates the batch, then types every row.
pub fn load_shipments(rows: &[RawShipment]) -> Result<Vec<Shipment>, ValidationError> {
    validate(rows)?;
    rows.iter()
        .enumerate()
        .map(|(row, raw)| Shipment::from_raw(row, raw))
        .collect()
}
