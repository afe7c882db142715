use super::record::{
    parse_amount, parse_timestamp, RawShipment, DATE_OF_ARRIVAL, DATE_OF_COLLECTION,
    KNOWN_FORWARDERS, REQUIRED_FIELDS, VOLUME_CBM, WEIGHT_KG,
};

/// Reasons a shipment batch is rejected before any computation starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("dataset contains no rows")]
    EmptyDataset,
    #[error("row {row} is missing required field '{field}'")]
    MissingField { row: usize, field: String },
    #[error("row {row} has a malformed value for '{field}': '{value}'")]
    MalformedValue {
        row: usize,
        field: String,
        value: String,
    },
}

impl ValidationError {
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::EmptyDataset => None,
            ValidationError::MissingField { field, .. }
            | ValidationError::MalformedValue { field, .. } => Some(field),
        }
    }
}

/// Checks presence of required fields and parseability of numeric and date fields.
///
/// Reports the first problem found, scanning rows in order.
pub fn validate(rows: &[RawShipment]) -> Result<(), ValidationError> {
    if rows.is_empty() {
        return Err(ValidationError::EmptyDataset);
    }

    for (row, raw) in rows.iter().enumerate() {
        for field in REQUIRED_FIELDS {
            if raw.get(field).is_none() {
                return Err(ValidationError::MissingField {
                    row,
                    field: field.to_string(),
                });
            }
        }

        for field in [WEIGHT_KG, VOLUME_CBM].into_iter().chain(KNOWN_FORWARDERS) {
            parse_amount(row, raw, field)?;
        }
        for field in [DATE_OF_COLLECTION, DATE_OF_ARRIVAL] {
            parse_timestamp(row, raw, field)?;
        }
    }

    Ok(())
}
