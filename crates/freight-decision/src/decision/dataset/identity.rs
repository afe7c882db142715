use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::record::RawShipment;

/// Caller-facing tag for a dataset: opaque version label plus content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetIdentity {
    pub version: String,
    pub hash: String,
}

impl DatasetIdentity {
    pub fn new(version: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            hash: hash.into(),
        }
    }

    pub fn for_rows(version: impl Into<String>, rows: &[RawShipment]) -> Self {
        Self::new(version, content_hash(rows))
    }
}

/// SHA-256 over a canonical rendering of the rows, independent of column order.
pub fn content_hash(rows: &[RawShipment]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        for (field, value) in row.fields() {
            hasher.update(field.as_bytes());
            hasher.update(b"=");
            hasher.update(value.trim().as_bytes());
            hasher.update(b"\x1f");
        }
        hasher.update(b"\n");
    }
    format!("sha256-{:x}", hasher.finalize())
}

pub fn generate_version(at: DateTime<Utc>) -> String {
    format!("v1.0.0-deepbase-{}", at.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}
