//! Append-only record of ranking invocations.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use super::criteria::CriteriaWeights;
use super::dataset::DatasetIdentity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Succeeded,
    Failed { reason: String },
}

impl AuditOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, AuditOutcome::Failed { .. })
    }
}

/// One ranking invocation. Entries are never mutated after they are appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub outcome: AuditOutcome,
    pub input: Value,
    pub output: Value,
    pub weights: Option<CriteriaWeights>,
    pub dataset_version: String,
    pub dataset_hash: String,
    pub session_id: String,
}

impl AuditEntry {
    pub fn new(
        operation: impl Into<String>,
        dataset: &DatasetIdentity,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operation: operation.into(),
            outcome: AuditOutcome::Succeeded,
            input: Value::Null,
            output: Value::Null,
            weights: None,
            dataset_version: dataset.version.clone(),
            dataset_hash: dataset.hash.clone(),
            session_id: session_id.into(),
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = output;
        self
    }

    pub fn with_weights(mut self, weights: CriteriaWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.outcome = AuditOutcome::Failed {
            reason: reason.into(),
        };
        self
    }
}

/// JSON snapshot of an entry payload. An encoding failure is kept in the snapshot as
/// `snapshot_error` instead of an empty value.
pub fn snapshot<T>(payload: &T) -> Value
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(payload).unwrap_or_else(|error| {
        warn!(error = %error, "audit snapshot could not be serialized");
        json!({ "snapshot_error": error.to_string() })
    })
}

/// Conjunctive filter; unset fields match every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub dataset_version: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AuditFilter {
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn dataset_version(mut self, version: impl Into<String>) -> Self {
        self.dataset_version = Some(version.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        fn accepts(expected: &Option<String>, actual: &str) -> bool {
            expected.as_deref().map_or(true, |value| value == actual)
        }

        accepts(&self.operation, &entry.operation)
            && accepts(&self.dataset_version, &entry.dataset_version)
            && accepts(&self.session_id, &entry.session_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_entries: usize,
    pub failed_entries: usize,
    pub operation_breakdown: BTreeMap<String, usize>,
    pub version_breakdown: BTreeMap<String, usize>,
    pub first_entry: Option<DateTime<Utc>>,
    pub last_entry: Option<DateTime<Utc>>,
}

impl AuditSummary {
    pub fn from_entries(entries: &[AuditEntry]) -> Self {
        let mut summary = Self {
            total_entries: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            if entry.outcome.is_failure() {
                summary.failed_entries += 1;
            }
            *summary
                .operation_breakdown
                .entry(entry.operation.clone())
                .or_default() += 1;
            *summary
                .version_breakdown
                .entry(entry.dataset_version.clone())
                .or_default() += 1;
        }

        summary.first_entry = entries.iter().map(|entry| entry.timestamp).min();
        summary.last_entry = entries.iter().map(|entry| entry.timestamp).max();
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("audit ledger unavailable: {0}")]
    Unavailable(String),
}

/// Storage seam for audit entries so alternative backends can be injected.
pub trait AuditLedger: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), LedgerError>;
    /// Matching entries in append order.
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, LedgerError>;
    fn len(&self) -> Result<usize, LedgerError>;

    fn summary(&self) -> Result<AuditSummary, LedgerError> {
        let entries = self.query(&AuditFilter::default())?;
        Ok(AuditSummary::from_entries(&entries))
    }

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAuditLedger {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::Unavailable("ledger lock poisoned".to_string())
}

impl AuditLedger for InMemoryAuditLedger {
    fn record(&self, entry: AuditEntry) -> Result<(), LedgerError> {
        self.entries.write().map_err(poisoned)?.push(entry);
        Ok(())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, LedgerError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    fn summary(&self) -> Result<AuditSummary, LedgerError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(AuditSummary::from_entries(&entries))
    }
}
