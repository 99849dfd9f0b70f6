//! Append-only audit trail of answered questions.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::Dimension;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to write audit log: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode audit log: {0}")]
    Json(#[from] serde_json::Error),
}

/// One answered question as seen by the session. Scores are front scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub question_id: String,
    pub question_text: String,
    pub low_bound: f64,
    pub high_bound: f64,
    pub dimension: Dimension,
    pub answer: f64,
    pub p_score: f64,
    pub w_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub sequence_no: usize,
    #[serde(flatten)]
    pub entry: AuditEntry,
}

pub trait AuditSink: Send {
    fn record(&mut self, entry: AuditEntry);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsLog {
    records: Vec<AuditRecord>,
}

impl ResultsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedResultsLog {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AuditError> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &self.records)?;
        tracing::info!(
            path = %path.as_ref().display(),
            records = self.records.len(),
            "audit log saved"
        );
        Ok(())
    }
}

impl AuditSink for ResultsLog {
    fn record(&mut self, entry: AuditEntry) {
        self.records.push(AuditRecord {
            sequence_no: self.records.len() + 1,
            entry,
        });
    }
}

/// Log handle the caller keeps while a session writes into it.
pub type SharedResultsLog = Arc<Mutex<ResultsLog>>;

impl AuditSink for SharedResultsLog {
    fn record(&mut self, entry: AuditEntry) {
        self.lock().record(entry);
    }
}
