//! Data shapes for the translation service API.
//!
//! Everything here is produced by the remote service and read-only to
//! this client; serde attributes map our field names onto the wire
//! names the service actually uses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ShiftError;

/// Translation job status reported by the service.
///
/// Only `done` and `failed` are terminal. The service reports "still
/// running" implicitly as anything else, so unrecognized strings
/// deserialize to [`JobStatus::Pending`] rather than failing — a new
/// service-side state must not crash the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Done,
    Failed,
    Pending,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "done" => JobStatus::Done,
            "failed" => JobStatus::Failed,
            "pending" => JobStatus::Pending,
            other => {
                log::debug!("unrecognized job status {other:?}, treating as pending");
                JobStatus::Pending
            }
        })
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Pending => write!(f, "pending"),
        }
    }
}

/// Per-query translation outcome.
///
/// Closed set: an outcome string outside these four is a malformed
/// response and surfaces as an error at deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationOutcome {
    #[serde(rename = "no_translation_attempts")]
    NoAttempt,
    #[serde(rename = "validation_pending")]
    ValidationPending,
    #[serde(rename = "invalid_translation")]
    Invalid,
    #[serde(rename = "valid_translation")]
    Valid,
}

impl fmt::Display for TranslationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationOutcome::NoAttempt => write!(f, "no_translation_attempts"),
            TranslationOutcome::ValidationPending => write!(f, "validation_pending"),
            TranslationOutcome::Invalid => write!(f, "invalid_translation"),
            TranslationOutcome::Valid => write!(f, "valid_translation"),
        }
    }
}

/// Structured explanation attached to a failed translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub reason: String,
}

/// One translated query (or other asset) inside a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedModel {
    #[serde(default)]
    pub source_filename: Option<String>,
    pub asset_name: String,
    #[serde(rename = "source_sql")]
    pub source_text: String,
    #[serde(rename = "target_sql", default)]
    pub target_text: Option<String>,
    #[serde(rename = "translation_status")]
    pub outcome: TranslationOutcome,
    #[serde(rename = "failure_summary", default)]
    pub failure_detail: Option<FailureDetail>,
}

impl TranslatedModel {
    /// Uploaded filename when the model came from a file, asset name
    /// otherwise.
    pub fn identifier(&self) -> &str {
        self.source_filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.asset_name)
    }
}

/// Raw job record as returned by a single status request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub status: JobStatus,
    #[serde(default)]
    pub translated_models: Vec<TranslatedModel>,
}

/// Reference to a remote translation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub project_id: i64,
    pub task_id: i64,
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project {} / job {}", self.project_id, self.task_id)
    }
}

/// One transient failure observed while waiting on a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollError {
    pub kind: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl PollError {
    pub(crate) fn from_error(err: &ShiftError) -> Self {
        Self {
            kind: err.poll_kind(),
            message: err.to_string(),
            at: Utc::now(),
        }
    }
}

/// Finalized job outcome returned once polling reaches a terminal
/// status. `models` is never mutated after this is built; the polling
/// error log is attached so transient failures stay auditable even
/// though the wait ultimately succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub status: JobStatus,
    pub models: Vec<TranslatedModel>,
    pub polling_errors: Vec<PollError>,
}

/// A data source configured in the remote workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A translation project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_job_status_is_pending() {
        let record: JobRecord =
            serde_json::from_str(r#"{"status": "materializing_schemas"}"#).unwrap();
        assert_eq!(record.status, JobStatus::Pending);
        assert!(!record.status.is_terminal());
        assert!(record.translated_models.is_empty());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }

    #[test]
    fn test_unknown_outcome_is_an_error() {
        let raw = r#"{
            "asset_name": "q",
            "source_sql": "SELECT 1",
            "translation_status": "half_translated"
        }"#;
        assert!(serde_json::from_str::<TranslatedModel>(raw).is_err());
    }

    #[test]
    fn test_model_wire_names() {
        let raw = r#"{
            "source_filename": "query_1.sql",
            "asset_name": "query_1",
            "source_sql": "SELECT 1",
            "target_sql": "SELECT 1",
            "translation_status": "valid_translation",
            "failure_summary": null
        }"#;
        let model: TranslatedModel = serde_json::from_str(raw).unwrap();
        assert_eq!(model.identifier(), "query_1.sql");
        assert_eq!(model.outcome, TranslationOutcome::Valid);
        assert_eq!(model.target_text.as_deref(), Some("SELECT 1"));
        assert!(model.failure_detail.is_none());
    }

    #[test]
    fn test_identifier_falls_back_to_asset_name() {
        let raw = r#"{
            "asset_name": "orders_view",
            "source_sql": "SELECT 1",
            "translation_status": "no_translation_attempts"
        }"#;
        let model: TranslatedModel = serde_json::from_str(raw).unwrap();
        assert_eq!(model.identifier(), "orders_view");
    }

    #[test]
    fn test_failure_detail_defaults() {
        let detail: FailureDetail = serde_json::from_str(r#"{"problem": "bad cast"}"#).unwrap();
        assert_eq!(detail.problem, "bad cast");
        assert_eq!(detail.location, None);
        assert_eq!(detail.reason, "");
    }
}
