use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Reference;

/// Which tier produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Direct,
    Interactive,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Saved,
    AlreadyPresent,
    Failed,
}

/// Result of running the tier sequence for one reference.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub reference: Reference,
    pub strategy: Strategy,
    pub status: OutcomeStatus,
    pub saved_path: Option<PathBuf>,
    /// Reason for the last tier failure, if any
    pub detail: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl FetchOutcome {
    pub fn saved(reference: Reference, strategy: Strategy, path: PathBuf) -> Self {
        Self {
            reference,
            strategy,
            status: OutcomeStatus::Saved,
            saved_path: Some(path),
            detail: None,
            finished_at: Utc::now(),
        }
    }

    pub fn already_present(reference: Reference, path: PathBuf) -> Self {
        Self {
            reference,
            strategy: Strategy::None,
            status: OutcomeStatus::AlreadyPresent,
            saved_path: Some(path),
            detail: None,
            finished_at: Utc::now(),
        }
    }

    pub fn failed(reference: Reference, strategy: Strategy, detail: Option<String>) -> Self {
        Self {
            reference,
            strategy,
            status: OutcomeStatus::Failed,
            saved_path: None,
            detail,
            finished_at: Utc::now(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == OutcomeStatus::Saved
    }
}

/// Counts printed at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub saved: usize,
    pub already_present: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[FetchOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                match outcome.status {
                    OutcomeStatus::Saved => summary.saved += 1,
                    OutcomeStatus::AlreadyPresent => summary.already_present += 1,
                    OutcomeStatus::Failed => summary.failed += 1,
                }
                summary
            })
    }
}
