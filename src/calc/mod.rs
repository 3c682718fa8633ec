mod aggregate;
mod band;
mod ranking;
mod stats;
mod subject;

pub use aggregate::{period_aggregate, student_period_aggregate, PeriodAggregate, SubjectAverage};
pub use band::{GeneralAppreciation, SubjectBand};
pub use ranking::{rank_cohort, RankedResult, RankingPolicy};
pub use stats::{evaluation_counts, period_statistics, PeriodStatistics};
pub use subject::{bucket_averages, AveragePolicy};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// The single condition reported for malformed computation input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CalcError {}
