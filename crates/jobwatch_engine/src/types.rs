use jobwatch_core::{FailureKind, JobRecord, NodeError};
use thiserror::Error;

use crate::browser::{DriverError, DriverErrorKind};

/// Why one attempt at a site failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("browser driver failure: {0}")]
    Driver(String),
    #[error("blocked by site")]
    Blocked,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ScrapeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScrapeError::Timeout(_) => FailureKind::Timeout,
            ScrapeError::Driver(_) => FailureKind::Driver,
            ScrapeError::Blocked => FailureKind::Blocked,
            ScrapeError::Unexpected(_) => FailureKind::Unexpected,
        }
    }
}

impl From<DriverError> for ScrapeError {
    fn from(err: DriverError) -> Self {
        match err.kind {
            DriverErrorKind::Timeout => ScrapeError::Timeout(err.message),
            DriverErrorKind::Launch | DriverErrorKind::Driver => ScrapeError::Driver(err.message),
            DriverErrorKind::Script => ScrapeError::Unexpected(err.message),
        }
    }
}

impl From<NodeError> for ScrapeError {
    fn from(err: NodeError) -> Self {
        ScrapeError::Unexpected(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteOutcome {
    Completed,
    /// Attempts ran out; records hold whatever was collected before that.
    Abandoned,
}

/// Result of scraping one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub site: String,
    pub records: Vec<JobRecord>,
    pub attempts: u32,
    pub outcome: SiteOutcome,
    pub last_failure: Option<FailureKind>,
    /// Records whose date was filled in from their detail page.
    pub enhanced_dates: usize,
}
