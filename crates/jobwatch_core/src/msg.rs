use std::fmt;

/// Why a site attempt failed. All kinds share one retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A bounded wait ran out: page load or job-card presence.
    Timeout,
    /// The browser or its connection failed; the session is suspect.
    Driver,
    /// The site started refusing us mid-scrape.
    Blocked,
    Unexpected,
}

impl FailureKind {
    /// Whether the session must be replaced before trying again.
    pub fn needs_fresh_session(self) -> bool {
        matches!(self, FailureKind::Driver | FailureKind::Blocked)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timed out loading page or job cards"),
            FailureKind::Driver => write!(f, "browser driver failure"),
            FailureKind::Blocked => write!(f, "blocked by site"),
            FailureKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// What happened when the orchestrator carried out the last effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteEvent {
    Started,
    /// Site URL loaded and no blocking detected.
    Navigated,
    /// Site URL loaded but the page says we are blocked.
    Blocked,
    CardsPresent,
    /// Pagination finished normally.
    Extracted,
    Failed(FailureKind),
}
