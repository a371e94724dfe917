use crate::msg::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Loading the site URL on a session believed to be usable.
    Setup,
    /// Page is loaded; waiting for cards or paginating.
    Extract,
    Success,
    /// Attempts exhausted; whatever was collected stands.
    Abort,
}

/// Scrape progress for one site within one run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRun {
    phase: Phase,
    attempt: u32,
    max_attempts: u32,
    last_failure: Option<FailureKind>,
}

impl SiteRun {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            phase: Phase::Idle,
            attempt: 0,
            max_attempts: max_attempts.max(1),
            last_failure: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 1-based attempt currently in progress; 0 before start.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn last_failure(&self) -> Option<FailureKind> {
        self.last_failure
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Success | Phase::Abort)
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.phase = Phase::Setup;
    }

    pub(crate) fn record_failure(&mut self, kind: FailureKind) {
        self.last_failure = Some(kind);
    }

    pub(crate) fn has_attempts_left(&self) -> bool {
        self.attempt < self.max_attempts
    }
}
