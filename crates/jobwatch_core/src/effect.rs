/// Work the orchestrator must do next, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteEffect {
    Navigate,
    /// Discard the browser session and launch a fresh one.
    RestartSession,
    WaitForCards,
    Paginate,
    /// Pause before the next attempt.
    BackOff,
    Finish,
    /// Give up on this site for the run.
    Abandon,
}
