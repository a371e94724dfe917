use crate::{FailureKind, Phase, SiteEffect, SiteEvent, SiteRun};

/// Pure transition function: applies an event to a site run and returns the
/// effects to perform.
///
/// `SETUP -> EXTRACT -> SUCCESS`, with any failure looping back to `SETUP`
/// while attempts remain and ending in `ABORT` otherwise. A blocked landing
/// page counts as an attempt and always replaces the session; extraction is
/// not tried on that attempt. Events that make no sense in the current
/// phase are ignored.
pub fn update(mut run: SiteRun, event: SiteEvent) -> (SiteRun, Vec<SiteEffect>) {
    let effects = match (run.phase(), event) {
        (Phase::Idle, SiteEvent::Started) => {
            run.begin_attempt();
            vec![SiteEffect::Navigate]
        }
        (Phase::Setup, SiteEvent::Navigated) => {
            run.set_phase(Phase::Extract);
            vec![SiteEffect::WaitForCards]
        }
        (Phase::Setup, SiteEvent::Blocked) => {
            run.record_failure(FailureKind::Blocked);
            if run.has_attempts_left() {
                run.begin_attempt();
                vec![SiteEffect::RestartSession, SiteEffect::Navigate]
            } else {
                run.set_phase(Phase::Abort);
                vec![SiteEffect::RestartSession, SiteEffect::Abandon]
            }
        }
        (Phase::Extract, SiteEvent::CardsPresent) => vec![SiteEffect::Paginate],
        (Phase::Extract, SiteEvent::Extracted) => {
            run.set_phase(Phase::Success);
            vec![SiteEffect::Finish]
        }
        (Phase::Setup | Phase::Extract, SiteEvent::Failed(kind)) => {
            run.record_failure(kind);
            let mut effects = Vec::with_capacity(3);
            if kind.needs_fresh_session() {
                effects.push(SiteEffect::RestartSession);
            }
            if run.has_attempts_left() {
                run.begin_attempt();
                effects.push(SiteEffect::BackOff);
                effects.push(SiteEffect::Navigate);
            } else {
                run.set_phase(Phase::Abort);
                effects.push(SiteEffect::Abandon);
            }
            effects
        }
        _ => Vec::new(),
    };

    (run, effects)
}
