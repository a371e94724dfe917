use jobwatch_core::{DelayRange, RecordSet, SiteConfig};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};
use rand::Rng;

use super::extract_page;
use crate::browser::{BrowserSession, DriverError};
use crate::types::ScrapeError;

const STEP_PAUSE: DelayRange = DelayRange::millis(500, 2000);
const BACK_SCROLL_PAUSE: DelayRange = DelayRange::millis(300, 1000);
const SETTLE_PAUSE: DelayRange = DelayRange::secs(1, 2);
const BACK_SCROLL_CHANCE: f64 = 0.1;

/// Scrolls until the page stops growing or the round limit is hit, then
/// extracts every card once.
pub(super) fn run(
    session: &mut BrowserSession,
    site: &SiteConfig,
    records: &mut RecordSet,
) -> Result<(), ScrapeError> {
    let rounds = session.settings().max_scroll_attempts.max(1);
    let pacer = session.pacer();
    watch_info!("Starting human-like scrolling on {}", site.name);

    let mut scrolled = 0;
    let mut height = session.scroll_height()?;
    for round in 1..=rounds {
        human_scroll(session, scrolled, height)?;
        pacer.pause_within(SETTLE_PAUSE);
        let grown = session.scroll_height()?;
        if grown <= height {
            watch_debug!("Page height unchanged after scroll round {} on {}", round, site.name);
            break;
        }
        scrolled = height;
        height = grown;
    }

    let cards = extract_page(session, site, records, 1)?;
    if cards == 0 {
        watch_warn!(
            "No job cards found using selector '{}' on {}. This might indicate a selector issue or no jobs.",
            site.job_card_selector,
            site.name
        );
    }
    Ok(())
}

/// Moves down from `from` to `target` in 300-800px steps with pauses,
/// sometimes stepping back.
fn human_scroll(session: &mut BrowserSession, from: u64, target: u64) -> Result<(), DriverError> {
    let pacer = session.pacer();
    let mut rng = rand::thread_rng();
    let mut position = from;
    while position < target {
        position += rng.gen_range(300..=800);
        session.scroll_to(position)?;
        pacer.pause_within(STEP_PAUSE);
        if rng.gen_bool(BACK_SCROLL_CHANCE) {
            position = position.saturating_sub(rng.gen_range(50..=200));
            session.scroll_to(position)?;
            pacer.pause_within(BACK_SCROLL_PAUSE);
        }
    }
    Ok(())
}
