use jobwatch_core::{DelayRange, PostedDate, RecordSet, RetryPolicy, SiteConfig};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};

use crate::browser::BrowserSession;
use crate::html::PageSnapshot;
use crate::types::ScrapeError;

const BATCH_SIZE: usize = 5;
const BEFORE_LOAD: DelayRange = DelayRange::millis(500, 1000);
const BETWEEN_BATCHES: DelayRange = DelayRange::secs(1, 2);

/// Replaces the `"Recently"` fallback with the date shown on each posting's
/// own page. Only applies to sites with a detail date selector and
/// click-next pagination.
///
/// Postings are visited in batches with pauses between them. A broken or
/// blocked session is replaced before the next load. A posting whose date
/// cannot be read keeps the fallback. Returns how many dates were filled in.
pub fn enhance_dates(session: &mut BrowserSession, site: &SiteConfig, records: &mut RecordSet) -> usize {
    let Some(selector) = site.enhancement_selector() else {
        return 0;
    };
    let pending: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.posted_date.is_fallback())
        .map(|(index, _)| index)
        .collect();
    if pending.is_empty() {
        return 0;
    }

    watch_info!("Enhancing dates for {} jobs on {}", pending.len(), site.name);
    let pacer = session.pacer();
    let mut enhanced = 0;

    for batch in pending.chunks(BATCH_SIZE) {
        for &index in batch {
            let Some(record) = records.records_mut().get_mut(index) else {
                continue;
            };
            match read_detail_date(session, selector, &record.link) {
                Ok(text) => {
                    watch_debug!("Enhanced date for '{}': {}", record.title, text);
                    record.posted_date = PostedDate::raw(text);
                    enhanced += 1;
                }
                Err(err) => {
                    watch_warn!(
                        "Keeping fallback date for '{}' on {}: {}",
                        record.title,
                        site.name,
                        err
                    );
                }
            }
        }
        pacer.pause_within(BETWEEN_BATCHES);
    }

    watch_info!("Enhanced {} of {} dates on {}", enhanced, pending.len(), site.name);
    enhanced
}

fn read_detail_date(
    session: &mut BrowserSession,
    selector: &str,
    link: &str,
) -> Result<String, ScrapeError> {
    let pacer = session.pacer();
    let wait = session.settings().detail_wait_timeout;

    let attempt_once = |_attempt: u32| -> Result<String, ScrapeError> {
        pacer.pause_within(BEFORE_LOAD);
        if let Err(err) = session.load(link) {
            if !err.is_fatal_to_session() {
                return Err(err.into());
            }
            watch_info!("Browser session unusable ({}); creating a new one", err);
            session.restart()?;
            session.load(link)?;
        }
        if session.detect_blocking() {
            watch_warn!("Detail page {} is blocked; restarting browser session", link);
            session.restart()?;
            return Err(ScrapeError::Blocked);
        }
        session.wait_for_element(selector, wait)?;
        let source = session.page_source()?;
        PageSnapshot::parse(&source, None)
            .first_text(selector)?
            .ok_or_else(|| ScrapeError::Unexpected(format!("date element '{selector}' is empty")))
    };
    RetryPolicy::enhancement().run(pacer.as_ref(), |_| true, attempt_once)
}
