use std::time::Duration;

use jobwatch_core::{DelayRange, RecordSet, SiteConfig};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};

use super::extract_page;
use crate::browser::{BrowserSession, DriverError, DriverErrorKind, Locator};
use crate::types::ScrapeError;

/// Text search for a next control when no CSS candidate matches.
pub const NEXT_TEXT_XPATH: &str = "//a[contains(text(), 'Next') or contains(text(), 'التالي')]";

const AFTER_CLICK_PAUSE: Duration = Duration::from_secs(3);
const BETWEEN_PAGES: DelayRange = DelayRange::secs(2, 4);

/// Walks pages by clicking the site's next control.
///
/// Stops when no next control is actionable, the page ceiling is reached,
/// a page shows no cards, or cards stop appearing after a click. A block
/// detected on a later page fails the attempt.
pub(super) fn run(
    session: &mut BrowserSession,
    site: &SiteConfig,
    records: &mut RecordSet,
) -> Result<(), ScrapeError> {
    let max_pages = site.max_pages.max(1);
    let wait = session.settings().next_page_wait_timeout;
    let pacer = session.pacer();
    let mut page = 1;

    loop {
        watch_info!("Scraping page {} from {}", page, site.name);
        if page > 1 {
            if session.detect_blocking() {
                watch_warn!("Blocking detected on page {} of {}", page, site.name);
                return Err(ScrapeError::Blocked);
            }
            match session.wait_for_element(&site.job_card_selector, wait) {
                Ok(()) => {}
                Err(err) if err.kind == DriverErrorKind::Timeout => {
                    watch_warn!("Timeout waiting for job cards on page {} of {}", page, site.name);
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let cards = extract_page(session, site, records, page)?;
        if cards == 0 {
            watch_warn!("No job cards found on page {} of {}", page, site.name);
            break;
        }
        if page >= max_pages {
            watch_info!("Reached page limit ({}) for {}", max_pages, site.name);
            break;
        }
        if !click_next(session, site)? {
            watch_info!("No more pages found after page {} of {}", page, site.name);
            break;
        }

        page += 1;
        pacer.pause_within(BETWEEN_PAGES);
    }

    watch_info!(
        "Completed pagination on {}: {} jobs from {} pages",
        site.name,
        records.len(),
        page
    );
    Ok(())
}

/// Tries each CSS candidate, then the text search. A candidate whose script
/// fails (invalid selector, odd markup) is skipped.
fn click_next(session: &mut BrowserSession, site: &SiteConfig) -> Result<bool, DriverError> {
    let css = site.next_page_candidates().into_iter().map(Locator::Css);
    for locator in css.chain(std::iter::once(Locator::XPath(NEXT_TEXT_XPATH))) {
        match session.click_if_actionable(locator) {
            Ok(true) => {
                watch_debug!("Clicked next control {:?} on {}", locator, site.name);
                session.pacer().pause(AFTER_CLICK_PAUSE);
                return Ok(true);
            }
            Ok(false) => {}
            Err(err) if err.kind == DriverErrorKind::Script => {
                watch_debug!("Next control {:?} unusable: {}", locator, err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(false)
}
