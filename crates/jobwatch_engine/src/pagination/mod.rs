//! Per-site strategies for walking a result set.
mod click_next;
mod enhance;
mod scroll;

use jobwatch_core::{extract_job, DelayRange, PaginationKind, RecordSet, SiteConfig};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};

use crate::browser::BrowserSession;
use crate::html::PageSnapshot;
use crate::types::ScrapeError;

pub use click_next::NEXT_TEXT_XPATH;
pub use enhance::enhance_dates;

const CARD_PAUSE: DelayRange = DelayRange::millis(500, 1000);
const CARDS_PER_PAUSE: usize = 5;

/// Collects the site's cards into `records` using its pagination strategy.
///
/// Records land in `records` page by page, so an error part way through
/// leaves the earlier pages' records in place.
pub fn paginate(
    session: &mut BrowserSession,
    site: &SiteConfig,
    records: &mut RecordSet,
) -> Result<(), ScrapeError> {
    match site.pagination {
        PaginationKind::ClickNext => click_next::run(session, site, records),
        PaginationKind::InfiniteScroll => scroll::run(session, site, records),
        PaginationKind::None => {
            let cards = extract_page(session, site, records, 1)?;
            if cards == 0 {
                watch_warn!(
                    "No job cards found using selector '{}' on {}",
                    site.job_card_selector,
                    site.name
                );
            }
            Ok(())
        }
    }
}

/// Extracts every card currently on the page, hovering over each and pausing
/// every few cards. Returns how many cards matched the selector.
fn extract_page(
    session: &mut BrowserSession,
    site: &SiteConfig,
    records: &mut RecordSet,
    page: u32,
) -> Result<usize, ScrapeError> {
    let source = session.page_source()?;
    let page_url = session.current_url().ok();
    let snapshot = PageSnapshot::parse(&source, page_url.as_deref().or(Some(site.url.as_str())));
    let cards = snapshot.cards(&site.job_card_selector)?;
    let pacer = session.pacer();

    let mut added = 0;
    for (index, card) in cards.iter().enumerate() {
        if let Err(err) = session.hover(&site.job_card_selector, index) {
            watch_debug!("Hover over card {} on {} failed: {}", index, site.name, err);
        }
        if let Some(record) = extract_job(card, site, snapshot.base()) {
            if records.insert(record) {
                added += 1;
            }
        }
        if index % CARDS_PER_PAUSE == 0 {
            pacer.pause_within(CARD_PAUSE);
        }
    }

    watch_info!(
        "Found {} new jobs among {} cards on page {} of {}",
        added,
        cards.len(),
        page,
        site.name
    );
    Ok(cards.len())
}
