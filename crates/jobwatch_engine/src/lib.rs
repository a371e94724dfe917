//! Jobwatch engine: browser sessions, page scraping and delivery IO.
mod browser;
mod dedup;
mod html;
mod notify;
mod orchestrator;
mod pacing;
mod pagination;
mod run;
mod types;

pub use browser::{
    BrowserSession, ChromeFactory, DriverError, DriverErrorKind, DriverFactory, LaunchProfile,
    Locator, Navigation, PageDriver, SessionSettings, USER_AGENTS,
};
pub use dedup::{DedupStore, StoreError};
pub use html::{HtmlNode, PageSnapshot};
pub use notify::{Notifier, NotifyError, TelegramNotifier, TelegramSettings};
pub use orchestrator::SiteScraper;
pub use pacing::ThreadPacer;
pub use pagination::{enhance_dates, paginate, NEXT_TEXT_XPATH};
pub use run::{Delivery, RunController, RunSettings, RunSummary, SiteTally};
pub use types::{ScrapeError, SiteOutcome, SiteReport};
