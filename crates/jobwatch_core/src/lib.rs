//! Jobwatch core: pure extraction, normalization and scrape-flow logic.
mod blocking;
mod date;
mod dom;
mod effect;
mod extract;
mod links;
mod message;
mod msg;
mod pacing;
mod record;
mod relevance;
mod retry;
mod site;
mod state;
mod update;

pub use blocking::{classify_page, BlockSignal, CAPTCHA_SELECTORS, HARD_BLOCK_PHRASES, SOFT_BLOCK_PHRASES};
pub use date::{normalize_at, try_normalize_at};
pub use dom::{DomNode, NodeError};
pub use effect::SiteEffect;
pub use extract::{extract_job, FALLBACK_DATE};
pub use links::resolve_url;
pub use message::{
    classify_api_error, heartbeat_record, render_message, DeliveryFailure, MESSAGE_LIMIT,
    TRUNCATION_MARKER,
};
pub use msg::{FailureKind, SiteEvent};
pub use pacing::{DelayRange, Pacer};
pub use record::{JobRecord, PostedDate, RecordSet};
pub use relevance::{is_job_posting, select_new_postings, KeywordFilter, Selection};
pub use retry::{Backoff, RetryPolicy};
pub use site::{PaginationKind, SiteConfig, DEFAULT_MAX_PAGES, DEFAULT_NEXT_PAGE_SELECTORS};
pub use state::{Phase, SiteRun};
pub use update::update;
