use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;

use crate::date::normalize_at;
use crate::extract::FALLBACK_DATE;

/// When a posting went up, as far as the listing revealed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostedDate {
    /// Nothing usable on the card; may be filled in from the detail page.
    Recently,
    /// Text as shown on the page, plus the `datetime` attribute of a `<time>`
    /// element when one was present.
    Raw {
        text: String,
        datetime_attr: Option<String>,
    },
    Resolved(NaiveDateTime),
}

impl PostedDate {
    pub fn raw(text: impl Into<String>) -> Self {
        PostedDate::Raw {
            text: text.into(),
            datetime_attr: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, PostedDate::Recently)
    }

    /// Canonical timestamp relative to `now`, or `None` for the fallback token.
    pub fn resolve_at(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            PostedDate::Recently => None,
            PostedDate::Raw {
                text,
                datetime_attr,
            } => Some(normalize_at(text, datetime_attr.as_deref(), now)),
            PostedDate::Resolved(at) => Some(*at),
        }
    }
}

impl fmt::Display for PostedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostedDate::Recently => write!(f, "{FALLBACK_DATE}"),
            PostedDate::Raw { text, .. } => write!(f, "{text}"),
            PostedDate::Resolved(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// One scraped posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub title: String,
    /// Absolute URL; also the dedup key.
    pub link: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Name of the site the record came from.
    pub source: String,
    pub posted_date: PostedDate,
}

/// Records for one site, unique by link, in first-seen order.
///
/// A site retried after a partial pagination run re-extracts the pages it
/// already saw; the set keeps only the first copy.
#[derive(Debug, Default, Clone)]
pub struct RecordSet {
    records: Vec<JobRecord>,
    links: HashSet<String>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the record unless its link is already present.
    pub fn insert(&mut self, record: JobRecord) -> bool {
        if !self.links.insert(record.link.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter()
    }

    /// Mutable access for in-place date enhancement. Links must not change.
    pub fn records_mut(&mut self) -> &mut [JobRecord] {
        &mut self.records
    }

    pub fn into_vec(self) -> Vec<JobRecord> {
        self.records
    }
}
