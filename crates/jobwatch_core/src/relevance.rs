use std::collections::HashSet;

use chrono::{NaiveDateTime, TimeDelta};
use jobwatch_logging::{watch_debug, watch_info};

use crate::record::JobRecord;

/// Case-insensitive keyword match on title and description.
///
/// A posting is relevant when at least one title keyword occurs in the title
/// and, if any description keywords are configured, at least one of those
/// occurs in the description. Blank keywords are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordFilter {
    title_keywords: Vec<String>,
    description_keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<T, D>(title_keywords: T, description_keywords: D) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            title_keywords: lowered(title_keywords),
            description_keywords: lowered(description_keywords),
        }
    }

    pub fn matches(&self, title: &str, description: &str) -> bool {
        let title = title.to_lowercase();
        if !self.title_keywords.iter().any(|kw| title.contains(kw)) {
            return false;
        }
        if self.description_keywords.is_empty() {
            return true;
        }
        let description = description.to_lowercase();
        self.description_keywords
            .iter()
            .any(|kw| description.contains(kw))
    }
}

fn lowered<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|kw| kw.as_ref().trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect()
}

/// Free-function form of [`KeywordFilter::matches`].
pub fn is_job_posting(
    title: &str,
    description: &str,
    title_keywords: &[String],
    description_keywords: &[String],
) -> bool {
    KeywordFilter::new(title_keywords, description_keywords).matches(title, description)
}

/// Outcome of picking the postings worth notifying about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub fresh: Vec<JobRecord>,
    pub already_posted: usize,
    pub irrelevant: usize,
    pub too_old: usize,
}

/// Drops postings already notified (or repeated within this run), then
/// irrelevant ones, then ones older than `max_age`.
///
/// Records still carrying the `"Recently"` fallback have no known age and
/// are kept.
pub fn select_new_postings(
    records: Vec<JobRecord>,
    seen: &HashSet<String>,
    filter: &KeywordFilter,
    max_age: Option<TimeDelta>,
    now: NaiveDateTime,
) -> Selection {
    let mut selection = Selection::default();
    let mut run_links: HashSet<String> = HashSet::new();

    for record in records {
        if seen.contains(&record.link) || !run_links.insert(record.link.clone()) {
            watch_info!(
                "Skipping duplicate job: '{}' (Link: {}) - already notified.",
                record.title,
                record.link
            );
            selection.already_posted += 1;
            continue;
        }
        if !filter.matches(&record.title, &record.description) {
            watch_debug!(
                "Job NOT relevant based on criteria: '{}' (Source: {})",
                record.title,
                record.source
            );
            selection.irrelevant += 1;
            continue;
        }
        if let (Some(max_age), Some(posted)) = (max_age, record.posted_date.resolve_at(now)) {
            if now - posted > max_age {
                watch_debug!("Job too old: '{}' posted {}", record.title, posted);
                selection.too_old += 1;
                continue;
            }
        }
        selection.fresh.push(record);
    }
    selection
}
