//! Notification text for one posting.
use chrono::NaiveDateTime;

use crate::record::{JobRecord, PostedDate};

/// Hard cap on message length, in characters.
pub const MESSAGE_LIMIT: usize = 4096;

/// Appended to a description that had to be cut.
pub const TRUNCATION_MARKER: &str = "\n\n... (description truncated due to length limit)";

const EMPTY_DESCRIPTION: &str = "No description available.";

/// How a delivery attempt failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// Retrying the same text cannot help.
    TooLong,
    /// Chat id missing or wrong, or the bot was removed.
    InvalidDestination,
    Transient,
}

/// Classifies an API error description.
pub fn classify_api_error(description: &str) -> DeliveryFailure {
    let lower = description.to_lowercase();
    if lower.contains("message is too long") {
        return DeliveryFailure::TooLong;
    }
    const DESTINATION_ERRORS: &[&str] = &[
        "chat not found",
        "chat_id is empty",
        "bot was blocked by the user",
        "bot was kicked",
    ];
    if DESTINATION_ERRORS.iter().any(|e| lower.contains(e)) {
        return DeliveryFailure::InvalidDestination;
    }
    DeliveryFailure::Transient
}

/// Renders the HTML message for `record`, cutting only the description when
/// the whole would exceed [`MESSAGE_LIMIT`].
pub fn render_message(record: &JobRecord, include_date: bool) -> String {
    let description = if record.description.trim().is_empty() {
        escape_html(EMPTY_DESCRIPTION)
    } else {
        escape_html(&record.description)
    };

    let full = compose(record, include_date, &description);
    if char_len(&full) <= MESSAGE_LIMIT {
        return full;
    }

    let frame_len = char_len(&compose(record, include_date, ""));
    let budget = MESSAGE_LIMIT
        .saturating_sub(frame_len)
        .saturating_sub(char_len(TRUNCATION_MARKER));
    if budget == 0 {
        // Title or tags alone blow the cap; nothing sensible left to keep.
        return hard_cut(&full);
    }

    let mut cut = cut_chars(&description, budget).to_string();
    trim_partial_entity(&mut cut);
    cut.push_str(TRUNCATION_MARKER);
    compose(record, include_date, &cut)
}

/// The "nothing new" heartbeat sent when a run finds no fresh postings.
pub fn heartbeat_record(now: NaiveDateTime) -> JobRecord {
    JobRecord {
        title: "No New Jobs Today".to_string(),
        link: "#".to_string(),
        description: "No new job postings found for your criteria in this run.".to_string(),
        tags: Vec::new(),
        source: "Job Scraper".to_string(),
        posted_date: PostedDate::Resolved(now),
    }
}

fn compose(record: &JobRecord, include_date: bool, description: &str) -> String {
    let mut parts = vec![
        format!(
            "✨ <b><u>New Job Posting - {}</u></b> ✨",
            escape_html(&record.source)
        ),
        format!("<b>Title:</b> {}", escape_html(&record.title)),
        format!(
            "<b>Link:</b> <a href='{}'>View Job</a>",
            escape_html(&record.link)
        ),
    ];
    if include_date {
        parts.push(format!(
            "<b>Posted:</b> {}",
            escape_html(&record.posted_date.to_string())
        ));
    }
    if !record.tags.is_empty() {
        parts.push(format!(
            "<b>Tags:</b> {}",
            escape_html(&record.tags.join(", "))
        ));
    }
    parts.push("\n<b>Full Description:</b>".to_string());
    parts.push(format!("<pre>{description}</pre>"));
    parts.join("\n")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn cut_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Drops a trailing `&amp`-style fragment left by a cut.
fn trim_partial_entity(text: &mut String) {
    if let Some(amp) = text.rfind('&') {
        if !text[amp..].contains(';') {
            text.truncate(amp);
        }
    }
}

/// Drops a tag or entity left unfinished by a cut.
fn trim_partial_markup(text: &mut String) {
    if let Some(open) = text.rfind('<') {
        if !text[open..].contains('>') {
            text.truncate(open);
        }
    }
    trim_partial_entity(text);
}

/// Closing tags for every tag still open at the end of `text`.
fn closing_tags(text: &str) -> String {
    let mut open: Vec<&str> = Vec::new();
    for tag in text.split('<').skip(1) {
        let Some(end) = tag.find('>') else {
            continue;
        };
        let inner = &tag[..end];
        if let Some(name) = inner.strip_prefix('/') {
            if open.last() == Some(&name) {
                open.pop();
            }
        } else {
            open.push(inner.split_whitespace().next().unwrap_or(inner));
        }
    }
    open.iter().rev().map(|name| format!("</{name}>")).collect()
}

/// Cuts the whole text to the cap, keeping the markup well formed.
fn hard_cut(full: &str) -> String {
    let mut limit = MESSAGE_LIMIT;
    loop {
        let mut cut = cut_chars(full, limit).to_string();
        trim_partial_markup(&mut cut);
        let closers = closing_tags(&cut);
        let total = char_len(&cut) + char_len(&closers);
        if total <= MESSAGE_LIMIT {
            cut.push_str(&closers);
            return cut;
        }
        limit = limit.saturating_sub(total - MESSAGE_LIMIT);
    }
}
