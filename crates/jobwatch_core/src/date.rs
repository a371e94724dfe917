//! Date normalization for listing dates.
//!
//! Strategies run in a fixed order and the first one that yields a timestamp
//! wins: machine-readable hint, `today`/`yesterday`, English relative
//! (`3 days ago`), `30+ days ago`, Arabic relative (`منذ 3 أيام`), and
//! finally abbreviated month-day (`Jul 09`). Numeric relative forms must be
//! tried before month-day so `3 days` is never read as a calendar date.
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta};
use jobwatch_logging::watch_warn;
use regex::Regex;

const MINUTE_SECS: f64 = 60.0;
const HOUR_SECS: f64 = 3_600.0;
const DAY_SECS: f64 = 86_400.0;
const WEEK_SECS: f64 = 7.0 * DAY_SECS;
const MONTH_SECS: f64 = 30.437 * DAY_SECS;
const YEAR_SECS: f64 = 365.25 * DAY_SECS;

struct DateInput<'a> {
    text: &'a str,
    lower: String,
    hint: Option<&'a str>,
}

type Strategy = fn(&DateInput<'_>, NaiveDateTime) -> Option<NaiveDateTime>;

const STRATEGIES: &[Strategy] = &[
    from_hint,
    today,
    yesterday,
    english_relative,
    thirty_plus_days,
    arabic_relative,
    month_day,
];

/// Normalizes `text` relative to `now`, defaulting to `now` when nothing
/// matches.
pub fn normalize_at(text: &str, hint: Option<&str>, now: NaiveDateTime) -> NaiveDateTime {
    try_normalize_at(text, hint, now).unwrap_or_else(|| {
        watch_warn!(
            "Could not parse date string '{}'. Defaulting to current time.",
            text
        );
        now
    })
}

/// Like [`normalize_at`] but reports "no strategy matched" as `None`.
pub fn try_normalize_at(
    text: &str,
    hint: Option<&str>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let input = DateInput {
        text,
        lower: text.to_lowercase(),
        hint,
    };
    STRATEGIES.iter().find_map(|strategy| strategy(&input, now))
}

fn from_hint(input: &DateInput<'_>, _now: NaiveDateTime) -> Option<NaiveDateTime> {
    let hint = input.hint.map(str::trim).filter(|h| !h.is_empty())?;
    if let Ok(at) = DateTime::parse_from_rfc3339(hint) {
        return Some(at.with_timezone(&Local).naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(hint, format) {
            return Some(at);
        }
    }
    NaiveDate::parse_from_str(hint, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn today(input: &DateInput<'_>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    input.lower.contains("today").then_some(now)
}

fn yesterday(input: &DateInput<'_>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if input.lower.contains("yesterday") {
        return seconds_before(now, DAY_SECS);
    }
    None
}

fn english_relative(input: &DateInput<'_>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"([0-9]+)\s+(minute|hour|day|week|month|year)s?\s+ago").ok())
        .as_ref()?;
    let caps = pattern.captures(&input.lower)?;
    let value: f64 = caps.get(1)?.as_str().parse::<u32>().ok()?.into();
    let unit = match caps.get(2)?.as_str() {
        "minute" => MINUTE_SECS,
        "hour" => HOUR_SECS,
        "day" => DAY_SECS,
        "week" => WEEK_SECS,
        "month" => MONTH_SECS,
        _ => YEAR_SECS,
    };
    seconds_before(now, value * unit)
}

fn thirty_plus_days(input: &DateInput<'_>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if input.lower.contains("30+ days ago") {
        return seconds_before(now, 30.0 * DAY_SECS);
    }
    None
}

fn arabic_relative(input: &DateInput<'_>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| {
            Regex::new(r"منذ\s+([0-9]+)\s+(يوم|أيام|شهر|شهور|ساعة|ساعات|دقيقة|دقائق)").ok()
        })
        .as_ref()?;
    let text = ascii_digits(input.text);
    let caps = pattern.captures(&text)?;
    let value: f64 = caps.get(1)?.as_str().parse::<u32>().ok()?.into();
    let unit = match caps.get(2)?.as_str() {
        "يوم" | "أيام" => DAY_SECS,
        "شهر" | "شهور" => MONTH_SECS,
        "ساعة" | "ساعات" => HOUR_SECS,
        _ => MINUTE_SECS,
    };
    seconds_before(now, value * unit)
}

fn month_day(input: &DateInput<'_>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"([A-Za-z]{3})\s+([0-9]{1,2})").ok())
        .as_ref()?;
    let caps = pattern.captures(input.text)?;
    let month = caps.get(1)?.as_str();
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;

    let parse_in = |year: i32| {
        NaiveDate::parse_from_str(&format!("{month} {day} {year}"), "%b %d %Y")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    };

    // No year on the page: a date that would lie in the future belongs to
    // last year.
    match parse_in(now.year()) {
        Some(at) if at <= now => Some(at),
        Some(_) => parse_in(now.year() - 1),
        None => None,
    }
}

fn seconds_before(now: NaiveDateTime, seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() || seconds < 0.0 || seconds > i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_seconds(seconds.round() as i64)?;
    now.checked_sub_signed(delta)
}

/// Maps Arabic-Indic and Persian digits to ASCII so `٣` parses like `3`.
fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            other => other,
        })
        .collect()
}
