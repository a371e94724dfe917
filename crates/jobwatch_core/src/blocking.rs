/// Phrases that mean the site refused us outright. Matched
/// case-insensitively against the page source.
pub const HARD_BLOCK_PHRASES: &[&str] = &["403 forbidden", "access denied", "blocked", "captcha"];

/// Phrases that suggest throttling; worth backing off for, not restarting.
pub const SOFT_BLOCK_PHRASES: &[&str] = &["rate limit"];

/// CAPTCHA-shaped elements that mark a page as blocked even when none of the
/// phrases appear in the markup.
pub const CAPTCHA_SELECTORS: &[&str] = &[
    "iframe[src*='captcha']",
    ".captcha",
    "#captcha",
    "[class*='captcha']",
    "[id*='captcha']",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSignal {
    Clear,
    Hard(&'static str),
    Soft(&'static str),
}

/// Classifies page source by phrase. Hard phrases take precedence over soft
/// ones.
pub fn classify_page(source: &str) -> BlockSignal {
    let lower = source.to_lowercase();
    if let Some(phrase) = HARD_BLOCK_PHRASES.iter().find(|p| lower.contains(*p)) {
        return BlockSignal::Hard(phrase);
    }
    if let Some(phrase) = SOFT_BLOCK_PHRASES.iter().find(|p| lower.contains(*p)) {
        return BlockSignal::Soft(phrase);
    }
    BlockSignal::Clear
}
