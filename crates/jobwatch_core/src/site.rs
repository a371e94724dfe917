use serde::{Deserialize, Serialize};

/// Page ceiling for click-next sites when a site does not set its own.
pub const DEFAULT_MAX_PAGES: u32 = 25;

/// Ordered "next page" candidates, covering several markup revisions of the
/// Wuzzuf family before the generic `rel`/`aria-label` forms.
pub const DEFAULT_NEXT_PAGE_SELECTORS: &[&str] = &[
    "button.css-wq4g8g a.css-1fcv3il",
    "button.css-zye1os a.css-1fcv3il",
    "button.css-zye1os a",
    "a.css-1fcv3il",
    "button[class*='css-zye1os'] a",
    "a[aria-label='Next']",
    "a.next",
    "a[rel='next']",
    "button[aria-label='Next']",
    ".pagination a:last-child",
    "a[data-testid='pagination-next']",
    "a[data-testid='next']",
    "a[aria-label='التالي']",
    "button[aria-label='التالي']",
    "a.css-1evf01f",
    "button.css-1evf01f a",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaginationKind {
    /// Extract whatever the first page shows.
    #[default]
    None,
    /// Follow a "next page" control until it disappears or a limit is hit.
    ClickNext,
    /// Scroll to trigger lazy loading, then extract once.
    InfiniteScroll,
}

/// Immutable per-site scrape descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    pub job_card_selector: String,
    pub title_selector: String,
    #[serde(default)]
    pub link_selector: Option<String>,
    #[serde(default)]
    pub description_selector: Option<String>,
    #[serde(default)]
    pub tags_selector: Option<String>,
    #[serde(default)]
    pub date_selector: Option<String>,
    #[serde(default)]
    pub pagination: PaginationKind,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Overrides [`DEFAULT_NEXT_PAGE_SELECTORS`] when non-empty.
    #[serde(default)]
    pub next_page_selectors: Vec<String>,
    /// Date element on a posting's own page, used to replace the
    /// `"Recently"` fallback on click-next sites.
    #[serde(default)]
    pub detail_date_selector: Option<String>,
    /// Prefix for `<PREFIX>_URL`-style environment overrides.
    #[serde(default)]
    pub env_prefix: Option<String>,
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

impl SiteConfig {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        job_card_selector: impl Into<String>,
        title_selector: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            job_card_selector: job_card_selector.into(),
            title_selector: title_selector.into(),
            link_selector: None,
            description_selector: None,
            tags_selector: None,
            date_selector: None,
            pagination: PaginationKind::None,
            max_pages: DEFAULT_MAX_PAGES,
            next_page_selectors: Vec::new(),
            detail_date_selector: None,
            env_prefix: None,
        }
    }

    pub fn with_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.link_selector = Some(selector.into());
        self
    }

    pub fn with_description_selector(mut self, selector: impl Into<String>) -> Self {
        self.description_selector = Some(selector.into());
        self
    }

    pub fn with_tags_selector(mut self, selector: impl Into<String>) -> Self {
        self.tags_selector = Some(selector.into());
        self
    }

    pub fn with_date_selector(mut self, selector: impl Into<String>) -> Self {
        self.date_selector = Some(selector.into());
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationKind) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_detail_date_selector(mut self, selector: impl Into<String>) -> Self {
        self.detail_date_selector = Some(selector.into());
        self
    }

    /// Detail-page date selector, when date enhancement applies to this site.
    ///
    /// Only click-next sites are enhanced.
    pub fn enhancement_selector(&self) -> Option<&str> {
        if self.pagination != PaginationKind::ClickNext {
            return None;
        }
        non_blank(self.detail_date_selector.as_ref())
    }

    /// Next-page candidates in evaluation order.
    pub fn next_page_candidates(&self) -> Vec<&str> {
        if self.next_page_selectors.is_empty() {
            DEFAULT_NEXT_PAGE_SELECTORS.to_vec()
        } else {
            self.next_page_selectors.iter().map(String::as_str).collect()
        }
    }
}

/// Treats blank optional selectors as absent.
pub(crate) fn non_blank(selector: Option<&String>) -> Option<&str> {
    selector.map(|s| s.trim()).filter(|s| !s.is_empty())
}
