//! Scripted browser and pacer so sessions run without Chrome or sleeping.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use jobwatch_core::{PaginationKind, Pacer, SiteConfig};
use jobwatch_engine::{
    BrowserSession, DriverError, DriverErrorKind, DriverFactory, LaunchProfile, Locator,
    PageDriver, SessionSettings,
};
use scraper::{Html, Selector};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(jobwatch_logging::initialize_for_tests);
}

pub const SITE_URL: &str = "https://jobs.example.com/search";
pub const NEXT_SELECTOR: &str = "a[rel='next']";
pub const BLOCK_PAGE: &str = "<html><body><h1>Access Denied</h1></body></html>";
const BLANK_PAGE: &str = "<html><body></body></html>";

pub fn card(id: u32, title: &str, description: &str, date: Option<&str>) -> String {
    let date = date
        .map(|d| format!("<div class=\"date\">{d}</div>"))
        .unwrap_or_default();
    format!(
        "<div class=\"card\"><h2><a href=\"/jobs/{id}\">{title}</a></h2>\
         <div class=\"desc\">{description}</div>{date}</div>"
    )
}

pub fn page(cards: &[String]) -> String {
    format!("<html><body><main>{}</main></body></html>", cards.concat())
}

pub fn site(pagination: PaginationKind) -> SiteConfig {
    SiteConfig::new("Example Jobs", SITE_URL, "div.card", "h2 a")
        .with_description_selector("div.desc")
        .with_date_selector("div.date")
        .with_pagination(pagination)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Current {
    Blank,
    Blocked,
    Site { url: String, index: usize },
    Detail(String),
}

/// Everything the fake browser knows and everything it was asked to do.
#[derive(Debug)]
pub struct FakeWeb {
    pub sites: HashMap<String, Vec<String>>,
    pub details: HashMap<String, String>,
    /// Upcoming navigations that land on [`BLOCK_PAGE`].
    pub blocked_loads: usize,
    /// Errors returned by upcoming navigations, in order.
    pub navigation_failures: VecDeque<DriverError>,
    /// Site page index after which the next page shows a block.
    pub block_after_page: Option<usize>,
    pub next_selector: String,
    pub scroll_heights: VecDeque<u64>,
    current: Current,
    last_height: u64,

    pub launches: Vec<String>,
    pub failed_launches: usize,
    pub quits: usize,
    pub navigations: Vec<String>,
    pub card_waits: Vec<String>,
    pub clicks: usize,
    pub hovers: usize,
    pub scrolls: Vec<u64>,
}

impl Default for FakeWeb {
    fn default() -> Self {
        Self {
            sites: HashMap::new(),
            details: HashMap::new(),
            blocked_loads: 0,
            navigation_failures: VecDeque::new(),
            block_after_page: None,
            next_selector: NEXT_SELECTOR.to_string(),
            scroll_heights: VecDeque::new(),
            current: Current::Blank,
            last_height: 1000,
            launches: Vec::new(),
            failed_launches: 0,
            quits: 0,
            navigations: Vec::new(),
            card_waits: Vec::new(),
            clicks: 0,
            hovers: 0,
            scrolls: Vec::new(),
        }
    }
}

impl FakeWeb {
    pub fn with_site(pages: Vec<String>) -> Self {
        let mut web = Self::default();
        web.sites.insert(SITE_URL.to_string(), pages);
        web
    }

    fn html(&self) -> String {
        match &self.current {
            Current::Blank => BLANK_PAGE.to_string(),
            Current::Blocked => BLOCK_PAGE.to_string(),
            Current::Site { url, index } => self
                .sites
                .get(url)
                .and_then(|pages| pages.get(*index))
                .cloned()
                .unwrap_or_else(|| BLANK_PAGE.to_string()),
            Current::Detail(url) => self.details.get(url).cloned().unwrap_or_default(),
        }
    }

    fn count(&self, selector: &str) -> Result<usize, DriverError> {
        let selector = Selector::parse(selector)
            .map_err(|err| DriverError::new(DriverErrorKind::Script, err.to_string()))?;
        Ok(Html::parse_document(&self.html()).select(&selector).count())
    }

    fn url(&self) -> String {
        match &self.current {
            Current::Site { url, .. } | Current::Detail(url) => url.clone(),
            _ => "about:blank".to_string(),
        }
    }
}

pub type SharedWeb = Rc<RefCell<FakeWeb>>;

pub struct FakeFactory {
    pub web: SharedWeb,
}

impl DriverFactory for FakeFactory {
    fn launch(&self, profile: &LaunchProfile) -> Result<Box<dyn PageDriver>, DriverError> {
        let mut web = self.web.borrow_mut();
        if web.failed_launches > 0 {
            web.failed_launches -= 1;
            return Err(DriverError::new(DriverErrorKind::Launch, "chrome not found"));
        }
        web.launches.push(profile.user_agent.clone());
        web.current = Current::Blank;
        Ok(Box::new(FakeDriver {
            web: Rc::clone(&self.web),
        }))
    }
}

pub struct FakeDriver {
    web: SharedWeb,
}

impl PageDriver for FakeDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let mut web = self.web.borrow_mut();
        web.navigations.push(url.to_string());
        if let Some(err) = web.navigation_failures.pop_front() {
            return Err(err);
        }
        web.current = if web.blocked_loads > 0 {
            web.blocked_loads -= 1;
            Current::Blocked
        } else if web.sites.contains_key(url) {
            Current::Site {
                url: url.to_string(),
                index: 0,
            }
        } else if web.details.contains_key(url) {
            Current::Detail(url.to_string())
        } else {
            Current::Blank
        };
        Ok(())
    }

    fn page_source(&mut self) -> Result<String, DriverError> {
        Ok(self.web.borrow().html())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.web.borrow().url())
    }

    fn count_elements(&mut self, selector: &str) -> Result<usize, DriverError> {
        self.web.borrow().count(selector)
    }

    fn wait_for_element(&mut self, selector: &str, _timeout: Duration) -> Result<(), DriverError> {
        let mut web = self.web.borrow_mut();
        web.card_waits.push(selector.to_string());
        if web.count(selector)? > 0 {
            Ok(())
        } else {
            Err(DriverError::new(
                DriverErrorKind::Timeout,
                format!("wait for '{selector}': The event waited for never came"),
            ))
        }
    }

    fn click_if_actionable(&mut self, locator: Locator<'_>) -> Result<bool, DriverError> {
        let mut web = self.web.borrow_mut();
        let matches = matches!(locator, Locator::Css(selector) if selector == web.next_selector);
        if !matches {
            return Ok(false);
        }
        let Current::Site { url, index } = web.current.clone() else {
            return Ok(false);
        };
        let pages = web.sites.get(&url).map_or(0, Vec::len);
        if index + 1 >= pages {
            return Ok(false);
        }
        web.clicks += 1;
        web.current = if web.block_after_page == Some(index) {
            Current::Blocked
        } else {
            Current::Site {
                url,
                index: index + 1,
            }
        };
        Ok(true)
    }

    fn scroll_height(&mut self) -> Result<u64, DriverError> {
        let mut web = self.web.borrow_mut();
        if let Some(height) = web.scroll_heights.pop_front() {
            web.last_height = height;
        }
        Ok(web.last_height)
    }

    fn scroll_to(&mut self, offset: u64) -> Result<(), DriverError> {
        self.web.borrow_mut().scrolls.push(offset);
        Ok(())
    }

    fn hover(&mut self, _selector: &str, _index: usize) -> Result<(), DriverError> {
        self.web.borrow_mut().hovers += 1;
        Ok(())
    }

    fn quit(self: Box<Self>) -> Result<(), DriverError> {
        self.web.borrow_mut().quits += 1;
        Ok(())
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pub pauses: RefCell<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn total(&self) -> Duration {
        self.pauses.borrow().iter().sum()
    }

    pub fn contains(&self, duration: Duration) -> bool {
        self.pauses.borrow().contains(&duration)
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}

pub fn open_session(web: &SharedWeb, pacer: &Rc<RecordingPacer>) -> BrowserSession {
    let factory = FakeFactory {
        web: Rc::clone(web),
    };
    BrowserSession::open(Box::new(factory), SessionSettings::default(), pacer.clone())
        .expect("fake browser launches")
}

pub fn shared(web: FakeWeb) -> SharedWeb {
    Rc::new(RefCell::new(web))
}
