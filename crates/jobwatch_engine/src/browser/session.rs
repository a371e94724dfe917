use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use jobwatch_core::{
    classify_page, BlockSignal, DelayRange, Pacer, RetryPolicy, CAPTCHA_SELECTORS,
};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};
use rand::seq::SliceRandom;

use super::driver::{DriverError, DriverErrorKind, DriverFactory, LaunchProfile, Locator, PageDriver};

/// Desktop user agents rotated per session.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

const PRE_NAVIGATION_DELAY: DelayRange = DelayRange::secs(1, 3);
const POST_NAVIGATION_DELAY: DelayRange = DelayRange::secs(2, 4);
const SOFT_BLOCK_BACKOFF: DelayRange = DelayRange::secs(5, 10);
const RESTART_DELAY: DelayRange = DelayRange::secs(2, 5);

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub headless: bool,
    pub browser_path: Option<PathBuf>,
    pub window_size: (u32, u32),
    pub page_load_timeout: Duration,
    /// Wait for the first job card after landing on a site.
    pub card_wait_timeout: Duration,
    /// Wait for job cards after moving to a later page.
    pub next_page_wait_timeout: Duration,
    /// Wait for the date element on a posting's own page.
    pub detail_wait_timeout: Duration,
    pub max_scroll_attempts: u32,
    /// Rotation pool; empty means [`USER_AGENTS`].
    pub user_agents: Vec<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            headless: true,
            browser_path: None,
            window_size: (1920, 1080),
            page_load_timeout: Duration::from_secs(60),
            card_wait_timeout: Duration::from_secs(40),
            next_page_wait_timeout: Duration::from_secs(20),
            detail_wait_timeout: Duration::from_secs(5),
            max_scroll_attempts: 5,
            user_agents: Vec::new(),
        }
    }
}

/// Verdict of a completed page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Clear,
    /// The page loaded but the site is refusing us; the session must go.
    Blocked,
}

/// Exclusive owner of one live browser.
///
/// A session that was restarted never hands out its previous driver again,
/// and the browser is torn down when the session is dropped.
pub struct BrowserSession {
    factory: Box<dyn DriverFactory>,
    settings: SessionSettings,
    pacer: Rc<dyn Pacer>,
    driver: Option<Box<dyn PageDriver>>,
    user_agent: String,
    restarts: u32,
}

impl BrowserSession {
    /// Launches the first browser right away so configuration problems
    /// surface before any site is visited.
    pub fn open(
        factory: Box<dyn DriverFactory>,
        settings: SessionSettings,
        pacer: Rc<dyn Pacer>,
    ) -> Result<Self, DriverError> {
        let mut session = Self {
            factory,
            settings,
            pacer,
            driver: None,
            user_agent: String::new(),
            restarts: 0,
        };
        session.launch()?;
        Ok(session)
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn pacer(&self) -> Rc<dyn Pacer> {
        Rc::clone(&self.pacer)
    }

    /// User agent of the current (or most recent) browser.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    fn pick_user_agent(&self) -> String {
        let mut rng = rand::thread_rng();
        let chosen = if self.settings.user_agents.is_empty() {
            USER_AGENTS.choose(&mut rng).map(|ua| ua.to_string())
        } else {
            self.settings.user_agents.choose(&mut rng).cloned()
        };
        chosen.unwrap_or_default()
    }

    fn launch(&mut self) -> Result<(), DriverError> {
        self.user_agent = self.pick_user_agent();
        let profile = LaunchProfile {
            user_agent: self.user_agent.clone(),
            headless: self.settings.headless,
            page_load_timeout: self.settings.page_load_timeout,
            browser_path: self.settings.browser_path.clone(),
            window_size: self.settings.window_size,
        };
        let driver = self.factory.launch(&profile)?;
        watch_debug!("Browser session launched with user agent: {}", self.user_agent);
        self.driver = Some(driver);
        Ok(())
    }

    /// Live driver, relaunching one if an earlier restart failed to.
    fn driver(&mut self) -> Result<&mut (dyn PageDriver + 'static), DriverError> {
        if self.driver.is_none() {
            watch_info!("No live browser; launching a new session.");
            self.launch()?;
        }
        self.driver
            .as_deref_mut()
            .ok_or_else(|| DriverError::new(DriverErrorKind::Launch, "browser not available"))
    }

    /// Paced, retried page load followed by a blocking check.
    ///
    /// Timeouts and driver faults are retried with exponential backoff; a
    /// blocked page is reported, not retried.
    pub fn navigate(&mut self, url: &str) -> Result<Navigation, DriverError> {
        let pacer = self.pacer();
        watch_info!("Attempting to navigate to {}", url);
        pacer.pause_within(PRE_NAVIGATION_DELAY);

        let load = |attempt: u32| -> Result<(), DriverError> {
            if attempt > 1 {
                watch_warn!("Retrying navigation to {} (attempt {})", url, attempt);
            }
            self.driver()?.navigate(url)
        };
        RetryPolicy::navigation().run(pacer.as_ref(), DriverError::is_retryable, load)?;

        if self.detect_blocking() {
            return Ok(Navigation::Blocked);
        }
        pacer.pause_within(POST_NAVIGATION_DELAY);
        watch_info!("Successfully navigated to {}", url);
        Ok(Navigation::Clear)
    }

    /// Single unpaced page load.
    pub fn load(&mut self, url: &str) -> Result<(), DriverError> {
        self.driver()?.navigate(url)
    }

    /// Hard phrases and CAPTCHA elements mean blocked. A soft phrase costs a
    /// pause but is not treated as a block. Failing to inspect the page is
    /// logged and reported as not blocked.
    pub fn detect_blocking(&mut self) -> bool {
        let source = match self.page_source() {
            Ok(source) => source,
            Err(err) => {
                watch_warn!("Could not read page for blocking check: {}", err);
                return false;
            }
        };

        match classify_page(&source) {
            BlockSignal::Hard(phrase) => {
                watch_warn!("Blocking detected: found '{}' in page content", phrase);
                return true;
            }
            BlockSignal::Soft(phrase) => {
                watch_info!("Possible rate limiting ('{}'); backing off", phrase);
                self.pacer.pause_within(SOFT_BLOCK_BACKOFF);
                return false;
            }
            BlockSignal::Clear => {}
        }

        for selector in CAPTCHA_SELECTORS {
            match self.count_elements(selector) {
                Ok(0) => {}
                Ok(_) => {
                    watch_warn!("Blocking detected: CAPTCHA element '{}' present", selector);
                    return true;
                }
                Err(err) => watch_debug!("CAPTCHA probe '{}' failed: {}", selector, err),
            }
        }
        false
    }

    /// Replaces the browser with a fresh one under a new user agent.
    ///
    /// Teardown errors are logged and ignored. If the relaunch fails the
    /// session holds no browser and the next call launches one.
    pub fn restart(&mut self) -> Result<(), DriverError> {
        watch_info!("Restarting browser session");
        self.shutdown();
        self.pacer.pause_within(RESTART_DELAY);
        self.restarts += 1;
        self.launch()
    }

    pub fn page_source(&mut self) -> Result<String, DriverError> {
        self.driver()?.page_source()
    }

    pub fn current_url(&mut self) -> Result<String, DriverError> {
        self.driver()?.current_url()
    }

    pub fn count_elements(&mut self, selector: &str) -> Result<usize, DriverError> {
        self.driver()?.count_elements(selector)
    }

    pub fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        self.driver()?.wait_for_element(selector, timeout)
    }

    pub fn click_if_actionable(&mut self, locator: Locator<'_>) -> Result<bool, DriverError> {
        self.driver()?.click_if_actionable(locator)
    }

    pub fn scroll_height(&mut self) -> Result<u64, DriverError> {
        self.driver()?.scroll_height()
    }

    pub fn scroll_to(&mut self, offset: u64) -> Result<(), DriverError> {
        self.driver()?.scroll_to(offset)
    }

    pub fn hover(&mut self, selector: &str, index: usize) -> Result<(), DriverError> {
        self.driver()?.hover(selector, index)
    }

    /// Tears the browser down now instead of at drop.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(driver) = self.driver.take() {
            match driver.quit() {
                Ok(()) => watch_info!("Browser session terminated."),
                Err(err) => watch_warn!("Error while quitting browser: {}", err),
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
