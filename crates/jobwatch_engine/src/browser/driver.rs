use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The browser could not be started.
    Launch,
    /// A page load or element wait ran out of time.
    Timeout,
    /// The browser or its devtools connection misbehaved.
    Driver,
    /// An in-page script failed or returned something unexpected.
    Script,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Timeouts and driver faults may clear up on a second try.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, DriverErrorKind::Timeout | DriverErrorKind::Driver)
    }

    /// Whether the session should be considered broken.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self.kind, DriverErrorKind::Driver | DriverErrorKind::Launch)
    }
}

/// How to find a clickable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    Css(&'a str),
    XPath(&'a str),
}

/// Everything a driver needs at launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchProfile {
    pub user_agent: String,
    pub headless: bool,
    pub page_load_timeout: Duration,
    pub browser_path: Option<PathBuf>,
    pub window_size: (u32, u32),
}

/// One live page in a rendering browser.
///
/// Calls block until the browser answers or the relevant timeout passes.
pub trait PageDriver {
    /// Loads `url` and waits for navigation to settle.
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Serialized DOM of the current page.
    fn page_source(&mut self) -> Result<String, DriverError>;

    fn current_url(&mut self) -> Result<String, DriverError>;

    fn count_elements(&mut self, selector: &str) -> Result<usize, DriverError>;

    /// Waits until at least one element matches, failing with
    /// [`DriverErrorKind::Timeout`] when none shows up in time.
    fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Clicks the first match that is visible, enabled and carries no
    /// disabled-state class. `Ok(false)` when there is no such element.
    fn click_if_actionable(&mut self, locator: Locator<'_>) -> Result<bool, DriverError>;

    fn scroll_height(&mut self) -> Result<u64, DriverError>;

    fn scroll_to(&mut self, offset: u64) -> Result<(), DriverError>;

    /// Moves the pointer over the `index`-th match of `selector`.
    fn hover(&mut self, selector: &str, index: usize) -> Result<(), DriverError>;

    /// Tears the browser down.
    fn quit(self: Box<Self>) -> Result<(), DriverError>;
}

pub trait DriverFactory {
    fn launch(&self, profile: &LaunchProfile) -> Result<Box<dyn PageDriver>, DriverError>;
}
