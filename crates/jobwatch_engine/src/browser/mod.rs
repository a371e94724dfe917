mod chrome;
mod driver;
mod session;

pub use chrome::ChromeFactory;
pub use driver::{DriverError, DriverErrorKind, DriverFactory, LaunchProfile, Locator, PageDriver};
pub use session::{BrowserSession, Navigation, SessionSettings, USER_AGENTS};
