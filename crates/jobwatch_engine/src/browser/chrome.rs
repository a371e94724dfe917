//! Headless Chrome over the devtools protocol.
use std::ffi::OsStr;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::protocol::cdp::DOM::NodeId;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};
use serde_json::Value;

use super::driver::{
    DriverError, DriverErrorKind, DriverFactory, LaunchProfile, Locator, PageDriver,
};

/// Keeps the devtools connection open through long deliberate pauses.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--blink-settings=imagesEnabled=false",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-gpu",
    "--disable-infobars",
    "--no-first-run",
    "--mute-audio",
    "--hide-scrollbars",
    "--lang=en-US",
];

/// Runs in every document before page scripts.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
window.chrome = window.chrome || { runtime: {} };
const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
  window.navigator.permissions.query = (parameters) =>
    parameters.name === 'notifications'
      ? Promise.resolve({ state: Notification.permission })
      : originalQuery(parameters);
}
"#;

/// Launches a local Chrome or Chromium per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeFactory;

impl DriverFactory for ChromeFactory {
    fn launch(&self, profile: &LaunchProfile) -> Result<Box<dyn PageDriver>, DriverError> {
        let user_agent_arg = format!("--user-agent={}", profile.user_agent);
        let mut args: Vec<&OsStr> = LAUNCH_ARGS.iter().map(OsStr::new).collect();
        args.push(OsStr::new(&user_agent_arg));

        let options = LaunchOptions {
            headless: profile.headless,
            sandbox: false,
            window_size: Some(profile.window_size),
            path: profile.browser_path.clone(),
            idle_browser_timeout: IDLE_BROWSER_TIMEOUT,
            args,
            ..Default::default()
        };

        let browser = Browser::new(options)
            .map_err(|err| DriverError::new(DriverErrorKind::Launch, err.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|err| DriverError::new(DriverErrorKind::Launch, err.to_string()))?;
        tab.set_default_timeout(profile.page_load_timeout);
        tab.set_user_agent(&profile.user_agent, Some("en-US,en;q=0.9"), None)
            .map_err(|err| classify("set user agent", err))?;
        apply_stealth(&tab);

        watch_info!(
            "Chrome session started (headless: {}, user agent: {})",
            profile.headless,
            profile.user_agent
        );
        Ok(Box::new(ChromeDriver {
            browser,
            tab,
            hover_targets: None,
        }))
    }
}

/// Stealth patches are best effort; a browser that refuses them still works.
fn apply_stealth(tab: &Tab) {
    if let Err(err) = tab.enable_stealth_mode() {
        watch_warn!("Could not enable stealth mode: {}", err);
    }
    let injected = tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
        source: STEALTH_SCRIPT.to_string(),
        world_name: None,
        include_command_line_api: None,
        run_immediately: None,
    });
    if let Err(err) = injected {
        watch_warn!("Could not install stealth script: {}", err);
    }
}

/// Card nodes looked up once per page so hovering stays linear in cards.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HoverTargets {
    selector: String,
    nodes: Vec<NodeId>,
}

impl HoverTargets {
    /// Cached node for `index`; the first card of a pass always re-resolves.
    fn node(&self, selector: &str, index: usize) -> Option<NodeId> {
        if index == 0 || self.selector != selector {
            return None;
        }
        self.nodes.get(index).copied()
    }
}

pub struct ChromeDriver {
    browser: Browser,
    tab: Arc<Tab>,
    hover_targets: Option<HoverTargets>,
}

impl ChromeDriver {
    fn resolve_hover_targets(&mut self, selector: &str) -> Result<&HoverTargets, DriverError> {
        let nodes: Vec<NodeId> = self
            .tab
            .find_elements(selector)
            .map_err(|err| classify("find cards", err))?
            .iter()
            .map(|element| element.node_id)
            .collect();
        Ok(self.hover_targets.insert(HoverTargets {
            selector: selector.to_string(),
            nodes,
        }))
    }

    fn evaluate(&self, script: &str) -> Result<Option<Value>, DriverError> {
        self.tab
            .evaluate(script, false)
            .map(|object| object.value)
            .map_err(classify_script)
    }
}

const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out", "never came"];

const CONNECTION_MARKERS: &[&str] = &[
    "connection",
    "disconnected",
    "closed",
    "channel",
    "transport",
    "websocket",
    "target crashed",
];

fn mentions_any(message: &str, markers: &[&str]) -> bool {
    let lower = message.to_lowercase();
    markers.iter().any(|marker| lower.contains(marker))
}

/// Devtools errors only carry text, so timeouts are told apart by message.
fn classify(context: &str, err: impl Display) -> DriverError {
    let message = format!("{context}: {err}");
    let kind = if mentions_any(&message, TIMEOUT_MARKERS) {
        DriverErrorKind::Timeout
    } else {
        DriverErrorKind::Driver
    };
    DriverError::new(kind, message)
}

/// Like [`classify`], but a failure that is not about the browser link is
/// blamed on the script itself.
fn classify_script(err: impl Display) -> DriverError {
    let message = format!("evaluate script: {err}");
    let kind = if mentions_any(&message, TIMEOUT_MARKERS) {
        DriverErrorKind::Timeout
    } else if mentions_any(&message, CONNECTION_MARKERS) {
        DriverErrorKind::Driver
    } else {
        DriverErrorKind::Script
    };
    DriverError::new(kind, message)
}

fn js_string(text: &str) -> Result<String, DriverError> {
    serde_json::to_string(text).map_err(|err| DriverError::new(DriverErrorKind::Script, err.to_string()))
}

fn click_script(locator: Locator<'_>) -> Result<String, DriverError> {
    let candidates = match locator {
        Locator::Css(selector) => format!(
            "(() => {{ const el = document.querySelector({}); return el ? [el] : []; }})()",
            js_string(selector)?
        ),
        Locator::XPath(xpath) => format!(
            "(() => {{ const found = document.evaluate({}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
             for (let i = 0; i < found.snapshotLength; i++) out.push(found.snapshotItem(i)); \
             return out; }})()",
            js_string(xpath)?
        ),
    };
    Ok(format!(
        r#"(() => {{
  let candidates;
  try {{ candidates = {candidates}; }} catch (e) {{ return 'invalid'; }}
  for (const el of candidates) {{
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const visible = style.display !== 'none' && style.visibility !== 'hidden'
      && rect.width > 0 && rect.height > 0;
    const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true';
    const cls = (el.getAttribute('class') || '').toLowerCase();
    if (visible && enabled && !cls.includes('disabled')) {{
      el.scrollIntoView({{ block: 'center' }});
      el.click();
      return 'clicked';
    }}
  }}
  return 'none';
}})()"#
    ))
}

impl PageDriver for ChromeDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.hover_targets = None;
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|err| classify("navigate", err))
    }

    fn page_source(&mut self) -> Result<String, DriverError> {
        self.tab
            .get_content()
            .map_err(|err| classify("read page source", err))
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.tab.get_url())
    }

    fn count_elements(&mut self, selector: &str) -> Result<usize, DriverError> {
        let script = format!(
            "(() => {{ try {{ return document.querySelectorAll({}).length; }} catch (e) {{ return -1; }} }})()",
            js_string(selector)?
        );
        match self.evaluate(&script)?.and_then(|value| value.as_i64()) {
            Some(count) if count >= 0 => Ok(count as usize),
            _ => Err(DriverError::new(
                DriverErrorKind::Script,
                format!("invalid selector '{selector}'"),
            )),
        }
    }

    fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|err| classify(&format!("wait for '{selector}'"), err))
    }

    fn click_if_actionable(&mut self, locator: Locator<'_>) -> Result<bool, DriverError> {
        self.hover_targets = None;
        let outcome = self.evaluate(&click_script(locator)?)?;
        match outcome.as_ref().and_then(Value::as_str) {
            Some("clicked") => Ok(true),
            Some("none") => Ok(false),
            other => Err(DriverError::new(
                DriverErrorKind::Script,
                format!("click on {locator:?} returned {other:?}"),
            )),
        }
    }

    fn scroll_height(&mut self) -> Result<u64, DriverError> {
        self.evaluate("document.body.scrollHeight")?
            .and_then(|value| value.as_f64())
            .map(|height| height.max(0.0) as u64)
            .ok_or_else(|| DriverError::new(DriverErrorKind::Script, "scroll height unavailable"))
    }

    fn scroll_to(&mut self, offset: u64) -> Result<(), DriverError> {
        self.hover_targets = None;
        self.evaluate(&format!("window.scrollTo(0, {offset});"))
            .map(|_| ())
    }

    fn hover(&mut self, selector: &str, index: usize) -> Result<(), DriverError> {
        let cached = self
            .hover_targets
            .as_ref()
            .and_then(|targets| targets.node(selector, index));
        let node = match cached {
            Some(node) => Some(node),
            None => self.resolve_hover_targets(selector)?.nodes.get(index).copied(),
        };
        let node = node.ok_or_else(|| {
            DriverError::new(
                DriverErrorKind::Script,
                format!("no element {index} for '{selector}'"),
            )
        })?;
        let element = Element::new(&self.tab, node).map_err(|err| classify("resolve card", err))?;
        element
            .move_mouse_over()
            .map(|_| ())
            .map_err(|err| classify("hover", err))
    }

    fn quit(self: Box<Self>) -> Result<(), DriverError> {
        let ChromeDriver { browser, tab, .. } = *self;
        if let Err(err) = tab.close(true) {
            watch_debug!("Closing tab failed: {}", err);
        }
        drop(tab);
        drop(browser);
        Ok(())
    }
}
