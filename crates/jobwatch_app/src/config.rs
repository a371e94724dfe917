//! Runtime configuration from the environment and an optional RON site list.
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use jobwatch_core::{KeywordFilter, PaginationKind, SiteConfig};
use jobwatch_engine::{RunSettings, SessionSettings, TelegramSettings};
use thiserror::Error;

const WUZZUF_DEVOPS_URL: &str = "https://wuzzuf.net/a/this-week-devops-jobs-in-egypt?\
filters%5Bpost_date%5D%5B0%5D=within_1_week";
const WUZZUF_IT_URL: &str = "https://wuzzuf.net/search/jobs/?a=navbg&\
filters%5Bpost_date%5D%5B0%5D=within_24_hours&q=it";
const WUZZUF_DEVELOPER_URL: &str = "https://wuzzuf.net/search/jobs/?a=navbg%7Cspbg&\
filters%5Bpost_date%5D%5B0%5D=within_24_hours&q=developer";

const WUZZUF_CARD: &str = "div.css-ghe2tq.e1v1l3u10";
const WUZZUF_TITLE: &str = "h2.css-193uk2c a.css-o171kl";
const WUZZUF_DESCRIPTION: &str = "div.css-1rhj4yg";
const WUZZUF_TAGS: &str = "div.css-1rhj4yg a[class^='css-'], div.css-1rhj4yg span[class^='css-']";
const WUZZUF_DATE: &str = "div.css-1k5ee52 div.css-eg55jf, div.css-1k5ee52 div.css-1jldrig";
const WUZZUF_DETAIL_DATE: &str = ".css-182mrdn";

const DEFAULT_DESCRIPTION_KEYWORDS: &str = "DevOps Engineer,SRE,Cloud Engineer,\
Site Reliability Engineer,Platform Engineer,Infrastructure Engineer,IT,System Administrator,\
IT Support,IT Manager,IT Director,IT Consultant,IT Analyst,Engineer,Developer,Specialist,\
Administrator,Support,Manager,Consultant,Analyst,Technical,Technology,Software,Hardware,\
Network,System,Security,Database,Web,Application,Computer,Information,Digital,\
Technical Support,Help Desk,Support Specialist,Technical Specialist";
const DEFAULT_TITLE_KEYWORDS: &str = "DevOps,SRE,Cloud,Site Reliability,Platform,Infrastructure,\
IT,System Administrator,IT Support,IT Manager,IT Director,IT Consultant,IT Analyst,Engineer,\
Developer,Specialist,Administrator,Support,Manager,Consultant,Analyst,Technical,Technology,\
Software,Hardware,Network,System,Security,Database,Web,Application,Computer,Information,\
Digital,Technical Support,Help Desk,Support Specialist,Technical Specialist";

const DEFAULT_POSTED_JOBS_FILE: &str = "posted_jobs.txt";
const DEFAULT_MAX_JOB_AGE_DAYS: u32 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(&'static str),
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: String,
        value: String,
        expected: &'static str,
    },
    #[error("could not read sites file {path}: {source}")]
    SitesFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse sites file {path}: {source}")]
    SitesFormat {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("no sites configured")]
    NoSites,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram: TelegramSettings,
    pub run: RunSettings,
    pub session: SessionSettings,
    pub title_keywords: Vec<String>,
    pub description_keywords: Vec<String>,
    pub posted_jobs_file: PathBuf,
    pub sites: Vec<SiteConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bot_token = var("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = var("TELEGRAM_CHAT_ID").ok_or(ConfigError::Missing("TELEGRAM_CHAT_ID"))?;

        let max_age_days = number(&var, "MAX_JOB_AGE_DAYS", DEFAULT_MAX_JOB_AGE_DAYS)?;
        let run = RunSettings {
            include_date: flag(&var, "INCLUDE_DATE_IN_MESSAGE", false),
            max_age: if max_age_days == 0 {
                None
            } else {
                TimeDelta::try_days(i64::from(max_age_days))
            },
            ..RunSettings::default()
        };

        let defaults = SessionSettings::default();
        let page_load_secs = number(
            &var,
            "PAGE_LOAD_TIMEOUT_SECONDS",
            defaults.page_load_timeout.as_secs(),
        )?;
        let session = SessionSettings {
            headless: flag(&var, "HEADLESS_MODE", true),
            browser_path: var("CHROME_PATH").map(PathBuf::from),
            page_load_timeout: Duration::from_secs(page_load_secs),
            max_scroll_attempts: number(&var, "MAX_SCROLL_PAUSES", defaults.max_scroll_attempts)?,
            ..defaults
        };

        let mut sites = match var("SITES_FILE") {
            Some(path) => load_sites_file(PathBuf::from(path))?,
            None => builtin_sites(),
        };
        for site in &mut sites {
            apply_site_overrides(site, &lookup)?;
        }
        if sites.is_empty() {
            return Err(ConfigError::NoSites);
        }

        Ok(Self {
            telegram: TelegramSettings::new(bot_token, chat_id),
            run,
            session,
            title_keywords: keywords(var("JOB_TITLE_KEYWORDS"), DEFAULT_TITLE_KEYWORDS),
            description_keywords: keywords(var("JOB_KEYWORDS"), DEFAULT_DESCRIPTION_KEYWORDS),
            posted_jobs_file: PathBuf::from(
                var("POSTED_JOBS_FILE").unwrap_or_else(|| DEFAULT_POSTED_JOBS_FILE.to_string()),
            ),
            sites,
        })
    }

    pub fn filter(&self) -> KeywordFilter {
        KeywordFilter::new(&self.title_keywords, &self.description_keywords)
    }
}

/// The three Wuzzuf feeds watched when no sites file is given.
pub fn builtin_sites() -> Vec<SiteConfig> {
    vec![
        wuzzuf("Wuzzuf DevOps", "WUZZUF", WUZZUF_DEVOPS_URL),
        wuzzuf("Wuzzuf IT", "WUZZUF_IT", WUZZUF_IT_URL),
        wuzzuf("Wuzzuf Developer", "WUZZUF_DEVELOPER", WUZZUF_DEVELOPER_URL),
    ]
}

fn wuzzuf(name: &str, prefix: &str, url: &str) -> SiteConfig {
    let mut site = SiteConfig::new(name, url, WUZZUF_CARD, WUZZUF_TITLE)
        .with_link_selector(WUZZUF_TITLE)
        .with_description_selector(WUZZUF_DESCRIPTION)
        .with_tags_selector(WUZZUF_TAGS)
        .with_date_selector(WUZZUF_DATE)
        .with_pagination(PaginationKind::ClickNext)
        .with_detail_date_selector(WUZZUF_DETAIL_DATE);
    site.env_prefix = Some(prefix.to_string());
    site
}

fn load_sites_file(path: PathBuf) -> Result<Vec<SiteConfig>, ConfigError> {
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(source) => return Err(ConfigError::SitesFile { path, source }),
    };
    ron::from_str(&content).map_err(|source| ConfigError::SitesFormat { path, source })
}

/// Applies `<PREFIX>_*` variables to a site. Required selectors ignore blank
/// values; a blank optional selector clears it.
fn apply_site_overrides<F>(site: &mut SiteConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(prefix) = site.env_prefix.clone() else {
        return Ok(());
    };
    let get = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).map(|v| v.trim().to_string());

    for (suffix, field) in [
        ("URL", &mut site.url),
        ("JOB_CARD_SELECTOR", &mut site.job_card_selector),
        ("TITLE_SELECTOR", &mut site.title_selector),
    ] {
        if let Some(value) = get(suffix).filter(|v| !v.is_empty()) {
            *field = value;
        }
    }
    for (suffix, field) in [
        ("LINK_SELECTOR", &mut site.link_selector),
        ("DESCRIPTION_SELECTOR", &mut site.description_selector),
        ("TAGS_SELECTOR", &mut site.tags_selector),
        ("DATE_SELECTOR", &mut site.date_selector),
    ] {
        if let Some(value) = get(suffix) {
            *field = Some(value).filter(|v| !v.is_empty());
        }
    }
    if let Some(value) = get("MAX_PAGES").filter(|v| !v.is_empty()) {
        site.max_pages = parse_number(&format!("{prefix}_MAX_PAGES"), &value)?;
    }
    Ok(())
}

fn flag<V>(var: &V, name: &str, default: bool) -> bool
where
    V: Fn(&str) -> Option<String>,
{
    var(name).map_or(default, |value| value.eq_ignore_ascii_case("true"))
}

fn number<V, N>(var: &V, name: &str, default: N) -> Result<N, ConfigError>
where
    V: Fn(&str) -> Option<String>,
    N: std::str::FromStr,
{
    match var(name) {
        Some(value) => parse_number(name, &value),
        None => Ok(default),
    }
}

fn parse_number<N: std::str::FromStr>(name: &str, value: &str) -> Result<N, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name: name.to_string(),
        value: value.to_string(),
        expected: "a non-negative whole number",
    })
}

fn keywords(value: Option<String>, default: &str) -> Vec<String> {
    value
        .as_deref()
        .unwrap_or(default)
        .split(',')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(str::to_string)
        .collect()
}
