//! One full cycle: scrape every site, pick new postings, deliver them.
use std::collections::HashSet;

use chrono::{Local, NaiveDateTime, TimeDelta};
use jobwatch_core::{heartbeat_record, select_new_postings, JobRecord, KeywordFilter, SiteConfig};
use jobwatch_logging::{watch_debug, watch_error, watch_info, watch_warn};
use tokio::runtime::Runtime;

use crate::browser::BrowserSession;
use crate::dedup::{DedupStore, StoreError};
use crate::notify::Notifier;
use crate::orchestrator::SiteScraper;
use crate::types::{SiteOutcome, SiteReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub include_date: bool,
    /// Postings older than this are not sent. `None` disables the check.
    pub max_age: Option<TimeDelta>,
    /// Send a "no new jobs" message when nothing qualifies.
    pub send_heartbeat: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            include_date: false,
            max_age: TimeDelta::try_days(7),
            send_heartbeat: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTally {
    pub site: String,
    pub records: usize,
    pub attempts: u32,
    pub outcome: SiteOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sites: Vec<SiteTally>,
    pub scraped: usize,
    pub fresh: usize,
    pub already_posted: usize,
    pub irrelevant: usize,
    pub too_old: usize,
    pub sent: usize,
    pub failed: usize,
    pub heartbeat_sent: bool,
}

pub struct RunController {
    scraper: SiteScraper,
    filter: KeywordFilter,
    store: DedupStore,
    notifier: Box<dyn Notifier>,
    settings: RunSettings,
}

impl RunController {
    pub fn new(
        filter: KeywordFilter,
        store: DedupStore,
        notifier: Box<dyn Notifier>,
        settings: RunSettings,
    ) -> Self {
        Self {
            scraper: SiteScraper::default(),
            filter,
            store,
            notifier,
            settings,
        }
    }

    pub fn with_scraper(mut self, scraper: SiteScraper) -> Self {
        self.scraper = scraper;
        self
    }

    /// Runs a full cycle against the local clock.
    pub fn run(
        &self,
        session: &mut BrowserSession,
        sites: &[SiteConfig],
        runtime: &Runtime,
    ) -> Result<RunSummary, StoreError> {
        self.run_at(session, sites, runtime, Local::now().naive_local())
    }

    /// Scraping is blocking and happens first; delivery runs on `runtime`.
    /// Only a dedup store that cannot be read fails the run.
    pub fn run_at(
        &self,
        session: &mut BrowserSession,
        sites: &[SiteConfig],
        runtime: &Runtime,
        now: NaiveDateTime,
    ) -> Result<RunSummary, StoreError> {
        watch_info!("Initiating job search and notification cycle at {}", now);
        let mut seen = self.store.load()?;

        let reports = self.scrape_sites(session, sites);
        let mut summary = RunSummary {
            sites: reports.iter().map(tally).collect(),
            ..RunSummary::default()
        };
        let records: Vec<JobRecord> = reports.into_iter().flat_map(|r| r.records).collect();
        summary.scraped = records.len();

        let selection =
            select_new_postings(records, &seen, &self.filter, self.settings.max_age, now);
        summary.fresh = selection.fresh.len();
        summary.already_posted = selection.already_posted;
        summary.irrelevant = selection.irrelevant;
        summary.too_old = selection.too_old;

        let delivery = runtime.block_on(self.deliver(selection.fresh, &mut seen, now));
        summary.sent = delivery.sent;
        summary.failed = delivery.failed;
        summary.heartbeat_sent = delivery.heartbeat_sent;

        log_summary(&summary);
        Ok(summary)
    }

    /// Scrapes each site in turn. One site's failure never stops the rest.
    pub fn scrape_sites(&self, session: &mut BrowserSession, sites: &[SiteConfig]) -> Vec<SiteReport> {
        sites
            .iter()
            .map(|site| {
                let report = self.scraper.scrape_site(session, site);
                watch_debug!("Found {} jobs from {}.", report.records.len(), site.name);
                report
            })
            .collect()
    }

    /// Sends each fresh posting and records it only after a confirmed send.
    pub async fn deliver(
        &self,
        fresh: Vec<JobRecord>,
        seen: &mut HashSet<String>,
        now: NaiveDateTime,
    ) -> Delivery {
        let mut delivery = Delivery::default();
        if fresh.is_empty() {
            watch_info!("No new relevant job postings found in this cycle.");
            if self.settings.send_heartbeat {
                let beat = heartbeat_record(now);
                delivery.heartbeat_sent = self.notifier.send(&beat, self.settings.include_date).await;
            }
            return delivery;
        }

        watch_info!(
            "Identified {} new relevant job postings. Sending notifications...",
            fresh.len()
        );
        for record in fresh {
            if seen.contains(&record.link) {
                continue;
            }
            if !self.notifier.send(&record, self.settings.include_date).await {
                watch_warn!(
                    "Failed to send notification for '{}'. It will not be marked as posted and may be resent.",
                    record.title
                );
                delivery.failed += 1;
                continue;
            }
            delivery.sent += 1;
            if let Err(err) = self.store.append(&record.link) {
                watch_error!("Sent '{}' but could not record it: {}", record.title, err);
            }
            seen.insert(record.link);
        }
        delivery
    }
}

/// Delivery counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub sent: usize,
    pub failed: usize,
    pub heartbeat_sent: bool,
}

fn tally(report: &SiteReport) -> SiteTally {
    SiteTally {
        site: report.site.clone(),
        records: report.records.len(),
        attempts: report.attempts,
        outcome: report.outcome,
    }
}

fn log_summary(summary: &RunSummary) {
    for site in &summary.sites {
        watch_info!(
            "{}: {} records in {} attempt(s), {:?}",
            site.site,
            site.records,
            site.attempts,
            site.outcome
        );
    }
    watch_info!(
        "Run complete: {} scraped, {} new, {} already posted, {} irrelevant, {} too old; {} sent, {} failed",
        summary.scraped,
        summary.fresh,
        summary.already_posted,
        summary.irrelevant,
        summary.too_old,
        summary.sent,
        summary.failed
    );
}
