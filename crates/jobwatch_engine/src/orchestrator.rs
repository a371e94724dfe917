//! Drives one site through the scrape state machine.
use std::collections::VecDeque;

use jobwatch_core::{
    update, FailureKind, Phase, RecordSet, RetryPolicy, SiteConfig, SiteEffect, SiteEvent,
    SiteRun,
};
use jobwatch_logging::{watch_critical, watch_debug, watch_error, watch_info, watch_warn};

use crate::browser::{BrowserSession, DriverErrorKind, Navigation};
use crate::pagination::{enhance_dates, paginate};
use crate::types::{ScrapeError, SiteOutcome, SiteReport};

/// Scrapes sites one at a time on a borrowed session.
///
/// Each site gets its own attempt budget. Failures never escape a site:
/// the report says whether it completed and carries whatever records were
/// collected.
#[derive(Debug, Clone, Copy)]
pub struct SiteScraper {
    policy: RetryPolicy,
}

impl Default for SiteScraper {
    fn default() -> Self {
        Self::new(RetryPolicy::site())
    }
}

impl SiteScraper {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn scrape_site(&self, session: &mut BrowserSession, site: &SiteConfig) -> SiteReport {
        watch_info!("Visiting {} ({}) to scrape job postings.", site.name, site.url);
        let mut records = RecordSet::new();
        let mut run = SiteRun::new(self.policy.max_attempts);
        let mut queue: VecDeque<SiteEffect> = VecDeque::new();

        let (next, effects) = update(run, SiteEvent::Started);
        run = next;
        queue.extend(effects);

        while let Some(effect) = queue.pop_front() {
            let event = match effect {
                SiteEffect::Navigate => Some(self.navigate(session, site, &run)),
                SiteEffect::RestartSession => {
                    if let Err(err) = session.restart() {
                        watch_error!("Could not start a fresh browser session: {}", err);
                    }
                    None
                }
                SiteEffect::WaitForCards => Some(self.wait_for_cards(session, site)),
                SiteEffect::Paginate => Some(match paginate(session, site, &mut records) {
                    Ok(()) => SiteEvent::Extracted,
                    Err(err) => {
                        watch_error!("Scraping {} failed: {}", site.name, err);
                        SiteEvent::Failed(err.kind())
                    }
                }),
                SiteEffect::BackOff => {
                    let failed_attempt = run.attempt().saturating_sub(1).max(1);
                    let delay = self
                        .policy
                        .backoff
                        .delay_after(failed_attempt, &mut rand::thread_rng());
                    watch_info!(
                        "Retrying {} (attempt {}/{}) in {:.1}s",
                        site.name,
                        run.attempt(),
                        run.max_attempts(),
                        delay.as_secs_f64()
                    );
                    session.pacer().pause(delay);
                    None
                }
                SiteEffect::Finish => {
                    watch_debug!("Finished {} on attempt {}", site.name, run.attempt());
                    None
                }
                SiteEffect::Abandon => {
                    watch_critical!(
                        "Giving up on {} after {} attempts (last failure: {}); keeping {} records",
                        site.name,
                        run.attempt(),
                        describe(run.last_failure()),
                        records.len()
                    );
                    None
                }
            };
            if let Some(event) = event {
                let (next, effects) = update(run, event);
                run = next;
                queue.extend(effects);
            }
        }

        let enhanced_dates = enhance_dates(session, site, &mut records);
        let outcome = if run.phase() == Phase::Success {
            SiteOutcome::Completed
        } else {
            SiteOutcome::Abandoned
        };
        watch_info!("Finished scraping {} jobs from {}.", records.len(), site.name);

        SiteReport {
            site: site.name.clone(),
            records: records.into_vec(),
            attempts: run.attempt(),
            outcome,
            last_failure: run.last_failure(),
            enhanced_dates,
        }
    }

    fn navigate(&self, session: &mut BrowserSession, site: &SiteConfig, run: &SiteRun) -> SiteEvent {
        watch_debug!(
            "Loading {} (attempt {}/{})",
            site.name,
            run.attempt(),
            run.max_attempts()
        );
        match session.navigate(&site.url) {
            Ok(Navigation::Clear) => SiteEvent::Navigated,
            Ok(Navigation::Blocked) => {
                watch_warn!("Blocking detected on {}, restarting browser session", site.name);
                SiteEvent::Blocked
            }
            Err(err) => {
                let err = ScrapeError::from(err);
                watch_error!("Could not load {} ({}): {}", site.name, site.url, err);
                SiteEvent::Failed(err.kind())
            }
        }
    }

    fn wait_for_cards(&self, session: &mut BrowserSession, site: &SiteConfig) -> SiteEvent {
        let timeout = session.settings().card_wait_timeout;
        match session.wait_for_element(&site.job_card_selector, timeout) {
            Ok(()) => {
                watch_debug!("Job cards present on {}", site.name);
                SiteEvent::CardsPresent
            }
            Err(err) if err.kind == DriverErrorKind::Timeout => {
                watch_error!(
                    "Timeout while loading or finding elements on {} ({}). Page might not have loaded correctly or selectors are invalid after {} seconds.",
                    site.name,
                    site.url,
                    timeout.as_secs()
                );
                SiteEvent::Failed(FailureKind::Timeout)
            }
            Err(err) => {
                watch_error!("Browser error while waiting for cards on {}: {}", site.name, err);
                SiteEvent::Failed(ScrapeError::from(err).kind())
            }
        }
    }
}

fn describe(failure: Option<FailureKind>) -> String {
    failure.map_or_else(|| "unknown".to_string(), |kind| kind.to_string())
}
