//! Batch timeline crawler with per-account fault isolation.
//!
//! Drives the pagination driver across the whole roster. No single
//! account can abort the batch: terminal failures are recorded in the
//! broken-account ledgers, quota exhaustion gets one reconnect-and-
//! retry, and anything unexplained is deferred to a future run.

use crate::error::{ApiFailure, Result};
use crate::models::ScreenName;
use crate::services::endpoint::SocialEndpoint;
use crate::services::timeline::TimelineFetcher;
use crate::storage::{BrokenKind, BrokenRegistry, TimelineStore};

/// Summary of one crawl run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Timelines fetched and saved this run
    pub saved: usize,

    /// Accounts skipped because a saved timeline already existed
    pub skipped_existing: usize,

    /// Accounts skipped because a ledger already recorded them broken
    pub skipped_broken: usize,

    /// Accounts newly recorded as not found
    pub broken_not_found: usize,

    /// Accounts newly recorded as forbidden
    pub broken_forbidden: usize,

    /// Accounts left for a future run after an unexplained failure
    pub deferred: usize,
}

/// How one account's crawl attempt ended.
enum Outcome {
    Saved(usize),
    Broken(BrokenKind),
    Deferred,
}

/// Crawls timelines for a roster of accounts, one at a time.
pub struct TimelineCrawler<'a, E, S> {
    endpoint: &'a mut E,
    store: &'a S,
    broken: &'a mut BrokenRegistry,
    fetcher: TimelineFetcher,
    compressed: bool,
}

impl<'a, E, S> TimelineCrawler<'a, E, S>
where
    E: SocialEndpoint,
    S: TimelineStore,
{
    pub fn new(
        endpoint: &'a mut E,
        store: &'a S,
        broken: &'a mut BrokenRegistry,
        page_size: usize,
        compressed: bool,
    ) -> Self {
        Self {
            endpoint,
            store,
            broken,
            fetcher: TimelineFetcher::new(page_size),
            compressed,
        }
    }

    /// Crawl every account in `roster`.
    ///
    /// Always reaches the end of the roster; the only errors that
    /// propagate are storage and reconnect failures, which mean the
    /// run as a whole cannot make progress.
    pub async fn run(&mut self, roster: &[ScreenName]) -> Result<CrawlReport> {
        let mut report = CrawlReport::default();

        for account in roster {
            if let Some(kind) = self.broken.classification(account) {
                log::info!("Skipping {}: previously recorded as {}", account, kind);
                report.skipped_broken += 1;
                continue;
            }

            if self.store.exists(account).await {
                log::info!(
                    "Timeline for {} already saved - will not download again",
                    account
                );
                report.skipped_existing += 1;
                continue;
            }

            match self.crawl_account(account).await? {
                Outcome::Saved(count) => {
                    log::info!("Saved {} posts for {}", count, account);
                    report.saved += 1;
                }
                Outcome::Broken(kind) => {
                    self.broken.record(self.store, kind, account).await?;
                    match kind {
                        BrokenKind::NotFound => report.broken_not_found += 1,
                        BrokenKind::Forbidden => report.broken_forbidden += 1,
                    }
                }
                Outcome::Deferred => report.deferred += 1,
            }
        }

        Ok(report)
    }

    /// One account: fetch, save, classify.
    ///
    /// A rate-limit failure that got past the driver's own wait means
    /// the advertised quota lied (another consumer on the same
    /// credentials, or a stricter server-side limit); re-establish the
    /// connection and retry the same account exactly once.
    async fn crawl_account(&mut self, account: &ScreenName) -> Result<Outcome> {
        let first = self.fetch_and_save(account).await;
        match first {
            Err(err) if err.api_failure() == Some(&ApiFailure::RateLimited) => {
                log::warn!(
                    "Quota exhausted mid-crawl for {}; reconnecting for one retry",
                    account
                );
                self.endpoint.reconnect().await?;
                let retry = self.fetch_and_save(account).await;
                resolve(account, retry)
            }
            other => resolve(account, other),
        }
    }

    async fn fetch_and_save(&mut self, account: &ScreenName) -> Result<usize> {
        log::info!("Retrieving timeline for {}", account);
        let posts = self.fetcher.fetch_all(&*self.endpoint, account).await?;
        self.store
            .save_timeline(account, &posts, self.compressed)
            .await?;
        Ok(posts.len())
    }
}

/// Map one attempt's result onto the account's outcome.
fn resolve(account: &ScreenName, result: Result<usize>) -> Result<Outcome> {
    match result {
        Ok(count) => Ok(Outcome::Saved(count)),
        Err(err) => match err.api_failure() {
            Some(ApiFailure::NotFound) => {
                log::warn!(
                    "{} appears to no longer exist - recording as broken",
                    account
                );
                Ok(Outcome::Broken(BrokenKind::NotFound))
            }
            Some(ApiFailure::Forbidden) => {
                log::warn!(
                    "{} is no longer publicly accessible - recording as broken",
                    account
                );
                Ok(Outcome::Broken(BrokenKind::Forbidden))
            }
            Some(failure) => {
                log::warn!("Deferring {} to a future run: {}", account, failure);
                Ok(Outcome::Deferred)
            }
            // Storage and connection errors are not per-account
            // failures; let them stop the run.
            None => Err(err),
        },
    }
}
