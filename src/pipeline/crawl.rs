// src/pipeline/crawl.rs

//! Timeline crawling pipeline.
//!
//! Glues the run together: seed loading, output directory, endpoint
//! connection, the optional expansion phase, roster persistence, the
//! batch crawl itself, and the summary log. Failures here (before the
//! batch starts) are fatal; failures inside the batch are handled
//! per-account by the crawler.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, Credentials, ScreenName};
use crate::services::{
    CrawlReport, FfExpander, SocialEndpoint, TimelineCrawler, TwitterEndpoint, unique_roster,
};
use crate::storage::{BrokenRegistry, LocalStore, TimelineStore};
use crate::utils::read_seed_file;

/// Options for one crawl run, resolved from the CLI.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Seed file, one account handle per line
    pub seeds_file: PathBuf,

    /// Directory receiving timelines, roster and ledgers
    pub output_dir: PathBuf,

    /// Friend/follower expansion depth (0 = crawl seeds only)
    pub depth: u32,

    /// Gzip saved timelines
    pub compressed: bool,
}

/// Build the crawl roster from the seeds.
///
/// With depth 0 the expander is not invoked at all - no FF calls are
/// spent - and the roster is the deduplicated seed list. Otherwise the
/// expansion runs with a scan set scoped to this call, pre-seeded with
/// the broken ledgers so a broken account is never submitted to the
/// endpoint, not even for its connections.
pub async fn build_roster<E: SocialEndpoint>(
    endpoint: &E,
    seeds: &[ScreenName],
    depth: u32,
    broken: &BrokenRegistry,
) -> Result<Vec<ScreenName>> {
    if depth == 0 {
        return Ok(unique_roster(seeds));
    }

    let mut scanned: HashSet<ScreenName> = broken.accounts().cloned().collect();
    let preseeded = scanned.len();

    let expander = FfExpander::new(endpoint);
    let roster = expander.expand(seeds, depth, &mut scanned).await?;
    log::info!(
        "Expanded {} seeds into {} accounts ({} expanded)",
        seeds.len(),
        roster.len(),
        scanned.len() - preseeded
    );
    Ok(roster)
}

/// Run the full crawl pipeline.
pub async fn run_crawl(
    config: &Config,
    credentials: Credentials,
    opts: &CrawlOptions,
) -> Result<CrawlReport> {
    let start_time = Utc::now();

    let seeds = read_seed_file(&opts.seeds_file)?;
    if seeds.is_empty() {
        return Err(AppError::validation(format!(
            "seed file {} contains no accounts",
            opts.seeds_file.display()
        )));
    }
    log::info!(
        "Loaded {} seed accounts from {}",
        seeds.len(),
        opts.seeds_file.display()
    );

    tokio::fs::create_dir_all(&opts.output_dir)
        .await
        .map_err(|e| {
            AppError::config(format!(
                "cannot create output directory {}: {}",
                opts.output_dir.display(),
                e
            ))
        })?;
    log::info!("Writing output to {}", opts.output_dir.display());

    let mut endpoint = TwitterEndpoint::connect(credentials, config).await?;
    let store = LocalStore::new(&opts.output_dir);

    let mut broken = BrokenRegistry::load(&store).await?;
    if broken.total() > 0 {
        log::info!(
            "Loaded {} accounts from the broken ledgers; they will be skipped",
            broken.total()
        );
    }

    let roster = build_roster(&endpoint, &seeds, opts.depth, &broken).await?;
    store.save_roster(&roster).await?;
    log::info!("Crawling {} accounts", roster.len());

    let mut crawler = TimelineCrawler::new(
        &mut endpoint,
        &store,
        &mut broken,
        config.crawler.page_size,
        opts.compressed,
    );
    let report = crawler.run(&roster).await?;

    let elapsed = Utc::now() - start_time;
    log::info!(
        "Crawl complete in {}s: {} saved, {} already saved, {} skipped broken, \
         {} newly not found, {} newly forbidden, {} deferred",
        elapsed.num_seconds(),
        report.saved,
        report.skipped_existing,
        report.skipped_broken,
        report.broken_not_found,
        report.broken_forbidden,
        report.deferred
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::models::{PageCursor, TimelinePage};
    use crate::services::FfSets;

    /// Endpoint that counts FF calls and returns no connections.
    #[derive(Default)]
    struct CountingEndpoint {
        ff_calls: AtomicUsize,
    }

    #[async_trait]
    impl SocialEndpoint for CountingEndpoint {
        async fn fetch_page(
            &self,
            _account: &ScreenName,
            _cursor: Option<PageCursor>,
            _page_size: usize,
        ) -> crate::error::Result<TimelinePage> {
            unreachable!("roster tests never fetch timelines");
        }

        async fn fetch_ff(&self, _account: &ScreenName) -> crate::error::Result<FfSets> {
            self.ff_calls.fetch_add(1, Ordering::SeqCst);
            Ok(FfSets::default())
        }

        async fn reconnect(&mut self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn names(raw: &[&str]) -> Vec<ScreenName> {
        raw.iter().map(ScreenName::new).collect()
    }

    #[tokio::test]
    async fn test_depth_zero_spends_no_ff_calls() {
        let endpoint = CountingEndpoint::default();
        let broken = BrokenRegistry::default();

        let roster = build_roster(&endpoint, &names(&["a", "b", "a"]), 0, &broken)
            .await
            .unwrap();

        assert_eq!(roster, names(&["a", "b"]));
        assert_eq!(endpoint.ff_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_depth_one_expands_each_seed() {
        let endpoint = CountingEndpoint::default();
        let broken = BrokenRegistry::default();

        let roster = build_roster(&endpoint, &names(&["a", "b"]), 1, &broken)
            .await
            .unwrap();

        assert_eq!(roster, names(&["a", "b"]));
        assert_eq!(endpoint.ff_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_broken_seed_is_not_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store
            .append_broken(crate::storage::BrokenKind::NotFound, &ScreenName::new("gone"))
            .await
            .unwrap();
        let broken = BrokenRegistry::load(&store).await.unwrap();

        let endpoint = CountingEndpoint::default();
        let roster = build_roster(&endpoint, &names(&["gone", "live"]), 1, &broken)
            .await
            .unwrap();

        // The broken seed stays in the roster (the crawler skips it
        // there) but costs no FF call.
        assert_eq!(roster, names(&["gone", "live"]));
        assert_eq!(endpoint.ff_calls.load(Ordering::SeqCst), 1);
    }
}
