//! Rate-limited timeline pagination driver.
//!
//! Drains every available page of one account's timeline, oldest page
//! last, respecting the endpoint's advertised quota. The driver owns
//! the timeline-class [`RateLimitState`] for the whole run: the quota
//! window belongs to the credential, not to any one account.

use crate::error::Result;
use crate::models::{PageCursor, Post, ScreenName};
use crate::services::endpoint::SocialEndpoint;
use crate::services::rate_limit::RateLimitState;

/// Pagination driver for one timeline endpoint class.
pub struct TimelineFetcher {
    page_size: usize,
    limits: RateLimitState,
}

impl TimelineFetcher {
    /// Create a driver requesting `page_size` records per call.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            limits: RateLimitState::new(),
        }
    }

    /// Fetch the complete available timeline for `account`.
    ///
    /// Returns every page from the most recent down to the oldest the
    /// remote will serve, concatenated newest-first. Call failures
    /// propagate immediately; retry policy belongs to the caller.
    pub async fn fetch_all<E: SocialEndpoint>(
        &mut self,
        endpoint: &E,
        account: &ScreenName,
    ) -> Result<Vec<Post>> {
        self.fetch_from(endpoint, account, None).await
    }

    /// Fetch all pages starting at `cursor` (`None` = newest).
    pub async fn fetch_from<E: SocialEndpoint>(
        &mut self,
        endpoint: &E,
        account: &ScreenName,
        mut cursor: Option<PageCursor>,
    ) -> Result<Vec<Post>> {
        let mut timeline = Vec::new();

        loop {
            if let Some(wait) = self.limits.wait_before_call() {
                log::info!(
                    "Timeline quota exhausted; sleeping {}s until the window resets",
                    wait.as_secs()
                );
                tokio::time::sleep(wait).await;
            }

            let page = endpoint.fetch_page(account, cursor, self.page_size).await?;
            if let Some(snapshot) = page.rate_limit {
                self.limits.observe(snapshot);
            }

            let fetched = page.posts.len();
            timeline.extend(page.posts);
            log::debug!("Fetched {} posts for {} ({} total)", fetched, account, timeline.len());

            // A short page or a missing cursor means the timeline is drained.
            cursor = match page.next_cursor {
                Some(next) if fetched >= self.page_size => Some(next),
                _ => break,
            };
        }

        Ok(timeline)
    }
}
