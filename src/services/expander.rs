//! Breadth-first friend/follower expansion.
//!
//! Grows the crawl roster from seed accounts by walking the social
//! graph a bounded number of rounds. The scan set is owned by the
//! caller so separate runs (and tests) never share state.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::ScreenName;
use crate::services::endpoint::SocialEndpoint;

/// Deduplicate a list of accounts, preserving first-seen order.
pub fn unique_roster(accounts: &[ScreenName]) -> Vec<ScreenName> {
    let mut seen = HashSet::new();
    accounts
        .iter()
        .filter(|account| seen.insert((*account).clone()))
        .cloned()
        .collect()
}

/// Depth-bounded expander over one endpoint.
pub struct FfExpander<'a, E> {
    endpoint: &'a E,
}

impl<'a, E: SocialEndpoint> FfExpander<'a, E> {
    pub fn new(endpoint: &'a E) -> Self {
        Self { endpoint }
    }

    /// Expand `seeds` through `depth` rounds of FF discovery.
    ///
    /// Each round fetches connections for every frontier account not
    /// yet in `scanned`, marks it scanned, and appends the discoveries
    /// to the frontier. Accounts already expanded stay in the frontier
    /// (their timelines are still crawled) but are never re-expanded,
    /// so cycles in the graph cannot loop. Returns the deduplicated
    /// union of everything that entered the frontier, in first-seen
    /// order.
    ///
    /// A failure fetching one account's connections is logged and
    /// contributes nothing; it never aborts the expansion.
    pub async fn expand(
        &self,
        seeds: &[ScreenName],
        depth: u32,
        scanned: &mut HashSet<ScreenName>,
    ) -> Result<Vec<ScreenName>> {
        let mut frontier = unique_roster(seeds);

        for round in 1..=depth {
            let mut discovered = Vec::new();

            for account in &frontier {
                if scanned.contains(account) {
                    continue;
                }
                scanned.insert(account.clone());

                log::info!("Fetching friends and followers of {}", account);
                match self.endpoint.fetch_ff(account).await {
                    Ok(ff) => discovered.extend(ff.into_connections()),
                    Err(e) => {
                        log::warn!("Skipping connections of {}: {}", account, e);
                    }
                }
            }

            log::info!(
                "Expansion round {}/{}: {} connections discovered",
                round,
                depth,
                discovered.len()
            );

            let mut seen: HashSet<ScreenName> = frontier.iter().cloned().collect();
            for account in discovered {
                if seen.insert(account.clone()) {
                    frontier.push(account);
                }
            }
        }

        Ok(frontier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::Result;
    use crate::models::{PageCursor, TimelinePage};
    use crate::services::endpoint::FfSets;

    /// Endpoint backed by a fixed adjacency map, counting FF calls.
    struct GraphEndpoint {
        graph: HashMap<ScreenName, Vec<ScreenName>>,
        ff_calls: Mutex<Vec<ScreenName>>,
    }

    impl GraphEndpoint {
        fn new(edges: &[(&str, &[&str])]) -> Self {
            let graph = edges
                .iter()
                .map(|(name, connections)| {
                    (
                        ScreenName::new(name),
                        connections.iter().map(ScreenName::new).collect(),
                    )
                })
                .collect();
            Self {
                graph,
                ff_calls: Mutex::new(Vec::new()),
            }
        }

        fn calls_for(&self, name: &str) -> usize {
            let target = ScreenName::new(name);
            self.ff_calls
                .lock()
                .unwrap()
                .iter()
                .filter(|called| **called == target)
                .count()
        }

        fn total_calls(&self) -> usize {
            self.ff_calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SocialEndpoint for GraphEndpoint {
        async fn fetch_page(
            &self,
            _account: &ScreenName,
            _cursor: Option<PageCursor>,
            _page_size: usize,
        ) -> Result<TimelinePage> {
            unreachable!("expander tests never fetch timelines");
        }

        async fn fetch_ff(&self, account: &ScreenName) -> Result<FfSets> {
            self.ff_calls.lock().unwrap().push(account.clone());
            Ok(FfSets {
                friends: self.graph.get(account).cloned().unwrap_or_default(),
                followers: Vec::new(),
            })
        }

        async fn reconnect(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn names(raw: &[&str]) -> Vec<ScreenName> {
        raw.iter().map(ScreenName::new).collect()
    }

    #[tokio::test]
    async fn test_depth_zero_returns_seeds_unchanged() {
        let endpoint = GraphEndpoint::new(&[("a", &["b"])]);
        let expander = FfExpander::new(&endpoint);
        let mut scanned = HashSet::new();

        let roster = expander
            .expand(&names(&["a", "b", "a"]), 0, &mut scanned)
            .await
            .unwrap();

        assert_eq!(roster, names(&["a", "b"]));
        assert_eq!(endpoint.total_calls(), 0);
        assert!(scanned.is_empty());
    }

    #[tokio::test]
    async fn test_shared_discovery_is_not_expanded_past_depth() {
        // A and B both point at C; depth 1 must include C without
        // expanding it, and expand A and B exactly once each.
        let endpoint = GraphEndpoint::new(&[("a", &["c"]), ("b", &["c"]), ("c", &["d"])]);
        let expander = FfExpander::new(&endpoint);
        let mut scanned = HashSet::new();

        let roster = expander
            .expand(&names(&["a", "b"]), 1, &mut scanned)
            .await
            .unwrap();

        assert_eq!(roster, names(&["a", "b", "c"]));
        assert_eq!(endpoint.calls_for("a"), 1);
        assert_eq!(endpoint.calls_for("b"), 1);
        assert_eq!(endpoint.calls_for("c"), 0);
    }

    #[tokio::test]
    async fn test_mutual_follow_cycle_terminates() {
        let endpoint = GraphEndpoint::new(&[("a", &["b"]), ("b", &["a"])]);
        let expander = FfExpander::new(&endpoint);
        let mut scanned = HashSet::new();

        let roster = expander
            .expand(&names(&["a"]), 2, &mut scanned)
            .await
            .unwrap();

        assert_eq!(roster, names(&["a", "b"]));
        assert_eq!(endpoint.calls_for("a"), 1);
        assert_eq!(endpoint.calls_for("b"), 1);
    }

    #[tokio::test]
    async fn test_scan_set_carries_across_calls() {
        let endpoint = GraphEndpoint::new(&[("a", &["b"]), ("b", &[])]);
        let expander = FfExpander::new(&endpoint);
        let mut scanned = HashSet::new();

        expander
            .expand(&names(&["a"]), 1, &mut scanned)
            .await
            .unwrap();
        expander
            .expand(&names(&["a"]), 1, &mut scanned)
            .await
            .unwrap();

        // Second expansion sees "a" already scanned and does no work.
        assert_eq!(endpoint.calls_for("a"), 1);
    }

    #[tokio::test]
    async fn test_failed_account_contributes_nothing() {
        struct FailingEndpoint;

        #[async_trait]
        impl SocialEndpoint for FailingEndpoint {
            async fn fetch_page(
                &self,
                _account: &ScreenName,
                _cursor: Option<PageCursor>,
                _page_size: usize,
            ) -> Result<TimelinePage> {
                unreachable!();
            }

            async fn fetch_ff(&self, _account: &ScreenName) -> Result<FfSets> {
                Err(crate::error::AppError::Api(
                    crate::error::ApiFailure::Forbidden,
                ))
            }

            async fn reconnect(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let expander = FfExpander::new(&FailingEndpoint);
        let mut scanned = HashSet::new();

        let roster = expander
            .expand(&names(&["locked"]), 1, &mut scanned)
            .await
            .unwrap();

        assert_eq!(roster, names(&["locked"]));
        assert!(scanned.contains(&ScreenName::new("locked")));
    }
}
