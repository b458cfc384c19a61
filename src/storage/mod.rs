//! Storage abstractions for timeline persistence.
//!
//! A [`TimelineStore`] holds one crawl run's durable output: a JSON
//! (optionally gzipped) timeline file per account, the roster of
//! accounts the run intends to crawl, and two append-only ledgers of
//! accounts that terminally failed. The ledgers are what make re-runs
//! cheap: once an account is recorded broken it is never submitted to
//! the endpoint again until an operator clears the file by hand.

pub mod local;

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Post, ScreenName};

// Re-export for convenience
pub use local::LocalStore;

/// Which terminal classification a broken-account ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokenKind {
    /// The account no longer exists
    NotFound,

    /// The account is no longer publicly accessible
    Forbidden,
}

impl fmt::Display for BrokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokenKind::NotFound => write!(f, "not found"),
            BrokenKind::Forbidden => write!(f, "forbidden"),
        }
    }
}

/// Trait for timeline storage backends.
#[async_trait]
pub trait TimelineStore: Send + Sync {
    /// Whether a saved timeline already exists for `account`.
    async fn exists(&self, account: &ScreenName) -> bool;

    /// Persist a complete timeline for `account`.
    async fn save_timeline(
        &self,
        account: &ScreenName,
        posts: &[Post],
        compressed: bool,
    ) -> Result<()>;

    /// Append `account` to the ledger for `kind`.
    async fn append_broken(&self, kind: BrokenKind, account: &ScreenName) -> Result<()>;

    /// Load the full ledger for `kind`. Missing ledger means empty.
    async fn load_broken(&self, kind: BrokenKind) -> Result<HashSet<ScreenName>>;

    /// Persist the final crawl roster.
    async fn save_roster(&self, accounts: &[ScreenName]) -> Result<()>;
}

/// In-memory view of the broken-account ledgers.
///
/// Loaded once at startup, consulted before every crawl attempt, and
/// flushed append-only through the store the moment an account is
/// classified.
#[derive(Debug, Default)]
pub struct BrokenRegistry {
    not_found: HashSet<ScreenName>,
    forbidden: HashSet<ScreenName>,
}

impl BrokenRegistry {
    /// Load both ledgers from the store.
    pub async fn load<S: TimelineStore>(store: &S) -> Result<Self> {
        Ok(Self {
            not_found: store.load_broken(BrokenKind::NotFound).await?,
            forbidden: store.load_broken(BrokenKind::Forbidden).await?,
        })
    }

    /// The recorded classification of `account`, if any.
    pub fn classification(&self, account: &ScreenName) -> Option<BrokenKind> {
        if self.not_found.contains(account) {
            Some(BrokenKind::NotFound)
        } else if self.forbidden.contains(account) {
            Some(BrokenKind::Forbidden)
        } else {
            None
        }
    }

    /// Record `account` as permanently broken, appending to the ledger.
    ///
    /// Recording the same account twice is a no-op; the ledger line is
    /// written only once.
    pub async fn record<S: TimelineStore>(
        &mut self,
        store: &S,
        kind: BrokenKind,
        account: &ScreenName,
    ) -> Result<()> {
        let set = match kind {
            BrokenKind::NotFound => &mut self.not_found,
            BrokenKind::Forbidden => &mut self.forbidden,
        };
        if set.insert(account.clone()) {
            store.append_broken(kind, account).await?;
        }
        Ok(())
    }

    /// Every account recorded in either ledger.
    pub fn accounts(&self) -> impl Iterator<Item = &ScreenName> {
        self.not_found.iter().chain(self.forbidden.iter())
    }

    /// Total accounts recorded across both ledgers.
    pub fn total(&self) -> usize {
        self.not_found.len() + self.forbidden.len()
    }
}
