//! Remote endpoint abstraction.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PageCursor, ScreenName, TimelinePage};

/// Friend and follower handles for one account.
#[derive(Debug, Clone, Default)]
pub struct FfSets {
    /// Accounts this account follows
    pub friends: Vec<ScreenName>,

    /// Accounts following this account
    pub followers: Vec<ScreenName>,
}

impl FfSets {
    /// All connections as one list, friends first.
    pub fn into_connections(self) -> Vec<ScreenName> {
        let mut connections = self.friends;
        connections.extend(self.followers);
        connections
    }
}

/// One remote social API, reduced to the calls the crawler needs.
///
/// Every call failure surfaces as [`crate::error::AppError::Api`]
/// carrying the classification the crawler dispatches on.
#[async_trait]
pub trait SocialEndpoint {
    /// Fetch one timeline page for `account`.
    ///
    /// `cursor` is `None` for the newest page. At most `page_size`
    /// records are returned; a shorter page means the timeline is
    /// exhausted.
    async fn fetch_page(
        &self,
        account: &ScreenName,
        cursor: Option<PageCursor>,
        page_size: usize,
    ) -> Result<TimelinePage>;

    /// Fetch the friend and follower handles of `account`.
    async fn fetch_ff(&self, account: &ScreenName) -> Result<FfSets>;

    /// Tear down and re-establish the connection.
    ///
    /// Used after a rate-limit failure that got past the pre-call wait;
    /// the HTTP implementation rebuilds its client and token.
    async fn reconnect(&mut self) -> Result<()>;
}
