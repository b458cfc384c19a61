//! HTTP implementation of the social endpoint.
//!
//! Speaks the v1.1-style REST API: app-only OAuth2 bearer
//! authentication, `statuses/user_timeline` pagination via `max_id`,
//! and `friends/ids` / `followers/ids` with a bulk `users/lookup` pass
//! that resolves numeric account ids into the canonical screen-name
//! space before they reach the rest of the crate.
//!
//! Every request runs behind a per-endpoint-path rate-limit guard that
//! sleeps out exhausted quota windows, mirroring how the timeline
//! driver treats its own endpoint class.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};

use crate::error::{ApiFailure, AppError, Result};
use crate::models::{
    Config, CrawlerConfig, Credentials, PageCursor, Post, RateLimitSnapshot, ScreenName,
    TimelinePage,
};
use crate::services::endpoint::{FfSets, SocialEndpoint};
use crate::services::rate_limit::RateLimitState;

const TIMELINE_PATH: &str = "statuses/user_timeline.json";
const FRIENDS_PATH: &str = "friends/ids.json";
const FOLLOWERS_PATH: &str = "followers/ids.json";
const LOOKUP_PATH: &str = "users/lookup.json";

/// The lookup endpoint accepts at most 100 ids per call.
const LOOKUP_CHUNK: usize = 100;

/// Live API endpoint over HTTPS.
pub struct TwitterEndpoint {
    client: Client,
    config: Config,
    credentials: Credentials,
    bearer: String,
    guards: Mutex<HashMap<&'static str, RateLimitState>>,
}

impl TwitterEndpoint {
    /// Build a client and authenticate.
    ///
    /// Uses the pre-issued bearer token when the credentials carry one,
    /// otherwise exchanges the consumer key/secret for a token. Any
    /// failure here is a fatal setup error.
    pub async fn connect(credentials: Credentials, config: &Config) -> Result<Self> {
        let client = build_client(&config.crawler)?;
        let bearer = match credentials.bearer_token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => obtain_bearer(&client, config, &credentials).await?,
        };

        Ok(Self {
            client,
            config: config.clone(),
            credentials,
            bearer,
            guards: Mutex::new(HashMap::new()),
        })
    }

    /// Sleep out the quota window of `path` if it is exhausted.
    async fn wait_for_quota(&self, path: &'static str) {
        let wait = {
            let guards = self.guards.lock().expect("rate limit guard poisoned");
            guards.get(path).and_then(RateLimitState::wait_before_call)
        };
        if let Some(wait) = wait {
            log::info!(
                "Quota exhausted for {}; sleeping {}s until the window resets",
                path,
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Record the quota metadata a response carried for `path`.
    fn observe_quota(&self, path: &'static str, snapshot: RateLimitSnapshot) {
        let mut guards = self.guards.lock().expect("rate limit guard poisoned");
        guards.entry(path).or_default().observe(snapshot);
    }

    /// Issue one GET against `path` and return the parsed JSON body
    /// plus any quota metadata the response carried.
    async fn get_json(
        &self,
        path: &'static str,
        query: &[(&str, String)],
    ) -> Result<(serde_json::Value, Option<RateLimitSnapshot>)> {
        self.wait_for_quota(path).await;

        let url = format!("{}/{}", self.config.api.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer)
            .query(query)
            .send()
            .await
            .map_err(AppError::api_other)?;

        let snapshot = parse_rate_limit(response.headers());
        if let Some(snapshot) = snapshot {
            self.observe_quota(path, snapshot);
        }

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Api(classify_status(status, path)));
        }

        let value = response.json().await.map_err(AppError::api_other)?;
        Ok((value, snapshot))
    }

    /// Fetch one page of numeric ids from an ids endpoint.
    async fn fetch_ids(&self, path: &'static str, account: &ScreenName) -> Result<Vec<u64>> {
        let query = [("screen_name", account.as_str().to_string())];
        let (value, _) = self.get_json(path, &query).await?;

        value
            .get("ids")
            .and_then(serde_json::Value::as_array)
            .map(|ids| ids.iter().filter_map(serde_json::Value::as_u64).collect())
            .ok_or_else(|| AppError::api_other(format!("{} response missing ids array", path)))
    }

    /// Resolve numeric account ids to screen names via bulk lookup.
    ///
    /// Ids the remote no longer knows (suspended or deleted accounts)
    /// are silently dropped, matching the lookup endpoint's behavior.
    async fn resolve_ids(&self, ids: &[u64]) -> Result<Vec<ScreenName>> {
        let mut by_id: HashMap<u64, ScreenName> = HashMap::new();

        for chunk in ids.chunks(LOOKUP_CHUNK) {
            let joined = chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let query = [("user_id", joined)];
            let (value, _) = self.get_json(LOOKUP_PATH, &query).await?;

            let profiles = value.as_array().ok_or_else(|| {
                AppError::api_other("lookup response was not an array of profiles")
            })?;
            for profile in profiles {
                let id = profile.get("id").and_then(serde_json::Value::as_u64);
                let name = profile
                    .get("screen_name")
                    .and_then(serde_json::Value::as_str);
                if let (Some(id), Some(name)) = (id, name) {
                    by_id.insert(id, ScreenName::new(name));
                }
            }
        }

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }
}

#[async_trait]
impl SocialEndpoint for TwitterEndpoint {
    async fn fetch_page(
        &self,
        account: &ScreenName,
        cursor: Option<PageCursor>,
        page_size: usize,
    ) -> Result<TimelinePage> {
        let mut query = vec![
            ("screen_name", account.as_str().to_string()),
            ("count", page_size.to_string()),
        ];
        if let Some(PageCursor(max_id)) = cursor {
            query.push(("max_id", max_id.to_string()));
        }

        let (value, rate_limit) = self.get_json(TIMELINE_PATH, &query).await?;
        let posts = match value {
            serde_json::Value::Array(items) => items.into_iter().map(Post).collect::<Vec<_>>(),
            _ => return Err(AppError::api_other("timeline response was not an array")),
        };

        Ok(TimelinePage {
            next_cursor: next_cursor(&posts),
            posts,
            rate_limit,
        })
    }

    async fn fetch_ff(&self, account: &ScreenName) -> Result<FfSets> {
        let friend_ids = self.fetch_ids(FRIENDS_PATH, account).await?;
        let follower_ids = self.fetch_ids(FOLLOWERS_PATH, account).await?;

        Ok(FfSets {
            friends: self.resolve_ids(&friend_ids).await?,
            followers: self.resolve_ids(&follower_ids).await?,
        })
    }

    async fn reconnect(&mut self) -> Result<()> {
        log::info!("Re-establishing API connection");
        self.client = build_client(&self.config.crawler)?;
        self.bearer = match self.credentials.bearer_token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => obtain_bearer(&self.client, &self.config, &self.credentials).await?,
        };
        Ok(())
    }
}

/// Create a configured HTTP client.
fn build_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Exchange consumer key/secret for an app-only bearer token.
async fn obtain_bearer(
    client: &Client,
    config: &Config,
    credentials: &Credentials,
) -> Result<String> {
    let response = client
        .post(&config.api.token_url)
        .basic_auth(&credentials.consumer_key, Some(&credentials.consumer_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::config(format!(
            "token exchange failed: HTTP {}",
            status
        )));
    }

    let body: serde_json::Value = response.json().await?;
    body.get("access_token")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::config("token exchange response missing access_token"))
}

/// Sort an HTTP status into the crawler's failure taxonomy.
fn classify_status(status: StatusCode, path: &str) -> ApiFailure {
    match status.as_u16() {
        404 => ApiFailure::NotFound,
        401 | 403 => ApiFailure::Forbidden,
        429 => ApiFailure::RateLimited,
        _ => ApiFailure::Other(format!("HTTP {} from {}", status, path)),
    }
}

/// Parse quota headers, if the response carried both.
fn parse_rate_limit(headers: &HeaderMap) -> Option<RateLimitSnapshot> {
    let remaining = header_value(headers, "x-rate-limit-remaining")?.parse().ok()?;
    let reset_epoch: i64 = header_value(headers, "x-rate-limit-reset")?.parse().ok()?;
    let reset_at = chrono::DateTime::from_timestamp(reset_epoch, 0)?;
    Some(RateLimitSnapshot {
        remaining,
        reset_at,
    })
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Cursor for the page after `posts`: one below the oldest id seen.
fn next_cursor(posts: &[Post]) -> Option<PageCursor> {
    posts
        .iter()
        .filter_map(Post::id)
        .min()
        .map(|oldest| PageCursor(oldest.saturating_sub(1)))
}
