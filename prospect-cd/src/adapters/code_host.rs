//! Code-host adapter (highest-confidence source)
//!
//! Searches a public code-hosting API for developer accounts linked to the
//! company, then harvests addresses from two places: the public email field
//! on matched profiles, and commit-author addresses in recent public push
//! activity. A commit address is an actively used address, so it outranks a
//! static profile field.
//!
//! # API Reference
//! - User search: `GET {base}/search/users?q=...&per_page=...`
//! - Profile: the `url` field of each search hit
//! - Activity: `GET {profile_url}/events/public`
//!
//! Anonymous access is rate-limited aggressively upstream; requests go
//! through a local limiter and profiles are processed sequentially.

use crate::extract::is_noreply_address;
use crate::types::{AdapterError, AdapterId, Candidate, CompanyQuery, SourceAdapter, SourceId};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Public code-host API base URL
const DEFAULT_API_URL: &str = "https://api.github.com";

/// Total timeout per HTTP request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// User-Agent header (required by the API)
const USER_AGENT: &str = "prospect-cd/0.1.0 (contact discovery)";

/// Accept header pinning the stable JSON media type
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

/// Code-host adapter configuration
#[derive(Debug, Clone)]
pub struct CodeHostConfig {
    /// API base URL (overridable for tests)
    pub base_url: String,
    /// API token for authenticated rate limits; anonymous when absent
    pub api_token: Option<String>,
    /// Search page size requested per query variant
    pub page_size: u32,
    /// Profiles examined per query variant
    pub max_profiles_per_query: usize,
    /// Public events scanned per profile
    pub max_events_scanned: usize,
    /// Drop commit addresses at code-host noreply masking domains
    pub exclude_noreply_commits: bool,
    /// Soft wall-clock budget; profile fetching stops once spent and the
    /// candidates accumulated so far are returned
    pub request_budget: Duration,
    /// Local request rate toward the API
    pub requests_per_second: u32,
}

impl Default for CodeHostConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            page_size: 20,
            max_profiles_per_query: 10,
            max_events_scanned: 5,
            exclude_noreply_commits: true,
            request_budget: Duration::from_secs(8),
            requests_per_second: 10,
        }
    }
}

/// Code-host adapter
///
/// Issues three search variants (`company:"X"`, `"X" in:name`, `"X" in:bio`)
/// and walks the top matches of each. Every HTTP call is independently
/// guarded: a failure on one user's detail fetch is logged and the batch
/// continues with the next user.
pub struct CodeHostAdapter {
    client: Client,
    config: CodeHostConfig,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl CodeHostAdapter {
    pub fn new(config: CodeHostConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        let per_second =
            NonZeroU32::new(config.requests_per_second.max(1)).expect("clamped to at least 1");
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Self {
            client,
            config,
            rate_limiter,
        }
    }

    /// Rate-limited authenticated GET returning decoded JSON
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AdapterError> {
        self.rate_limiter.until_ready().await;

        let mut request = self
            .client
            .get(url)
            .query(query)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, ACCEPT_JSON);
        if let Some(token) = &self.config.api_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::Network(format!("code-host request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api(format!(
                "code-host API returned {} for {}",
                status, url
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AdapterError::Parse(format!("code-host response decode failed: {}", e)))
    }

    /// Harvest one matched user: profile email field, then commit authors
    /// from recent public push events. Pushes into `out` as it goes so that
    /// a late failure keeps the earlier finds.
    async fn collect_from_user(
        &self,
        user: &UserSearchEntry,
        out: &mut Vec<Candidate>,
    ) -> Result<(), AdapterError> {
        let detail: UserDetail = self.get_json(&user.url, &[]).await?;

        if let Some(email) = detail.email.as_deref().filter(|e| !e.is_empty()) {
            let name = detail.name.clone().unwrap_or_else(|| detail.login.clone());
            out.push(
                Candidate::new(email, SourceId::Profile, SourceId::Profile.default_confidence())
                    .with_name(name)
                    .with_role("Developer")
                    .with_extra("username", user.login.clone()),
            );
        }

        let events_url = format!("{}/events/public", user.url);
        let events: Vec<PublicEvent> = self.get_json(&events_url, &[]).await?;

        for event in events.iter().take(self.config.max_events_scanned) {
            if event.kind != "PushEvent" {
                continue;
            }
            for commit in &event.payload.commits {
                let Some(author) = &commit.author else {
                    continue;
                };
                if author.email.is_empty() {
                    continue;
                }
                if self.config.exclude_noreply_commits && is_noreply_address(&author.email) {
                    debug!(email = %author.email, "Skipping noreply commit address");
                    continue;
                }
                out.push(
                    Candidate::new(
                        &author.email,
                        SourceId::Commits,
                        SourceId::Commits.default_confidence(),
                    )
                    .with_name(author.name.clone())
                    .with_role("Developer")
                    .with_extra("username", user.login.clone()),
                );
            }
        }

        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for CodeHostAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::CodeHost
    }

    async fn discover(&self, query: &CompanyQuery) -> Result<Vec<Candidate>, AdapterError> {
        let company = query.company.trim();
        let started = Instant::now();
        let mut candidates = Vec::new();

        let search_url = format!("{}/search/users", self.config.base_url);
        let per_page = self.config.page_size.to_string();
        let variants = [
            format!("company:\"{}\"", company),
            format!("\"{}\" in:name", company),
            format!("\"{}\" in:bio", company),
        ];

        for variant in &variants {
            let page: UserSearchPage = match self
                .get_json(&search_url, &[("q", variant), ("per_page", &per_page)])
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(query = variant.as_str(), error = %e, "User search failed, trying next variant");
                    continue;
                }
            };

            for user in page.items.iter().take(self.config.max_profiles_per_query) {
                if started.elapsed() > self.config.request_budget {
                    debug!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        found = candidates.len(),
                        "Request budget spent, returning partial results"
                    );
                    return Ok(candidates);
                }
                if let Err(e) = self.collect_from_user(user, &mut candidates).await {
                    warn!(user = user.login.as_str(), error = %e, "User detail fetch failed, continuing with next user");
                }
            }
        }

        debug!(count = candidates.len(), "Code-host discovery complete");
        Ok(candidates)
    }
}

// ============================================================================
// Code-host API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct UserSearchPage {
    #[serde(default)]
    items: Vec<UserSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct UserSearchEntry {
    login: String,
    /// Canonical API URL of the profile, followed as given
    url: String,
}

#[derive(Debug, Deserialize)]
struct UserDetail {
    login: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicEvent {
    #[serde(rename = "type")]
    kind: String,
    /// Payload shape varies per event type; only push payloads carry commits
    #[serde(default)]
    payload: EventPayload,
}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    commits: Vec<EventCommit>,
}

#[derive(Debug, Deserialize)]
struct EventCommit {
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

// ============================================================================
// Tests
// ============================================================================
