//! Web-content adapter (site scraping)
//!
//! Fetches the site root plus a fixed list of conventional contact pages and
//! extracts addresses in three forms: plaintext matches, `mailto:` anchor
//! targets (tracking query suffix stripped), and `[at]`/`[dot]` obfuscated
//! spellings.
//!
//! This is the only adapter that applies the webmail filter: a personal
//! webmail address scraped off a company page is rarely a usable business
//! contact, whereas the same address observed in a commit or DNS record is
//! authoritative and kept.

use crate::extract::{
    extract_emails, extract_mailto_targets, extract_obfuscated, is_valid_email_shape,
    is_webmail_domain, role_for_email,
};
use crate::types::{AdapterError, AdapterId, Candidate, CompanyQuery, SourceAdapter, SourceId};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::debug;

/// Total timeout per page fetch
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// User-Agent header
const USER_AGENT: &str = "prospect-cd/0.1.0 (contact discovery)";

/// Conventional contact pages fetched after the site root
const DEFAULT_CONTACT_PATHS: [&str; 5] = ["/contact", "/contact-us", "/about", "/team", "/about-us"];

/// Web-content adapter configuration
#[derive(Debug, Clone)]
pub struct WebContentConfig {
    /// Sub-paths fetched in addition to the site root
    pub contact_paths: Vec<String>,
    /// Total timeout per page fetch
    pub request_timeout: Duration,
}

impl Default for WebContentConfig {
    fn default() -> Self {
        Self {
            contact_paths: DEFAULT_CONTACT_PATHS.iter().map(|s| s.to_string()).collect(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Web-content adapter
pub struct WebContentAdapter {
    client: Client,
    config: WebContentConfig,
}

impl WebContentAdapter {
    pub fn new(config: WebContentConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client, config }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, AdapterError> {
        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| AdapterError::Network(format!("page fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api(format!("page returned {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| AdapterError::Network(format!("page body unreadable: {}", e)))
    }

    /// Extract scraped candidates from one fetched page
    ///
    /// Emitted addresses are lowercased; each candidate records the page it
    /// was found on under `extra["found_on"]`.
    fn candidates_from_page(&self, page_url: &str, body: &str) -> Vec<Candidate> {
        let mut found = extract_emails(body);
        found.extend(extract_mailto_targets(body));
        found.extend(extract_obfuscated(body));

        let mut candidates = Vec::new();
        for raw in found {
            let email = raw.to_lowercase();
            if !is_valid_email_shape(&email) {
                continue;
            }
            if is_webmail_domain(&email) {
                debug!(email = email.as_str(), "Skipping personal webmail address");
                continue;
            }
            let role = role_for_email(&email);
            candidates.push(
                Candidate::new(
                    &email,
                    SourceId::WebScraping,
                    SourceId::WebScraping.default_confidence(),
                )
                .with_role(role)
                .with_extra("found_on", page_url),
            );
        }
        candidates
    }
}

#[async_trait]
impl SourceAdapter for WebContentAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::WebContent
    }

    async fn discover(&self, query: &CompanyQuery) -> Result<Vec<Candidate>, AdapterError> {
        let Some(website) = query.effective_website() else {
            debug!("No website available, skipping scrape");
            return Ok(Vec::new());
        };

        let base = website.trim_end_matches('/');
        let mut pages = vec![website.clone()];
        pages.extend(
            self.config
                .contact_paths
                .iter()
                .map(|path| format!("{}{}", base, path)),
        );

        let mut candidates = Vec::new();
        for page_url in &pages {
            let body = match self.fetch_page(page_url).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(page = page_url.as_str(), error = %e, "Page fetch failed, continuing");
                    continue;
                }
            };
            candidates.extend(self.candidates_from_page(page_url, &body));
        }

        debug!(
            website = website.as_str(),
            count = candidates.len(),
            "Web scrape complete"
        );
        Ok(candidates)
    }
}

// ============================================================================
// Tests
// ============================================================================
