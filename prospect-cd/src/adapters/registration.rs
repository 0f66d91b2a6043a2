//! Registration-record adapter (WHOIS-style lookup)
//!
//! Queries public registration-record services over HTTP and regex-scans the
//! raw response body for email-shaped substrings. Services differ in response
//! shape (JSON vs text), so no schema is parsed; the raw body is scanned as
//! text either way.
//!
//! Services are tried in order; the first one that answers wins and the rest
//! are skipped. Addresses leaked by registration privacy proxies are
//! discarded, since those are lookalike relay addresses, not real company
//! contacts.

use crate::extract::{extract_emails, is_privacy_proxy};
use crate::types::{AdapterError, AdapterId, Candidate, CompanyQuery, SourceAdapter, SourceId};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, warn};

/// Total timeout per lookup request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// User-Agent header
const USER_AGENT: &str = "prospect-cd/0.1.0 (contact discovery)";

/// Default lookup services, tried in order; `{domain}` is substituted
const DEFAULT_SERVICE_URLS: [&str; 2] = [
    "https://www.whoisfreaks.com/api/whois?domain={domain}",
    "https://whois.freeaiapi.xyz/?domain={domain}",
];

/// Registration-record adapter configuration
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Ordered fallback list of service URL templates with a `{domain}`
    /// placeholder
    pub service_urls: Vec<String>,
    /// Total timeout per lookup request
    pub request_timeout: Duration,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            service_urls: DEFAULT_SERVICE_URLS.iter().map(|s| s.to_string()).collect(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Registration-record adapter
pub struct RegistrationAdapter {
    client: Client,
    config: RegistrationConfig,
}

impl RegistrationAdapter {
    pub fn new(config: RegistrationConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client, config }
    }

    /// Scan a raw response body for registration contacts
    ///
    /// Privacy-proxy addresses are dropped here rather than downstream: they
    /// pass shape validation and would otherwise merge into ranked output.
    fn candidates_from_body(&self, body: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for email in extract_emails(body) {
            if is_privacy_proxy(&email) {
                debug!(email = email.as_str(), "Skipping privacy-proxy address");
                continue;
            }
            candidates.push(
                Candidate::new(
                    &email,
                    SourceId::Registration,
                    SourceId::Registration.default_confidence(),
                )
                .with_role("Administrative"),
            );
        }
        candidates
    }
}

#[async_trait]
impl SourceAdapter for RegistrationAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Registration
    }

    async fn discover(&self, query: &CompanyQuery) -> Result<Vec<Candidate>, AdapterError> {
        let Some(domain) = query.effective_domain() else {
            debug!("No domain available, skipping registration lookup");
            return Ok(Vec::new());
        };

        for template in &self.config.service_urls {
            let url = template.replace("{domain}", &domain);

            let response = match self
                .client
                .get(&url)
                .header(header::USER_AGENT, USER_AGENT)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Registration service unreachable, trying next");
                    continue;
                }
            };

            if !response.status().is_success() {
                warn!(
                    status = response.status().as_u16(),
                    "Registration service returned error status, trying next"
                );
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "Registration response body unreadable, trying next");
                    continue;
                }
            };

            // First service that answers wins, even when the body holds no
            // addresses; later services would only repeat the same record
            let candidates = self.candidates_from_body(&body);
            debug!(
                domain = domain.as_str(),
                count = candidates.len(),
                "Registration lookup complete"
            );
            return Ok(candidates);
        }

        debug!(domain = domain.as_str(), "All registration services failed");
        Ok(Vec::new())
    }
}

// ============================================================================
// Tests
// ============================================================================
