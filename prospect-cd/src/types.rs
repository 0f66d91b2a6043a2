//! Core types and trait definitions for prospect-cd
//!
//! Defines the contracts between the three layers of the engine:
//! - **Source adapters** produce [`Candidate`] records
//! - **Orchestrator** fans out over adapters and collects per-adapter slots
//! - **Reconciler** merges candidates into [`ContactResult`] records

use crate::error::DiscoveryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Query
// ============================================================================

/// Normalized company query shared read-only by every adapter
///
/// `company` must be non-empty for a run to start. `domain` and `website`
/// may both be absent, in which case domain/website-dependent adapters
/// contribute nothing (skipped, not failed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyQuery {
    /// Company name used for identity searches
    pub company: String,
    /// Bare domain, e.g. `acme.com`
    pub domain: Option<String>,
    /// Website URL, with or without scheme
    pub website: Option<String>,
}

impl CompanyQuery {
    /// Create a query for a company name
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            domain: None,
            website: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Domain to use for DNS/registration lookups
    ///
    /// Prefers the explicit `domain`; falls back to a domain derived from
    /// `website` (scheme, leading `www.`, and path stripped).
    pub fn effective_domain(&self) -> Option<String> {
        if let Some(domain) = self.domain.as_deref() {
            let trimmed = domain.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        self.website
            .as_deref()
            .map(crate::extract::derive_domain)
            .filter(|d| !d.is_empty())
    }

    /// Website URL to scrape, normalized with an `https://` scheme
    pub fn effective_website(&self) -> Option<String> {
        let raw = self.website.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("http") {
            Some(raw.to_string())
        } else {
            Some(format!("https://{}", raw))
        }
    }

    /// The only run-level validation: a company identity must exist
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.company.trim().is_empty() {
            return Err(DiscoveryError::InvalidQuery(
                "company name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Provenance
// ============================================================================

/// Provenance tag carried by every candidate
///
/// Identifies the kind of observation, not just the adapter: the code-host
/// adapter alone produces two distinct tags (`profile` vs `commits`) with
/// different confidence weights.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Public profile email field on a code host
    Profile,
    /// Commit-author address from public push activity
    Commits,
    /// Address found in a DNS TXT record
    DnsTxt,
    /// Conventional mailbox inferred from custom MX infrastructure
    DomainPattern,
    /// Address from a registration-record lookup
    Registration,
    /// Address scraped from the company website
    WebScraping,
    /// Address from a social profile
    Social,
}

impl SourceId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Commits => "commits",
            Self::DnsTxt => "dns_txt",
            Self::DomainPattern => "domain_pattern",
            Self::Registration => "registration",
            Self::WebScraping => "web_scraping",
            Self::Social => "social",
        }
    }

    /// Default confidence for candidates from this source (0-100)
    ///
    /// A commit-author address outranks a static profile field because it is
    /// an actively used address; inferred conventional mailboxes rank lowest
    /// because they are guesses, not observations.
    pub fn default_confidence(self) -> u8 {
        match self {
            Self::Profile => 75,
            Self::Commits => 80,
            Self::DnsTxt => 85,
            Self::DomainPattern => 60,
            Self::Registration => 70,
            Self::WebScraping => 65,
            Self::Social => 0, // stub adapter, emits nothing yet
        }
    }
}

/// Identity of a registered source adapter, used in run reports
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AdapterId {
    CodeHost,
    DomainIntel,
    Registration,
    WebContent,
    SocialProfile,
}

impl AdapterId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CodeHost => "code_host",
            Self::DomainIntel => "domain_intel",
            Self::Registration => "registration",
            Self::WebContent => "web_content",
            Self::SocialProfile => "social_profile",
        }
    }
}

// ============================================================================
// Candidate
// ============================================================================

/// A single unverified email observation produced by one adapter
///
/// Ephemeral: owned by the producing adapter until handed to the
/// orchestrator. One adapter may emit the same email several times; the
/// reconciler resolves duplicates downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Observed address, as found (not yet canonicalized)
    pub email: String,
    /// Provenance of the observation
    pub source: SourceId,
    /// Person or mailbox name, when the source supplies one
    pub name: Option<String>,
    /// Role hint ("Developer", "Administrative", local-part heuristics)
    pub role: Option<String>,
    /// Confidence score (0-100)
    pub confidence: u8,
    /// True for pattern guesses that were never directly observed
    pub inferred: bool,
    /// Bounded source-specific metadata ("username", "found_on")
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Candidate {
    /// Create a candidate with confidence clamped to 0-100
    pub fn new(email: impl Into<String>, source: SourceId, confidence: u8) -> Self {
        Self {
            email: email.into(),
            source,
            name: None,
            role: None,
            confidence: confidence.min(100),
            inferred: false,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Mark this candidate as a pattern guess
    pub fn inferred(mut self) -> Self {
        self.inferred = true;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Reconciled output
// ============================================================================

/// The reconciled, deduplicated record for one email address
///
/// Invariants: `email` is lowercase and unique across the output list;
/// `sources` is the union of every source tag that produced the address;
/// `confidence` is the maximum observed across contributors (no blending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResult {
    /// Canonical (lowercase) address, the merge key
    pub email: String,
    /// Every source that contributed this address
    pub sources: BTreeSet<SourceId>,
    /// Maximum confidence across contributors (0-100)
    pub confidence: u8,
    pub name: Option<String>,
    pub role: Option<String>,
    /// Deliverability verification is a downstream concern; always false here
    pub verified: bool,
    /// True only while every contributor was a pattern guess
    pub inferred: bool,
}

/// Whole-run summary returned by a single `aggregate` call
///
/// Created fresh per invocation and discarded by the engine once returned;
/// persistence belongs to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Run identity for log correlation
    pub run_id: Uuid,
    /// The query this report answers
    pub query: CompanyQuery,
    /// Ranked, deduplicated contacts
    pub results: Vec<ContactResult>,
    /// Every adapter the run dispatched, in registration order
    pub sources_attempted: Vec<AdapterId>,
    /// Adapters that returned at least one candidate (not merely "didn't fail")
    pub sources_succeeded: Vec<AdapterId>,
    /// Raw candidate count per adapter, before reconciliation; adapters
    /// abandoned at the global deadline are absent
    pub per_source_count: BTreeMap<AdapterId, usize>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Source adapter trait
// ============================================================================

/// A single external data source
///
/// Adapters are isolated from one another: a slow or broken source must
/// never prevent results from its siblings. The orchestrator wraps every
/// call in a timeout and converts errors into an empty contribution, so
/// returning `Err` is always safe; adapters should still recover internally
/// where partial results are possible.
///
/// # Example
/// ```rust,ignore
/// use prospect_cd::types::{AdapterError, AdapterId, Candidate, CompanyQuery, SourceAdapter};
///
/// pub struct NewsletterAdapter;
///
/// #[async_trait::async_trait]
/// impl SourceAdapter for NewsletterAdapter {
///     fn id(&self) -> AdapterId { AdapterId::WebContent }
///
///     async fn discover(&self, query: &CompanyQuery) -> Result<Vec<Candidate>, AdapterError> {
///         let Some(website) = query.effective_website() else {
///             return Ok(Vec::new());
///         };
///         // fetch, extract, return candidates
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Adapter identity for report bookkeeping
    fn id(&self) -> AdapterId;

    /// Discover candidate contacts for the query
    ///
    /// # Errors
    /// Returns `AdapterError` when the source is entirely unavailable; the
    /// orchestrator treats this the same as zero candidates.
    async fn discover(&self, query: &CompanyQuery) -> Result<Vec<Candidate>, AdapterError>;
}

/// Adapter-local error
#[derive(Debug, Error)]
pub enum AdapterError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// External API error (non-success status)
    #[error("API error: {0}")]
    Api(String),

    /// Failed to parse a response body
    #[error("Parse error: {0}")]
    Parse(String),

    /// DNS resolution error
    #[error("DNS error: {0}")]
    Dns(String),

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// Tests
// ============================================================================
