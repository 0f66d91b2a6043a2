//! Domain-intelligence adapter (DNS TXT + MX)
//!
//! Two independent lookups against the public DNS:
//! - **TXT records** occasionally carry real mailboxes (SPF forwarding
//!   addresses, verification strings, DMARC `mailto:` targets). Anything
//!   that looks like an email in a TXT record is a strong signal.
//! - **MX records** reveal mail infrastructure. A company running its own
//!   mail (no hosted-mail provider in any exchange host) very likely has the
//!   conventional mailboxes; those are emitted as low-confidence inferred
//!   guesses.
//!
//! Lookup failures (NXDOMAIN, timeouts) are treated as absence: each lookup
//! contributes nothing on error and never fails the adapter.

use crate::extract::{extract_emails, role_for_email, role_for_local_part};
use crate::types::{AdapterError, AdapterId, Candidate, CompanyQuery, SourceAdapter, SourceId};
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tracing::{debug, warn};

/// Exchange-host substrings that indicate hosted mail rather than
/// company-run infrastructure
const HOSTED_MAIL_MARKERS: [&str; 3] = ["google", "outlook", "microsoft"];

/// Conventional mailbox local-parts guessed for custom mail infrastructure
const INFERRED_LOCAL_PARTS: [&str; 6] = ["info", "contact", "hello", "support", "sales", "team"];

/// Domain-intelligence adapter configuration
#[derive(Debug, Clone)]
pub struct DomainIntelConfig {
    /// Substrings marking an MX exchange as a hosted-mail provider
    pub hosted_mail_markers: Vec<String>,
    /// Local-parts emitted as inferred guesses for custom mail setups
    pub inferred_local_parts: Vec<String>,
}

impl Default for DomainIntelConfig {
    fn default() -> Self {
        Self {
            hosted_mail_markers: HOSTED_MAIL_MARKERS.iter().map(|s| s.to_string()).collect(),
            inferred_local_parts: INFERRED_LOCAL_PARTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Domain-intelligence adapter
pub struct DomainIntelAdapter {
    resolver: TokioAsyncResolver,
    config: DomainIntelConfig,
}

/// Resolver over the host's DNS configuration, with the library defaults
/// when no system configuration is readable
fn system_resolver() -> TokioAsyncResolver {
    match TokioAsyncResolver::tokio_from_system_conf() {
        Ok(resolver) => resolver,
        Err(e) => {
            warn!(error = %e, "System resolver config unavailable, using library defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        }
    }
}

impl DomainIntelAdapter {
    pub fn new(config: DomainIntelConfig) -> Self {
        Self {
            resolver: system_resolver(),
            config,
        }
    }

    /// Candidates from TXT record text (confidence 85, directly observed)
    fn candidates_from_txt(&self, records: &[String]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for record in records {
            for email in extract_emails(record) {
                let role = role_for_email(&email);
                candidates.push(
                    Candidate::new(&email, SourceId::DnsTxt, SourceId::DnsTxt.default_confidence())
                        .with_role(role),
                );
            }
        }
        candidates
    }

    /// Inferred conventional mailboxes when the MX set shows custom mail
    /// infrastructure (confidence 60, `inferred` flag set)
    ///
    /// Hosted-mail setups (workspace providers) are skipped: a mailbox guess
    /// against a hosted provider says nothing about which mailboxes exist.
    /// An empty exchange list yields no guesses.
    fn infer_from_mx(&self, domain: &str, exchanges: &[String]) -> Vec<Candidate> {
        let custom_infrastructure = exchanges.iter().any(|exchange| {
            let host = exchange.to_lowercase();
            self.config
                .hosted_mail_markers
                .iter()
                .all(|marker| !host.contains(marker.as_str()))
        });
        if !custom_infrastructure {
            return Vec::new();
        }

        self.config
            .inferred_local_parts
            .iter()
            .map(|local_part| {
                let role = role_for_local_part(local_part);
                Candidate::new(
                    format!("{}@{}", local_part, domain),
                    SourceId::DomainPattern,
                    SourceId::DomainPattern.default_confidence(),
                )
                .with_role(role)
                .inferred()
            })
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for DomainIntelAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::DomainIntel
    }

    async fn discover(&self, query: &CompanyQuery) -> Result<Vec<Candidate>, AdapterError> {
        let Some(domain) = query.effective_domain() else {
            debug!("No domain available, skipping DNS lookups");
            return Ok(Vec::new());
        };

        let mut candidates = Vec::new();

        match self.resolver.txt_lookup(domain.clone()).await {
            Ok(lookup) => {
                let records: Vec<String> = lookup.iter().map(|txt| txt.to_string()).collect();
                candidates.extend(self.candidates_from_txt(&records));
            }
            Err(e) => {
                debug!(domain = domain.as_str(), error = %e, "TXT lookup yielded nothing");
            }
        }

        match self.resolver.mx_lookup(domain.clone()).await {
            Ok(lookup) => {
                let exchanges: Vec<String> =
                    lookup.iter().map(|mx| mx.exchange().to_string()).collect();
                candidates.extend(self.infer_from_mx(&domain, &exchanges));
            }
            Err(e) => {
                debug!(domain = domain.as_str(), error = %e, "MX lookup yielded nothing");
            }
        }

        debug!(
            domain = domain.as_str(),
            count = candidates.len(),
            "Domain intelligence complete"
        );
        Ok(candidates)
    }
}

// ============================================================================
// Tests
// ============================================================================
