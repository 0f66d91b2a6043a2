//! Aggregation orchestrator
//!
//! Runs every registered adapter concurrently against one query and merges
//! the outcomes. The central guarantee is failure isolation: an adapter that
//! errors, times out, or returns garbage contributes an empty slot, and the
//! run carries on with whatever the other adapters produced. A run never
//! fails for adapter-side reasons; the only fatal condition is an invalid
//! query.
//!
//! Fan-in uses own-slot accumulation: each adapter future resolves to its
//! `(AdapterId, Vec<Candidate>)` slot and a single collection loop
//! concatenates the slots, so no shared mutable state exists between
//! adapters.

use crate::adapters;
use crate::error::DiscoveryResult;
use crate::reconcile::reconcile;
use crate::types::{AdapterId, AggregationReport, Candidate, CompanyQuery, SourceAdapter};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use prospect_common::config::{resolve_code_host_token, TomlConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-adapter wall-clock budget
const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Whole-run wall-clock budget
const DEFAULT_GLOBAL_DEADLINE: Duration = Duration::from_secs(30);

/// Discovery engine configuration
///
/// Everything is an explicit field with a default; nothing is read from
/// global state. [`DiscoveryConfig::from_toml`] layers file and environment
/// overrides on top of the defaults.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Budget for each adapter; on expiry the adapter's in-flight work is
    /// abandoned and its slot is empty
    pub adapter_timeout: Duration,
    /// Optional budget for the whole run; adapters still pending at the
    /// deadline contribute nothing, finished ones keep their contribution.
    /// `None` means the run is bounded only by the per-adapter timeout.
    pub global_deadline: Option<Duration>,
    pub code_host: adapters::CodeHostConfig,
    pub domain_intel: adapters::DomainIntelConfig,
    pub registration: adapters::RegistrationConfig,
    pub web_content: adapters::WebContentConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
            global_deadline: Some(DEFAULT_GLOBAL_DEADLINE),
            code_host: adapters::CodeHostConfig::default(),
            domain_intel: adapters::DomainIntelConfig::default(),
            registration: adapters::RegistrationConfig::default(),
            web_content: adapters::WebContentConfig::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Apply file and environment overrides to the defaults
    ///
    /// The code-host token resolves environment-first (see
    /// [`resolve_code_host_token`]). A `global_deadline_secs` of zero
    /// disables the whole-run deadline.
    pub fn from_toml(toml: &TomlConfig) -> Self {
        let mut config = Self::default();
        if let Some(secs) = toml.adapter_timeout_secs {
            config.adapter_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = toml.global_deadline_secs {
            config.global_deadline = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }
        config.code_host.api_token = resolve_code_host_token(toml);
        config
    }
}

/// Multi-source contact discovery engine
///
/// Holds a fixed adapter set for its lifetime; each [`aggregate`] call is an
/// independent run producing a fresh [`AggregationReport`].
///
/// [`aggregate`]: EmailAggregator::aggregate
pub struct EmailAggregator {
    config: DiscoveryConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl EmailAggregator {
    /// Engine with the full default adapter set
    pub fn new(config: DiscoveryConfig) -> Self {
        let adapters = adapters::default_adapters(&config);
        Self { config, adapters }
    }

    /// Engine with an explicit adapter set (dependency injection for tests
    /// and for callers composing their own sources)
    pub fn with_adapters(config: DiscoveryConfig, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { config, adapters }
    }

    /// Run one discovery pass over every registered adapter
    ///
    /// Adapters run concurrently; each is bounded by the per-adapter timeout
    /// and the run as a whole by the optional global deadline. Adapter
    /// failures and timeouts become empty contributions, so this returns
    /// `Err` only for an invalid query.
    pub async fn aggregate(&self, query: &CompanyQuery) -> DiscoveryResult<AggregationReport> {
        query.validate()?;

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(
            run_id = %run_id,
            company = query.company.as_str(),
            domain = query.effective_domain().as_deref().unwrap_or("-"),
            adapters = self.adapters.len(),
            "Starting discovery run"
        );

        let sources_attempted: Vec<AdapterId> = self.adapters.iter().map(|a| a.id()).collect();

        let mut tasks = FuturesUnordered::new();
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let query = query.clone();
            let adapter_timeout = self.config.adapter_timeout;
            tasks.push(async move {
                let id = adapter.id();
                match tokio::time::timeout(adapter_timeout, adapter.discover(&query)).await {
                    Ok(Ok(candidates)) => {
                        debug!(
                            adapter = id.as_str(),
                            count = candidates.len(),
                            "Adapter finished"
                        );
                        (id, candidates)
                    }
                    Ok(Err(e)) => {
                        warn!(adapter = id.as_str(), error = %e, "Adapter failed, contributing nothing");
                        (id, Vec::new())
                    }
                    Err(_) => {
                        warn!(
                            adapter = id.as_str(),
                            timeout_ms = adapter_timeout.as_millis() as u64,
                            "Adapter timed out, contributing nothing"
                        );
                        (id, Vec::new())
                    }
                }
            });
        }

        let slots = self.collect_slots(&mut tasks).await;

        let mut per_source_count = BTreeMap::new();
        let mut all_candidates = Vec::new();
        for (id, candidates) in slots {
            per_source_count.insert(id, candidates.len());
            all_candidates.extend(candidates);
        }

        // Succeeded means "contributed at least one candidate", reported in
        // registration order regardless of completion order
        let sources_succeeded: Vec<AdapterId> = sources_attempted
            .iter()
            .copied()
            .filter(|id| per_source_count.get(id).map_or(false, |count| *count > 0))
            .collect();

        let results = reconcile(all_candidates);

        info!(
            run_id = %run_id,
            contacts = results.len(),
            sources_succeeded = sources_succeeded.len(),
            sources_attempted = sources_attempted.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Discovery run complete"
        );

        Ok(AggregationReport {
            run_id,
            query: query.clone(),
            results,
            sources_attempted,
            sources_succeeded,
            per_source_count,
            timestamp: Utc::now(),
        })
    }

    /// Drain adapter slots as they complete, stopping early at the global
    /// deadline; dropping the task set cancels whatever is still in flight
    async fn collect_slots(
        &self,
        tasks: &mut FuturesUnordered<impl std::future::Future<Output = (AdapterId, Vec<Candidate>)>>,
    ) -> Vec<(AdapterId, Vec<Candidate>)> {
        let mut slots = Vec::new();

        match self.config.global_deadline {
            Some(budget) => {
                let deadline = tokio::time::sleep(budget);
                tokio::pin!(deadline);
                loop {
                    tokio::select! {
                        maybe_slot = tasks.next() => match maybe_slot {
                            Some(slot) => slots.push(slot),
                            None => break,
                        },
                        _ = &mut deadline => {
                            warn!(
                                pending = tasks.len(),
                                deadline_ms = budget.as_millis() as u64,
                                "Global deadline reached, abandoning pending adapters"
                            );
                            break;
                        }
                    }
                }
            }
            None => {
                while let Some(slot) = tasks.next().await {
                    slots.push(slot);
                }
            }
        }

        slots
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockAdapter;
    use crate::types::{Candidate, SourceId};
    use serial_test::serial;
    use std::io::Write;

    fn candidate(email: &str, source: SourceId, confidence: u8) -> Candidate {
        Candidate::new(email, source, confidence)
    }

    fn fast_config() -> DiscoveryConfig {
        DiscoveryConfig {
            adapter_timeout: Duration::from_millis(200),
            global_deadline: Some(Duration::from_secs(5)),
            ..DiscoveryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_company_fails_fast() {
        let aggregator = EmailAggregator::with_adapters(fast_config(), vec![]);
        let result = aggregator.aggregate(&CompanyQuery::new("   ")).await;
        assert!(result.is_err(), "Blank company must fail before any adapter runs");
    }

    #[tokio::test]
    async fn test_one_failing_adapter_does_not_poison_the_run() {
        let aggregator = EmailAggregator::with_adapters(
            fast_config(),
            vec![
                Arc::new(MockAdapter::failing(AdapterId::CodeHost)),
                Arc::new(MockAdapter::new(
                    AdapterId::WebContent,
                    vec![candidate("team@acme.com", SourceId::WebScraping, 65)],
                )),
            ],
        );

        let report = aggregator.aggregate(&CompanyQuery::new("Acme")).await.unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].email, "team@acme.com");
        assert_eq!(
            report.sources_attempted,
            vec![AdapterId::CodeHost, AdapterId::WebContent]
        );
        assert_eq!(report.sources_succeeded, vec![AdapterId::WebContent]);
        assert_eq!(report.per_source_count.get(&AdapterId::CodeHost), Some(&0));
    }

    #[tokio::test]
    async fn test_slow_adapter_times_out_without_blocking_others() {
        let aggregator = EmailAggregator::with_adapters(
            fast_config(),
            vec![
                Arc::new(MockAdapter::delayed(
                    AdapterId::Registration,
                    vec![candidate("admin@acme.com", SourceId::Registration, 70)],
                    Duration::from_secs(30),
                )),
                Arc::new(MockAdapter::new(
                    AdapterId::DomainIntel,
                    vec![candidate("info@acme.com", SourceId::DnsTxt, 85)],
                )),
            ],
        );

        let started = Instant::now();
        let report = aggregator.aggregate(&CompanyQuery::new("Acme")).await.unwrap();

        assert!(
            started.elapsed() < Duration::from_secs(5),
            "Run must not wait out the slow adapter, took {:?}",
            started.elapsed()
        );
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].email, "info@acme.com");
        assert_eq!(report.sources_succeeded, vec![AdapterId::DomainIntel]);
        // The timed-out adapter still completed its slot (as empty)
        assert_eq!(report.per_source_count.get(&AdapterId::Registration), Some(&0));
    }

    #[tokio::test]
    async fn test_empty_contribution_is_attempted_but_not_succeeded() {
        let aggregator = EmailAggregator::with_adapters(
            fast_config(),
            vec![Arc::new(MockAdapter::new(AdapterId::SocialProfile, vec![]))],
        );

        let report = aggregator.aggregate(&CompanyQuery::new("Acme")).await.unwrap();

        assert_eq!(report.sources_attempted, vec![AdapterId::SocialProfile]);
        assert!(report.sources_succeeded.is_empty());
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn test_candidates_merge_across_adapters() {
        let aggregator = EmailAggregator::with_adapters(
            fast_config(),
            vec![
                Arc::new(MockAdapter::new(
                    AdapterId::CodeHost,
                    vec![candidate("Jane@Acme.com", SourceId::Commits, 80)],
                )),
                Arc::new(MockAdapter::new(
                    AdapterId::WebContent,
                    vec![candidate("jane@acme.com", SourceId::WebScraping, 65)],
                )),
            ],
        );

        let report = aggregator.aggregate(&CompanyQuery::new("Acme")).await.unwrap();

        assert_eq!(report.results.len(), 1, "Same address must merge across adapters");
        let contact = &report.results[0];
        assert_eq!(contact.email, "jane@acme.com");
        assert_eq!(contact.confidence, 80);
        assert!(contact.sources.contains(&SourceId::Commits));
        assert!(contact.sources.contains(&SourceId::WebScraping));
    }

    #[tokio::test]
    async fn test_global_deadline_keeps_finished_contributions() {
        let config = DiscoveryConfig {
            adapter_timeout: Duration::from_secs(30),
            global_deadline: Some(Duration::from_millis(200)),
            ..DiscoveryConfig::default()
        };
        let aggregator = EmailAggregator::with_adapters(
            config,
            vec![
                Arc::new(MockAdapter::new(
                    AdapterId::DomainIntel,
                    vec![candidate("info@acme.com", SourceId::DnsTxt, 85)],
                )),
                Arc::new(MockAdapter::delayed(
                    AdapterId::CodeHost,
                    vec![candidate("late@acme.com", SourceId::Profile, 75)],
                    Duration::from_secs(30),
                )),
            ],
        );

        let started = Instant::now();
        let report = aggregator.aggregate(&CompanyQuery::new("Acme")).await.unwrap();

        assert!(
            started.elapsed() < Duration::from_secs(5),
            "Deadline must cut the run short, took {:?}",
            started.elapsed()
        );
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].email, "info@acme.com");
        // Abandoned adapter never completed a slot, so it has no count entry
        assert!(!report.per_source_count.contains_key(&AdapterId::CodeHost));
        assert!(report.sources_attempted.contains(&AdapterId::CodeHost));
    }

    #[tokio::test]
    async fn test_every_adapter_stalled_yields_empty_report_at_deadline() {
        let config = DiscoveryConfig {
            adapter_timeout: Duration::from_secs(30),
            global_deadline: Some(Duration::from_millis(200)),
            ..DiscoveryConfig::default()
        };
        let aggregator = EmailAggregator::with_adapters(
            config,
            vec![
                Arc::new(MockAdapter::delayed(
                    AdapterId::CodeHost,
                    vec![candidate("late@acme.com", SourceId::Profile, 75)],
                    Duration::from_secs(30),
                )),
                Arc::new(MockAdapter::delayed(
                    AdapterId::DomainIntel,
                    vec![candidate("later@acme.com", SourceId::DnsTxt, 85)],
                    Duration::from_secs(30),
                )),
            ],
        );

        let started = Instant::now();
        let report = aggregator.aggregate(&CompanyQuery::new("Acme")).await.unwrap();

        assert!(
            started.elapsed() < Duration::from_secs(5),
            "Stalled adapters must not hold the run open, took {:?}",
            started.elapsed()
        );
        assert!(report.results.is_empty());
        assert!(report.sources_succeeded.is_empty());
        assert!(report.per_source_count.is_empty());
        assert_eq!(report.sources_attempted.len(), 2);
    }

    #[tokio::test]
    async fn test_succeeded_order_follows_registration_not_completion() {
        let aggregator = EmailAggregator::with_adapters(
            fast_config(),
            vec![
                Arc::new(MockAdapter::delayed(
                    AdapterId::CodeHost,
                    vec![candidate("dev@acme.com", SourceId::Profile, 75)],
                    Duration::from_millis(100),
                )),
                Arc::new(MockAdapter::new(
                    AdapterId::WebContent,
                    vec![candidate("team@acme.com", SourceId::WebScraping, 65)],
                )),
            ],
        );

        let report = aggregator.aggregate(&CompanyQuery::new("Acme")).await.unwrap();

        // WebContent finishes first but CodeHost was registered first
        assert_eq!(
            report.sources_succeeded,
            vec![AdapterId::CodeHost, AdapterId::WebContent]
        );
    }

    #[tokio::test]
    async fn test_all_adapters_failing_still_returns_a_report() {
        let aggregator = EmailAggregator::with_adapters(
            fast_config(),
            vec![
                Arc::new(MockAdapter::failing(AdapterId::CodeHost)),
                Arc::new(MockAdapter::failing(AdapterId::WebContent)),
            ],
        );

        let report = aggregator.aggregate(&CompanyQuery::new("Acme")).await.unwrap();

        assert!(report.results.is_empty());
        assert!(report.sources_succeeded.is_empty());
        assert_eq!(report.sources_attempted.len(), 2);
    }

    #[test]
    fn test_config_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.adapter_timeout, Duration::from_secs(10));
        assert_eq!(config.global_deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    #[serial]
    fn test_config_from_toml_overrides() {
        std::env::remove_var(prospect_common::config::CODE_HOST_TOKEN_ENV);

        let toml = TomlConfig {
            adapter_timeout_secs: Some(3),
            global_deadline_secs: Some(0),
            code_host_token: Some("file-token".to_string()),
            ..TomlConfig::default()
        };
        let config = DiscoveryConfig::from_toml(&toml);

        assert_eq!(config.adapter_timeout, Duration::from_secs(3));
        assert_eq!(config.global_deadline, None, "Zero disables the deadline");
        assert_eq!(config.code_host.api_token.as_deref(), Some("file-token"));
    }

    #[test]
    #[serial]
    fn test_config_from_toml_file() {
        std::env::remove_var(prospect_common::config::CODE_HOST_TOKEN_ENV);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "code_host_token = \"file-token\"\nadapter_timeout_secs = 4\nglobal_deadline_secs = 12"
        )
        .unwrap();

        let toml = prospect_common::config::load_toml_config(file.path()).unwrap();
        let config = DiscoveryConfig::from_toml(&toml);

        assert_eq!(config.adapter_timeout, Duration::from_secs(4));
        assert_eq!(config.global_deadline, Some(Duration::from_secs(12)));
        assert_eq!(config.code_host.api_token.as_deref(), Some("file-token"));
    }
}
