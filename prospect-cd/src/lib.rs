//! # Prospect Contact Discovery
//!
//! Multi-source contact discovery and reconciliation engine. Given a company
//! identifier (name, domain, and/or website URL) the engine queries several
//! independent external sources concurrently, extracts candidate business
//! email addresses with provenance, and reconciles them into a single
//! deduplicated, confidence-ranked contact list.
//!
//! # Architecture
//! - **Source adapters** (`adapters`): one per external source, isolated from
//!   each other, each producing raw [`types::Candidate`] records
//! - **Orchestrator** (`aggregator`): fan-out/fan-in over all adapters with
//!   per-adapter timeouts and an optional whole-run deadline
//! - **Reconciler** (`reconcile`): pure dedup/merge/rank step producing the
//!   final [`types::ContactResult`] list
//!
//! Callers own persistence and deliverability verification; this crate only
//! discovers and reconciles.
//!
//! # Example
//! ```rust,ignore
//! use prospect_cd::aggregator::{DiscoveryConfig, EmailAggregator};
//! use prospect_cd::types::CompanyQuery;
//!
//! async fn find_contacts() -> prospect_cd::DiscoveryResult<()> {
//!     let aggregator = EmailAggregator::new(DiscoveryConfig::default());
//!     let query = CompanyQuery::new("Acme Corp").with_domain("acme.com");
//!     let report = aggregator.aggregate(&query).await?;
//!     for contact in &report.results {
//!         println!("{} ({}%)", contact.email, contact.confidence);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod aggregator;
pub mod error;
pub mod extract;
pub mod reconcile;
pub mod types;

pub use crate::error::{DiscoveryError, DiscoveryResult};
