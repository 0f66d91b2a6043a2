//! Source adapters
//!
//! One module per external source. Every adapter implements the
//! [`SourceAdapter`](crate::types::SourceAdapter) trait and is isolated from
//! its siblings: a slow or broken source yields an empty contribution, never
//! a failed run.
//!
//! # Adapters
//! 1. **code_host** - public developer profiles + commit authorship (highest confidence)
//! 2. **domain_intel** - DNS TXT inspection + MX-based mailbox inference
//! 3. **registration** - WHOIS-style registration-record lookup
//! 4. **web_content** - homepage + conventional contact-page scraping
//! 5. **social** - social profiles (stub, extension point)

pub mod code_host;
pub mod domain_intel;
pub mod registration;
pub mod social;
pub mod web_content;

pub use code_host::{CodeHostAdapter, CodeHostConfig};
pub use domain_intel::{DomainIntelAdapter, DomainIntelConfig};
pub use registration::{RegistrationAdapter, RegistrationConfig};
pub use social::SocialProfileAdapter;
pub use web_content::{WebContentAdapter, WebContentConfig};

use crate::aggregator::DiscoveryConfig;
use crate::types::SourceAdapter;
use std::sync::Arc;

/// Build the full default adapter set from configuration
///
/// Registration order is the order adapters appear in run reports.
pub fn default_adapters(config: &DiscoveryConfig) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(CodeHostAdapter::new(config.code_host.clone())),
        Arc::new(DomainIntelAdapter::new(config.domain_intel.clone())),
        Arc::new(RegistrationAdapter::new(config.registration.clone())),
        Arc::new(WebContentAdapter::new(config.web_content.clone())),
        Arc::new(SocialProfileAdapter::new()),
    ]
}

// ============================================================================
// Mock adapter for testing
// ============================================================================
