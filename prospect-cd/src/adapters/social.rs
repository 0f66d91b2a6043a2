//! Social-profile adapter (placeholder)
//!
//! Social networks stopped exposing contact fields over anonymous HTTP, so
//! this adapter currently contributes nothing. It stays registered so run
//! reports show the source as attempted, and so a future authenticated
//! implementation slots in without orchestrator changes.

use crate::types::{AdapterError, AdapterId, Candidate, CompanyQuery, SourceAdapter};
use async_trait::async_trait;
use tracing::debug;

/// Social-profile adapter (no-op)
pub struct SocialProfileAdapter;

impl SocialProfileAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SocialProfileAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for SocialProfileAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::SocialProfile
    }

    async fn discover(&self, query: &CompanyQuery) -> Result<Vec<Candidate>, AdapterError> {
        debug!(
            company = query.company.as_str(),
            "Social profile lookup not implemented, contributing nothing"
        );
        Ok(Vec::new())
    }
}
