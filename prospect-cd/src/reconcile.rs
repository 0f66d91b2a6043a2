//! Candidate reconciliation: dedup, provenance merge, ranking
//!
//! Pure and idempotent: the output depends only on the candidate multiset,
//! never on arrival order. The orchestrator imposes no ordering between
//! adapters, so determinism has to come from this step.

use crate::extract::is_valid_email_shape;
use crate::types::{Candidate, ContactResult};
use std::collections::BTreeMap;
use tracing::debug;

/// Merge raw candidates into the final deduplicated, ranked contact list
///
/// - candidates failing the strict email-shape check are dropped
/// - the merge key is the lowercased address
/// - merged confidence is the maximum across contributors; no blending, so a
///   low-confidence source can never pull down a corroborated address
/// - `sources` is the union of contributing source tags
/// - `name`/`role` come from the first contributor in canonical member order
///   (confidence desc, then source, name, role) that supplies a non-empty
///   value, which keeps the pick independent of adapter completion order
/// - `inferred` survives only when every contributor was inferred; a single
///   direct observation upgrades the record
///
/// Output ordering: confidence desc, then contributing-source count desc
/// (more corroboration ranks higher), then email asc.
pub fn reconcile(candidates: Vec<Candidate>) -> Vec<ContactResult> {
    let input_count = candidates.len();
    let mut groups: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();

    for candidate in candidates {
        if !is_valid_email_shape(&candidate.email) {
            debug!(
                email = %candidate.email,
                source = candidate.source.as_str(),
                "Dropping malformed candidate"
            );
            continue;
        }
        let key = candidate.email.to_lowercase();
        groups.entry(key).or_default().push(candidate);
    }

    let mut results: Vec<ContactResult> = groups
        .into_iter()
        .map(|(email, members)| merge_group(email, members))
        .collect();

    results.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| b.sources.len().cmp(&a.sources.len()))
            .then_with(|| a.email.cmp(&b.email))
    });

    debug!(input = input_count, output = results.len(), "Reconciliation complete");
    results
}

/// Merge all observations of one canonical address into a single record
fn merge_group(email: String, mut members: Vec<Candidate>) -> ContactResult {
    // Canonical member order; "first non-empty wins" below must not depend
    // on the order adapters happened to finish in.
    members.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.role.cmp(&b.role))
    });

    let confidence = members.iter().map(|m| m.confidence).max().unwrap_or(0);
    let sources = members.iter().map(|m| m.source).collect();
    let inferred = members.iter().all(|m| m.inferred);
    let name = members.iter().find_map(|m| non_empty(&m.name));
    let role = members.iter().find_map(|m| non_empty(&m.role));

    ContactResult {
        email,
        sources,
        confidence,
        name,
        role,
        verified: false,
        inferred,
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceId;

    #[test]
    fn test_merge_takes_max_confidence_and_unions_sources() {
        let candidates = vec![
            Candidate::new("jane@corp.com", SourceId::WebScraping, 65),
            Candidate::new("jane@corp.com", SourceId::Profile, 75),
        ];

        let results = reconcile(candidates);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].email, "jane@corp.com");
        assert_eq!(results[0].confidence, 75, "Merged confidence is the maximum, not a blend");
        assert!(results[0].sources.contains(&SourceId::Profile));
        assert!(results[0].sources.contains(&SourceId::WebScraping));
        assert_eq!(results[0].sources.len(), 2);
    }

    #[test]
    fn test_lowercase_canonicalization_merges_case_variants() {
        let candidates = vec![
            Candidate::new("Jane@Corp.com", SourceId::Profile, 75),
            Candidate::new("jane@corp.com", SourceId::Commits, 80),
        ];

        let results = reconcile(candidates);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].email, "jane@corp.com");
        assert_eq!(results[0].confidence, 80);
    }

    #[test]
    fn test_malformed_candidates_are_dropped() {
        let candidates = vec![
            Candidate::new("not-an-email", SourceId::Registration, 70),
            Candidate::new("jane@corp", SourceId::Registration, 70),
            Candidate::new("ok@corp.com", SourceId::Registration, 70),
        ];

        let results = reconcile(candidates);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].email, "ok@corp.com");
    }

    #[test]
    fn test_name_and_role_from_highest_confidence_contributor() {
        let candidates = vec![
            Candidate::new("jane@corp.com", SourceId::WebScraping, 65).with_role("Contact"),
            Candidate::new("jane@corp.com", SourceId::Profile, 75)
                .with_name("Jane Doe")
                .with_role("Developer"),
        ];

        let results = reconcile(candidates);
        assert_eq!(results[0].name.as_deref(), Some("Jane Doe"));
        assert_eq!(
            results[0].role.as_deref(),
            Some("Developer"),
            "Canonical order puts the higher-confidence contributor first"
        );
    }

    #[test]
    fn test_name_falls_through_empty_values() {
        let candidates = vec![
            Candidate::new("jane@corp.com", SourceId::Profile, 75).with_name("  "),
            Candidate::new("jane@corp.com", SourceId::WebScraping, 65).with_name("Jane"),
        ];

        let results = reconcile(candidates);
        assert_eq!(results[0].name.as_deref(), Some("Jane"), "Blank names do not win");
    }

    #[test]
    fn test_single_observation_upgrades_inferred() {
        let candidates = vec![
            Candidate::new("info@corp.com", SourceId::DomainPattern, 60).inferred(),
            Candidate::new("info@corp.com", SourceId::DnsTxt, 85),
        ];

        let results = reconcile(candidates);
        assert!(!results[0].inferred, "One direct observation clears the inferred flag");
        assert_eq!(results[0].confidence, 85);
    }

    #[test]
    fn test_all_inferred_stays_inferred() {
        let candidates = vec![
            Candidate::new("info@corp.com", SourceId::DomainPattern, 60).inferred(),
            Candidate::new("info@corp.com", SourceId::DomainPattern, 60).inferred(),
        ];

        let results = reconcile(candidates);
        assert!(results[0].inferred);
    }

    #[test]
    fn test_verified_is_always_false() {
        let results = reconcile(vec![Candidate::new("a@b.com", SourceId::DnsTxt, 85)]);
        assert!(!results[0].verified);
    }

    #[test]
    fn test_output_ordering() {
        let candidates = vec![
            Candidate::new("low@corp.com", SourceId::DomainPattern, 60).inferred(),
            Candidate::new("corroborated@corp.com", SourceId::Profile, 75),
            Candidate::new("corroborated@corp.com", SourceId::WebScraping, 65),
            Candidate::new("alone@corp.com", SourceId::Profile, 75),
            Candidate::new("top@corp.com", SourceId::DnsTxt, 85),
        ];

        let results = reconcile(candidates);
        let emails: Vec<&str> = results.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(
            emails,
            vec![
                "top@corp.com",          // highest confidence
                "corroborated@corp.com", // 75, two sources
                "alone@corp.com",        // 75, one source
                "low@corp.com",
            ]
        );
    }

    #[test]
    fn test_ties_broken_lexicographically() {
        let candidates = vec![
            Candidate::new("zeta@corp.com", SourceId::Profile, 75),
            Candidate::new("alpha@corp.com", SourceId::Profile, 75),
        ];

        let results = reconcile(candidates);
        assert_eq!(results[0].email, "alpha@corp.com");
        assert_eq!(results[1].email, "zeta@corp.com");
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let forward = vec![
            Candidate::new("jane@corp.com", SourceId::Profile, 75).with_name("Jane Doe"),
            Candidate::new("jane@corp.com", SourceId::Commits, 80).with_name("jdoe"),
            Candidate::new("info@corp.com", SourceId::DomainPattern, 60).inferred(),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(reconcile(forward), reconcile(reversed));
    }

    #[test]
    fn test_empty_input() {
        assert!(reconcile(Vec::new()).is_empty());
    }
}
