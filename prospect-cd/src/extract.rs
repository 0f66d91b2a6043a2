//! Shared email extraction and validation helpers
//!
//! Every adapter funnels text through these helpers instead of carrying its
//! own regex. Post-filters are opt-in per adapter and deliberately scoped:
//! the web-content adapter drops webmail domains, the registration adapter
//! drops privacy-proxy addresses, and no other adapter applies either filter.

use once_cell::sync::Lazy;
use regex::Regex;

/// Unanchored scan pattern for email-shaped substrings
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex")
});

/// Anchored shape check applied before an address may enter reconciliation
static EMAIL_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email shape regex")
});

/// `mailto:` anchor targets in raw HTML
static MAILTO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href\s*=\s*["']mailto:([^"']+)["']"#).expect("mailto regex")
});

/// Obfuscated `user [at] example [dot] com` spellings
static OBFUSCATED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9._%+-]+)\s*\[at\]\s*([A-Za-z0-9.-]+)\s*\[dot\]\s*([A-Za-z]{2,})")
        .expect("obfuscated email regex")
});

/// Free consumer webmail providers (web-content adapter filter)
const WEBMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "me.com",
    "live.com",
];

/// Registrar privacy-service markers (registration adapter filter)
const PRIVACY_MARKERS: &[&str] = &[
    "whoisguard",
    "domains.google",
    "registration-private",
    "redacted",
    "privacy",
];

/// All email-shaped matches in `text`, in match order
pub fn extract_emails(text: &str) -> Vec<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Targets of `mailto:` anchors, query-string suffix stripped
///
/// `mailto:jane@corp.com?subject=Hi` yields `jane@corp.com`.
pub fn extract_mailto_targets(html: &str) -> Vec<String> {
    MAILTO_RE
        .captures_iter(html)
        .map(|caps| {
            let target = &caps[1];
            match target.split_once('?') {
                Some((address, _)) => address.to_string(),
                None => target.to_string(),
            }
        })
        .collect()
}

/// De-obfuscated `[at]`/`[dot]` spellings reassembled into plain addresses
pub fn extract_obfuscated(text: &str) -> Vec<String> {
    OBFUSCATED_RE
        .captures_iter(text)
        .map(|caps| format!("{}@{}.{}", &caps[1], &caps[2], &caps[3]))
        .collect()
}

/// Strict anchored shape check
pub fn is_valid_email_shape(email: &str) -> bool {
    EMAIL_SHAPE_RE.is_match(email)
}

/// True when the address lives at a free consumer webmail provider
///
/// Exact domain match: `mail.gmail.com` is not on the list.
pub fn is_webmail_domain(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((_, domain)) => WEBMAIL_DOMAINS.contains(&domain.to_lowercase().as_str()),
        None => false,
    }
}

/// True when the address carries a registrar privacy-service marker
///
/// Substring match over the whole address: privacy services leak lookalike
/// addresses in both local parts and domains.
pub fn is_privacy_proxy(email: &str) -> bool {
    let lower = email.to_lowercase();
    PRIVACY_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// True for code-host commit-masking addresses
/// (e.g. `1234567+user@users.noreply.github.com`)
pub fn is_noreply_address(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((_, domain)) => {
            let domain = domain.to_lowercase();
            domain.contains("noreply")
                || domain.contains("no-reply")
                || domain.contains("donotreply")
        }
        None => false,
    }
}

/// Map a conventional local-part to a contact role
pub fn role_for_local_part(local_part: &str) -> &'static str {
    match local_part.to_lowercase().as_str() {
        "info" => "Information",
        "contact" => "Contact",
        "hello" => "General",
        "support" => "Support",
        "sales" => "Sales",
        "team" => "Team",
        _ => "Contact",
    }
}

/// Role for a full address, from its local-part
pub fn role_for_email(email: &str) -> &'static str {
    match email.split_once('@') {
        Some((local_part, _)) => role_for_local_part(local_part),
        None => "Contact",
    }
}

/// Derive a bare domain from a website URL
///
/// Strips the scheme and a leading `www.` label, cuts any path suffix:
/// `https://www.acme.com/about` becomes `acme.com`.
pub fn derive_domain(website: &str) -> String {
    let stripped = website.trim();
    let stripped = stripped
        .strip_prefix("https://")
        .or_else(|| stripped.strip_prefix("http://"))
        .unwrap_or(stripped);
    let stripped = stripped.strip_prefix("www.").unwrap_or(stripped);
    match stripped.split_once('/') {
        Some((host, _)) => host.to_string(),
        None => stripped.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
