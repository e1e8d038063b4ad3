//! Page readiness predicates.
//!
//! These are the pure halves of the readiness waiter: given what the page
//! reports (title, URL, whether job links exist) decide if it is ready.
//! The polling loop itself lives in the runtime crate.

use crate::error::ScoutResult;
use url::Url;

/// Lowercase title fragments shown by interstitial verification pages.
pub const CHALLENGE_TITLE_PATTERNS: &[&str] = &[
    "just a moment",
    "checking",
    "attention required",
    "verify you are human",
    "security check",
];

/// Script evaluated in the page: `true` once a job detail link is present.
pub const JOB_LINKS_PRESENT_JS: &str = r#"(() => {
    const links = Array.from(document.querySelectorAll('a[href*="/jobs/"]'));
    return links.some((a) => (a.getAttribute("href") || "").includes("/jobs/~"));
})()"#;

/// Does this title look like a challenge page?
pub fn is_challenge_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    CHALLENGE_TITLE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Is `url` on `domain` or one of its subdomains?
///
/// `domain` is a bare host such as `upwork.com`. Unparseable URLs never match.
pub fn is_on_domain(url: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_lowercase();
    if domain.is_empty() {
        return true;
    }
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    else {
        return false;
    };
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Registrable-looking host of `url` with any leading `www.` removed.
pub fn site_domain(url: &str) -> ScoutResult<String> {
    let parsed = Url::parse(url)?;
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    Ok(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// The page has cleared a challenge when its title no longer matches a
/// challenge pattern and it is on the target domain.
pub fn is_challenge_cleared(title: &str, url: &str, target_domain: &str) -> bool {
    !is_challenge_title(title) && is_on_domain(url, target_domain)
}
