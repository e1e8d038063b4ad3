//! Listing classifiers: budget type, experience level, posting age, and
//! client information.
//!
//! Each classifier takes the text of a dedicated element when the markup has
//! one (`labelled`) and otherwise scans the short text fragments of the
//! listing container. Nothing here fails; a missing value becomes a sentinel.

use crate::types::{NOT_SPECIFIED, UNKNOWN};
use std::fmt;

/// Classify the budget: `Hourly: $30.00 - $60.00`, `Fixed-price: $500`, or
/// [`NOT_SPECIFIED`].
pub fn budget(labelled: Option<&str>, fragments: &[String]) -> String {
    let candidates = labelled.into_iter().chain(fragments.iter().map(String::as_str));
    // Wrappers precede their children in document order, so the shortest
    // matching fragment is the innermost label.
    let kind = labelled.filter(|l| budget_kind(l).is_some()).or_else(|| {
        fragments
            .iter()
            .map(String::as_str)
            .filter(|f| budget_kind(f).is_some())
            .min_by_key(|f| f.len())
    });
    let Some(kind) = kind else {
        return NOT_SPECIFIED.to_string();
    };

    if kind.contains('$') {
        return kind.to_string();
    }

    // Fixed-price tiles show the amount in a separate "Est. budget" element.
    let amount = candidates
        .filter(|f| *f != kind && f.contains('$'))
        .find_map(dollar_amount);
    match (budget_kind(kind), amount) {
        (Some(label), Some(amount)) => format!("{label}: {amount}"),
        (Some(label), None) => label.to_string(),
        (None, _) => NOT_SPECIFIED.to_string(),
    }
}

fn budget_kind(fragment: &str) -> Option<&'static str> {
    let lower = fragment.to_lowercase();
    if lower.contains("hourly") {
        Some("Hourly")
    } else if lower.contains("fixed-price") || lower.contains("fixed price") {
        Some("Fixed-price")
    } else {
        None
    }
}

/// The text from the first `$` to the end of the fragment.
fn dollar_amount(fragment: &str) -> Option<String> {
    let start = fragment.find('$')?;
    let amount = fragment[start..].trim();
    (!amount.is_empty()).then(|| amount.to_string())
}

/// Classify the experience level as `Entry Level`, `Intermediate`, `Expert`,
/// or [`NOT_SPECIFIED`].
pub fn experience_level(labelled: Option<&str>, fragments: &[String]) -> String {
    labelled
        .into_iter()
        .chain(fragments.iter().map(String::as_str))
        .find_map(level_of)
        .unwrap_or(NOT_SPECIFIED)
        .to_string()
}

/// A fragment names a level when its first word (after an optional
/// "Experience level" prefix) is the level itself. Skill chips such as
/// "Data Entry" and words such as "Expertise" do not count.
fn level_of(fragment: &str) -> Option<&'static str> {
    let lower = fragment.trim().to_lowercase();
    // Fragments are short labels; long text is description prose.
    if lower.len() > 40 {
        return None;
    }
    let label = lower
        .strip_prefix("experience level")
        .unwrap_or(&lower)
        .trim_start_matches([':', '-', ' ']);
    let first_word = label
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default();
    match first_word {
        "entry" => Some("Entry Level"),
        "intermediate" => Some("Intermediate"),
        "expert" => Some("Expert"),
        _ => None,
    }
}

/// How long ago the job was posted (`2 hours ago`), or [`NOT_SPECIFIED`].
pub fn posted(labelled: Option<&str>, fragments: &[String]) -> String {
    if let Some(text) = labelled.map(strip_posted).filter(|t| !t.is_empty()) {
        return text;
    }
    fragments
        .iter()
        .map(|f| f.trim())
        .find(|f| {
            let lower = f.to_lowercase();
            (lower.starts_with("posted") && lower.len() > "posted".len()) || lower.ends_with(" ago")
        })
        .map(strip_posted)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

fn strip_posted(text: &str) -> String {
    let trimmed = text.trim();
    let rest = match trimmed.get(..6) {
        Some(head) if head.eq_ignore_ascii_case("posted") => &trimmed[6..],
        _ => trimmed,
    };
    rest.trim_start_matches(':').trim().to_string()
}

/// Client information shown on a job tile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub payment: Option<String>,
    pub rating: Option<String>,
    pub spent: Option<String>,
    pub location: Option<String>,
}

impl ClientInfo {
    /// Build from raw element texts, normalizing each part.
    pub fn from_raw(
        payment: Option<&str>,
        rating: Option<&str>,
        spent: Option<&str>,
        location: Option<&str>,
    ) -> Self {
        Self {
            payment: payment.and_then(payment_status),
            rating: rating.and_then(non_empty),
            spent: spent.and_then(spent_amount),
            location: location.and_then(location_name),
        }
    }
}

impl fmt::Display for ClientInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN.to_string());
        write!(
            f,
            "Payment: {} | Rating: {} | Spent: {} | Location: {}",
            part(&self.payment),
            part(&self.rating),
            part(&self.spent),
            part(&self.location)
        )
    }
}

fn non_empty(text: &str) -> Option<String> {
    let t = text.trim();
    (!t.is_empty()).then(|| t.to_string())
}

fn payment_status(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    if lower.contains("unverified") || lower.contains("not verified") {
        Some("Unverified".to_string())
    } else if lower.contains("verified") {
        Some("Verified".to_string())
    } else {
        non_empty(text)
    }
}

fn spent_amount(text: &str) -> Option<String> {
    let cleaned = text.replace("spent", "").replace("Spent", "");
    non_empty(&cleaned)
}

fn location_name(text: &str) -> Option<String> {
    let t = text.trim();
    let t = t.strip_prefix("Location").unwrap_or(t);
    non_empty(t.trim_start_matches(':'))
}
