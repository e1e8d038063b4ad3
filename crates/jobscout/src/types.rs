//! Core data types: job records, scrape requests, and stored cookies.

use crate::cookies::parse_cookie_entries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Number of jobs returned when a request does not ask for a specific count.
pub const DEFAULT_MAX_JOBS: usize = 20;

/// Sentinel for classifier fields that could not be found on the listing.
pub const NOT_SPECIFIED: &str = "Not Specified";

/// Sentinel for client-info parts that could not be found on the listing.
pub const UNKNOWN: &str = "Unknown";

/// Sentinel title for a detail link with no text and no heading nearby.
pub const NO_TITLE: &str = "No title";

/// A single job listing scraped from a search page.
///
/// `id` is the 1-based position within one scrape batch, not a global key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: u32,
    pub title: String,
    pub url: String,
    pub description: String,
    pub meta: String,
    pub budget: String,
    pub experience_level: String,
    pub posted: String,
    pub skills: Vec<String>,
    pub client_info: String,
    pub scraped_at: DateTime<Utc>,
}

/// Body of `POST /scrape`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Accepted as a number or a numeric string.
    #[serde(default)]
    pub max_jobs: Option<Value>,
    /// Cookie objects to add before navigating. Kept raw so one bad entry
    /// does not reject the request; see [`ScrapeRequest::cookies`].
    #[serde(default)]
    pub cookie: Option<Value>,
}

impl ScrapeRequest {
    /// The target URL, if present and not blank.
    pub fn target_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Resolve `maxJobs`, falling back to [`DEFAULT_MAX_JOBS`] for missing,
    /// zero, negative, or non-numeric values.
    pub fn max_jobs(&self) -> usize {
        let parsed = match &self.max_jobs {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() && n >= 1.0 => n.ceil() as usize,
            _ => DEFAULT_MAX_JOBS,
        }
    }

    /// The well-formed entries of `cookie`. Malformed entries, or a `cookie`
    /// value that is not an array, are logged and skipped.
    pub fn cookies(&self) -> Vec<StoredCookie> {
        match &self.cookie {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let (cookies, skipped) = parse_cookie_entries(items.clone());
                if skipped > 0 {
                    warn!("skipped {skipped} malformed request cookie(s)");
                }
                cookies
            }
            Some(_) => {
                warn!("request cookie field is not an array, ignoring");
                Vec::new()
            }
        }
    }
}

/// A browser cookie as stored in the cookie file.
///
/// Field names follow the DevTools protocol cookie object. Fields this type
/// does not know about are kept in `extra` so a file written by another tool
/// survives a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Seconds since the epoch; `-1` for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Session cookies carry `expires <= 0` or no expiry at all.
    pub fn is_session(&self) -> bool {
        self.expires.map(|e| e <= 0.0).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_record_serializes_camel_case() {
        let record = JobRecord {
            id: 1,
            title: "Rust dev".into(),
            url: "https://www.upwork.com/jobs/~01".into(),
            description: String::new(),
            meta: String::new(),
            budget: NOT_SPECIFIED.into(),
            experience_level: NOT_SPECIFIED.into(),
            posted: NOT_SPECIFIED.into(),
            skills: vec!["Rust".into()],
            client_info: "Payment: Unknown".into(),
            scraped_at: Utc::now(),
        };
        let v = serde_json::to_value(&record).unwrap();
        assert!(v.get("experienceLevel").is_some());
        assert!(v.get("clientInfo").is_some());
        assert!(v.get("scrapedAt").is_some());
        assert!(v.get("experience_level").is_none());
    }

    #[test]
    fn test_scrape_request_empty_body() {
        let req: ScrapeRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.target_url().is_none());
        assert_eq!(req.max_jobs(), DEFAULT_MAX_JOBS);
    }

    #[test]
    fn test_scrape_request_blank_url_is_missing() {
        let req: ScrapeRequest = serde_json::from_value(json!({ "url": "   " })).unwrap();
        assert!(req.target_url().is_none());
    }

    #[test]
    fn test_max_jobs_parsing() {
        let cases = [
            (json!(5), 5),
            (json!("7"), 7),
            (json!(0), DEFAULT_MAX_JOBS),
            (json!(-3), DEFAULT_MAX_JOBS),
            (json!("lots"), DEFAULT_MAX_JOBS),
            (json!(null), DEFAULT_MAX_JOBS),
            (json!(2.5), 3),
        ];
        for (raw, expected) in cases {
            let req: ScrapeRequest =
                serde_json::from_value(json!({ "url": "https://x", "maxJobs": raw.clone() }))
                    .unwrap();
            assert_eq!(req.max_jobs(), expected, "maxJobs = {raw}");
        }
    }

    #[test]
    fn test_request_cookies_skip_malformed_entries() {
        let req: ScrapeRequest = serde_json::from_value(json!({
            "url": "https://x",
            "cookie": [
                { "name": "a", "value": "b", "expires": "never" },
                42,
                { "name": "sid", "value": "abc", "domain": ".upwork.com" }
            ]
        }))
        .unwrap();
        let cookies = req.cookies();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "sid");

        let req: ScrapeRequest =
            serde_json::from_value(json!({ "url": "https://x", "cookie": "sid=abc" })).unwrap();
        assert!(req.cookies().is_empty());
        assert!(ScrapeRequest::default().cookies().is_empty());
    }

    #[test]
    fn test_stored_cookie_keeps_unknown_fields() {
        let raw = json!({
            "name": "sid",
            "value": "abc",
            "domain": ".upwork.com",
            "path": "/",
            "expires": -1,
            "httpOnly": true,
            "secure": true,
            "sameSite": "Lax",
            "priority": "Medium",
            "sourcePort": 443
        });
        let cookie: StoredCookie = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cookie.name, "sid");
        assert!(cookie.is_session());
        assert_eq!(cookie.extra.get("priority"), Some(&json!("Medium")));

        let back = serde_json::to_value(&cookie).unwrap();
        assert_eq!(back["sourcePort"], json!(443));
        assert_eq!(back["httpOnly"], json!(true));
    }
}
