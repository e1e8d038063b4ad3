//! Cookie file persistence.
//!
//! The cookie file is a pretty-printed JSON array of cookie objects. A
//! missing or malformed file is treated as "no cookies" by [`load_cookies`].

use crate::error::{ScoutError, ScoutResult};
use crate::types::StoredCookie;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Read and parse the cookie file, reporting every failure.
///
/// Array entries that are not cookie objects are skipped.
pub fn read_cookie_file(path: &Path) -> ScoutResult<Vec<StoredCookie>> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    let Value::Array(items) = value else {
        return Err(ScoutError::NotAnArray);
    };

    let (cookies, skipped) = parse_cookie_entries(items);
    if skipped > 0 {
        warn!("skipped {skipped} malformed entries in {}", path.display());
    }
    Ok(cookies)
}

/// Keep the entries that are well-formed cookie objects. Returns the cookies
/// and how many entries were dropped.
pub fn parse_cookie_entries(items: Vec<Value>) -> (Vec<StoredCookie>, usize) {
    let total = items.len();
    let cookies: Vec<StoredCookie> = items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    let skipped = total - cookies.len();
    (cookies, skipped)
}

/// Load cookies from `path`. Never fails: problems are logged and an empty
/// set is returned.
pub fn load_cookies(path: &Path) -> Vec<StoredCookie> {
    if !path.exists() {
        info!("{} not found, continuing without cookies", path.display());
        return Vec::new();
    }
    match read_cookie_file(path) {
        Ok(cookies) => {
            info!("loaded {} cookies from {}", cookies.len(), path.display());
            cookies
        }
        Err(ScoutError::NotAnArray) => {
            warn!("{} is not an array, ignoring", path.display());
            Vec::new()
        }
        Err(e) => {
            warn!("failed to read {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Write `cookies` to `path` as a pretty-printed JSON array.
pub fn save_cookies(path: &Path, cookies: &[StoredCookie]) -> ScoutResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cookies)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<StoredCookie> {
        vec![
            StoredCookie::new("visitor_id", "abc123").with_domain(".upwork.com"),
            StoredCookie {
                path: Some("/".into()),
                secure: Some(true),
                expires: Some(1_900_000_000.0),
                ..StoredCookie::new("oauth2_global_js_token", "tok").with_domain("www.upwork.com")
            },
        ]
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        let cookies = sample();

        save_cookies(&path, &cookies).unwrap();
        let loaded = load_cookies(&path);

        assert_eq!(loaded.len(), cookies.len());
        assert_eq!(loaded, cookies);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_cookies(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_cookies(&path).is_empty());
        assert!(matches!(read_cookie_file(&path), Err(ScoutError::Json(_))));
    }

    #[test]
    fn test_non_array_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"{"name": "sid", "value": "x"}"#).unwrap();
        assert!(load_cookies(&path).is_empty());
        assert!(matches!(read_cookie_file(&path), Err(ScoutError::NotAnArray)));
    }

    #[test]
    fn test_skips_non_object_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"[{"name": "sid", "value": "x"}, 42, "junk"]"#).unwrap();
        let loaded = load_cookies(&path);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "sid");
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/nested/cookies.json");
        save_cookies(&path, &sample()).unwrap();
        assert!(path.exists());
    }
}
