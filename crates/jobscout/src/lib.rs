//! JobScout core — browser-free extraction of job listings from rendered HTML.
//!
//! Everything in this crate is a pure function of its inputs (an HTML
//! snapshot, a page title, a cookie file), so it can be tested without a
//! browser. The `jobscout-runtime` crate drives Chromium and calls into it.

pub mod classify;
pub mod cookies;
pub mod delay;
pub mod error;
pub mod extract;
pub mod readiness;
pub mod types;

pub use cookies::{load_cookies, save_cookies};
pub use delay::DelayRange;
pub use error::{ScoutError, ScoutResult};
pub use extract::{extract_jobs, finalize, JobCard};
pub use readiness::{is_challenge_cleared, is_challenge_title, site_domain, JOB_LINKS_PRESENT_JS};
pub use types::*;
