//! Readiness waiter: poll a page condition until it holds or a budget runs out.
//!
//! Running out of budget is not an error. The waiter logs and reports
//! [`WaitOutcome::Exhausted`], and the caller carries on; the extractor copes
//! with a page that never became ready.

use crate::renderer::RenderContext;
use anyhow::Result;
use jobscout::readiness::is_challenge_cleared;
use jobscout::{DelayRange, JOB_LINKS_PRESENT_JS};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long a condition may be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitBudget {
    /// Poll every `interval` until `timeout` has elapsed.
    Deadline { timeout: Duration, interval: Duration },
    /// Poll at most `max_attempts` times, sleeping a random `delay` between
    /// attempts.
    Attempts { max_attempts: u32, delay: DelayRange },
}

impl WaitBudget {
    pub const fn deadline(timeout: Duration, interval: Duration) -> Self {
        Self::Deadline { timeout, interval }
    }

    pub const fn attempts(max_attempts: u32, delay: DelayRange) -> Self {
        Self::Attempts {
            max_attempts,
            delay,
        }
    }
}

/// Result of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready { attempts: u32 },
    Exhausted { attempts: u32 },
}

impl WaitOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            WaitOutcome::Ready { attempts } | WaitOutcome::Exhausted { attempts } => *attempts,
        }
    }
}

/// Poll `check` under `budget`.
///
/// A check error counts as "not ready yet" (pages in transition reject
/// evaluation).
pub async fn wait_until<F, Fut>(label: &str, budget: WaitBudget, mut check: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut attempts = 0u32;

    match budget {
        WaitBudget::Deadline { timeout, interval } => {
            let deadline = Instant::now() + timeout;
            loop {
                attempts += 1;
                let remaining = deadline.saturating_duration_since(Instant::now());
                match tokio::time::timeout(remaining, check()).await {
                    Ok(Ok(true)) => return ready(label, attempts),
                    Ok(Ok(false)) => {}
                    Ok(Err(e)) => debug!("{label}: check failed: {e:#}"),
                    Err(_) => {}
                }

                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                tokio::time::sleep(interval.min(remaining)).await;
            }
        }
        WaitBudget::Attempts {
            max_attempts,
            delay,
        } => {
            while attempts < max_attempts {
                attempts += 1;
                match check().await {
                    Ok(true) => return ready(label, attempts),
                    Ok(false) => debug!("{label}: attempt {attempts}/{max_attempts} not ready"),
                    Err(e) => debug!("{label}: attempt {attempts}/{max_attempts} failed: {e:#}"),
                }
                if attempts < max_attempts {
                    tokio::time::sleep(delay.sample()).await;
                }
            }
        }
    }

    warn!("{label}: gave up after {attempts} attempts, continuing anyway");
    WaitOutcome::Exhausted { attempts }
}

fn ready(label: &str, attempts: u32) -> WaitOutcome {
    info!("{label}: ready after {attempts} attempt(s)");
    WaitOutcome::Ready { attempts }
}

/// Wait until at least one job detail link is in the DOM.
pub async fn wait_for_job_links(ctx: &dyn RenderContext, budget: WaitBudget) -> WaitOutcome {
    wait_until("job links", budget, || async move {
        let value = ctx.execute_js(JOB_LINKS_PRESENT_JS).await?;
        anyhow::Ok(value.as_bool().unwrap_or(false))
    })
    .await
}

/// Wait until the page is off any challenge interstitial and on
/// `target_domain`.
pub async fn wait_for_challenge_clearance(
    ctx: &dyn RenderContext,
    target_domain: &str,
    budget: WaitBudget,
) -> WaitOutcome {
    wait_until("challenge clearance", budget, || async move {
        let title = ctx.get_title().await?;
        let url = ctx.get_url().await?;
        let cleared = is_challenge_cleared(&title, &url, target_domain);
        if !cleared {
            debug!("still on challenge page: title={title:?} url={url}");
        }
        anyhow::Ok(cleared)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_attempts_budget_stops_after_max() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome = wait_until("test", WaitBudget::attempts(3, DelayRange::none()), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(false)
        })
        .await;

        assert_eq!(outcome, WaitOutcome::Exhausted { attempts: 3 });
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempts_budget_returns_on_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome = wait_until("test", WaitBudget::attempts(5, DelayRange::none()), || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            anyhow::Ok(n == 2)
        })
        .await;

        assert_eq!(outcome, WaitOutcome::Ready { attempts: 2 });
    }

    #[tokio::test]
    async fn test_check_errors_count_as_not_ready() {
        let outcome = wait_until("test", WaitBudget::attempts(2, DelayRange::none()), || async {
            Err::<bool, _>(anyhow::anyhow!("execution context destroyed"))
        })
        .await;

        assert!(!outcome.is_ready());
        assert_eq!(outcome.attempts(), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_never_checks() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome = wait_until("test", WaitBudget::attempts(0, DelayRange::none()), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(true)
        })
        .await;

        assert_eq!(outcome, WaitOutcome::Exhausted { attempts: 0 });
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deadline_budget_gives_up() {
        let budget = WaitBudget::deadline(Duration::from_millis(50), Duration::from_millis(10));
        let started = std::time::Instant::now();
        let outcome = wait_until("test", budget, || async { anyhow::Ok(false) }).await;

        assert!(!outcome.is_ready());
        assert!(outcome.attempts() >= 2);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_deadline_budget_ready_immediately() {
        let budget = WaitBudget::deadline(Duration::from_secs(5), Duration::from_millis(10));
        let outcome = wait_until("test", budget, || async { anyhow::Ok(true) }).await;
        assert_eq!(outcome, WaitOutcome::Ready { attempts: 1 });
    }
}
