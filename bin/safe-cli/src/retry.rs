//! Exponential backoff for node and transaction-service requests.

use std::time::Duration;

use rand::Rng;
use safe_oracle::StoreError;
use safe_primitives::CallFailure;
use tracing::{debug, warn};

const INITIAL_DELAY_MS: u64 = 200;
const MAX_DELAY_MS: u64 = 10_000;
const MAX_RETRIES: usize = 5;

const TRANSIENT_MARKERS: &[&str] = &[
    "connection",
    "timed out",
    "timeout",
    "rate limit",
    "too many requests",
    "temporarily unavailable",
    "reset by peer",
];

/// Reverts and client errors are final; dropped connections, timeouts, 429 and 5xx are not.
fn is_transient(err: &eyre::Report) -> bool {
    for cause in err.chain() {
        if let Some(store) = cause.downcast_ref::<StoreError>() {
            return match store {
                StoreError::Status { status, .. } => *status == 429 || *status >= 500,
                StoreError::Transport(err) => err.is_timeout() || err.is_connect(),
                StoreError::Decode(_) => false,
            };
        }
        if let Some(call) = cause.downcast_ref::<CallFailure>()
            && !call.revert_data.is_empty()
        {
            return false;
        }
    }

    let msg = format!("{err:#}").to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| msg.contains(marker))
}

fn backoff(attempt: usize) -> Duration {
    let delay = INITIAL_DELAY_MS
        .saturating_mul(1 << attempt.min(16))
        .min(MAX_DELAY_MS);
    let jitter = rand::thread_rng().gen_range(0..=delay / 4);
    Duration::from_millis(delay + jitter)
}

/// Runs `f` until it succeeds, fails permanently, or `MAX_RETRIES` retries are spent.
pub(crate) async fn with_retry<F, Fut, T>(operation: &str, mut f: F) -> eyre::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = eyre::Result<T>>,
{
    let mut attempt = 0;
    loop {
        let err = match f().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_transient(&err) {
            debug!(%operation, error = %err, "permanent failure");
            return Err(err);
        }
        if attempt == MAX_RETRIES {
            warn!(%operation, attempts = attempt + 1, error = %err, "giving up");
            return Err(err);
        }

        let delay = backoff(attempt);
        warn!(
            %operation,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_backoff_is_capped() {
        for attempt in 0..32 {
            let delay = backoff(attempt).as_millis() as u64;
            let base = (INITIAL_DELAY_MS << attempt.min(16)).min(MAX_DELAY_MS);
            assert!((base..=base + base / 4).contains(&delay));
        }
    }

    #[test]
    fn test_transient_classification() {
        let status = |status| {
            eyre::Report::new(StoreError::Status {
                status,
                body: String::new(),
            })
        };
        assert!(is_transient(&status(503)));
        assert!(is_transient(&status(429)));
        assert!(!is_transient(&status(404)));

        let revert = eyre::Report::new(CallFailure::new("connection reverted", bytes!("08c379a0")));
        assert!(!is_transient(&revert));
        assert!(is_transient(&eyre::Report::new(CallFailure::transport(
            "error sending request: connection refused"
        ))));
        assert!(!is_transient(&eyre::eyre!("invalid address")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let value = with_retry("lookup", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(eyre::eyre!("connection reset by peer"))
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: eyre::Result<()> = with_retry("lookup", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(eyre::eyre!("invalid address"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
