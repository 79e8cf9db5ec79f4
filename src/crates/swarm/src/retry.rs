use std::time::Duration;

use contracts::PersistenceError;

/// Fixed backoff schedule for transient persistence failures: `(1s, 2s, 4s)`,
/// three attempts total.
const BACKOFF: [Duration; 3] = [Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)];

/// Runs a fallible persistence call with a classify-then-backoff retry
/// discipline: transient errors are retried with backoff, permanent and
/// capability-absent errors surface on the first attempt.
pub async fn retry_persistence<F, Fut, T>(operation: &str, mut f: F) -> Result<T, PersistenceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, PersistenceError>>,
{
    let mut last_err = None;
    for (attempt, delay) in std::iter::once(Duration::ZERO).chain(BACKOFF).enumerate() {
        if attempt > 0 {
            tokio::time::sleep(delay).await;
        }
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                tracing::debug!(operation, attempt, %err, "transient persistence error, retrying");
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.expect("loop always runs at least once"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn transient_errors_retry_until_success() {
        let attempts = AtomicUsize::new(0);
        let result: Result<u32, PersistenceError> = retry_persistence("test", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(PersistenceError::Transient("not yet".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_never_retry() {
        let attempts = AtomicUsize::new(0);
        let result: Result<u32, PersistenceError> = retry_persistence("test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(PersistenceError::Permanent("nope".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn capability_absent_never_retries() {
        let attempts = AtomicUsize::new(0);
        let result: Result<u32, PersistenceError> = retry_persistence("test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(PersistenceError::CapabilityAbsent("not configured".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
