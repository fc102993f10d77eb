use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Run `operation` until it yields a value, waiting `delay` between failed
/// attempts, up to `attempts` tries. Returns None when every attempt came up
/// empty so the caller can skip the current unit of work.
pub async fn with_retry<T, F, Fut>(attempts: u32, delay: Duration, mut operation: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=attempts {
        debug!(attempt, attempts, "attempt");
        if let Some(value) = operation().await {
            return Some(value);
        }
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_returns_first_success() {
        let calls = Cell::new(0u32);
        let result = with_retry(3, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            async { Some(42) }
        })
        .await;

        assert_eq!(result, Some(42));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Cell::new(0u32);
        let result = with_retry(3, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            let value = if calls.get() == 3 { Some("found") } else { None };
            async move { value }
        })
        .await;

        assert_eq!(result, Some("found"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_cap() {
        let calls = Cell::new(0u32);
        let result: Option<i32> = with_retry(3, Duration::ZERO, || {
            calls.set(calls.get() + 1);
            async { None }
        })
        .await;

        assert_eq!(result, None);
        assert_eq!(calls.get(), 3);
    }
}
