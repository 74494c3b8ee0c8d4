//! # Single-Retry Executor
//!
//! Every remote call in the pipeline goes through [`RetryingExecutor::call`]:
//! the operation runs once, and if it fails it runs exactly one more time.
//! The second outcome is returned as-is, success or failure. There is no
//! backoff between the attempts.

use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::codes;

/// Wraps remote calls with an at-most-one-retry policy
#[derive(Debug, Clone)]
pub struct RetryingExecutor {
    /// Component name for logging
    component: String,
}

impl RetryingExecutor {
    /// Initial attempt plus one retry
    pub const MAX_ATTEMPTS: u32 = 2;

    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Execute `operation`, retrying once on failure
    ///
    /// `operation_name` identifies the call in logs (`host.get`,
    /// `history.get itemid=23296`). The closure is invoked once per attempt so
    /// each attempt builds a fresh future.
    pub async fn call<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        match operation().await {
            Ok(value) => Ok(value),
            Err(first_error) => {
                warn!(
                    component = %self.component,
                    operation = %operation_name,
                    error_code = codes::REQUEST_FAILED,
                    error = %first_error,
                    "Remote call failed, retrying once"
                );

                let retried = operation().await;
                if retried.is_ok() {
                    debug!(
                        component = %self.component,
                        operation = %operation_name,
                        "Remote call succeeded on retry"
                    );
                }
                retried
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Operation failing the first `failures` attempts
    fn flaky(
        failures: u32,
        attempts: Arc<AtomicU32>,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, String>> {
        move || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= failures {
                std::future::ready(Err(format!("attempt {attempt} failed")))
            } else {
                std::future::ready(Ok(attempt))
            }
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_does_not_retry() {
        let attempts = Arc::new(AtomicU32::new(0));
        let executor = RetryingExecutor::new("test");

        let result = executor.call("op", flaky(0, attempts.clone())).await;

        assert_eq!(result, Ok(1));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_failure_is_absorbed_by_retry() {
        let attempts = Arc::new(AtomicU32::new(0));
        let executor = RetryingExecutor::new("test");

        let result = executor.call("op", flaky(1, attempts.clone())).await;

        assert_eq!(result, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_failure_is_returned_without_further_retries() {
        let attempts = Arc::new(AtomicU32::new(0));
        let executor = RetryingExecutor::new("test");

        let result = executor.call("op", flaky(5, attempts.clone())).await;

        assert_eq!(result, Err("attempt 2 failed".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), RetryingExecutor::MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_async_operation_is_rebuilt_per_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let executor = RetryingExecutor::new("test");

        let result: Result<&str, &str> = executor
            .call("op", || {
                let attempts = attempts.clone();
                async move {
                    tokio::task::yield_now().await;
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("transient")
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
    }
}
