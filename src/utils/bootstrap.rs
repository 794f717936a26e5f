//! Bootstrap utilities for the server binary.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the LPA_ACCESS_LOG environment variable.
///
/// Defaults to "info" level if LPA_ACCESS_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Backoff for connecting to backing services at startup.
///
/// Allows `max_attempts` calls in total, 100ms to 5s apart with jitter.
pub fn startup_backoff(max_attempts: u32) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(max_attempts.saturating_sub(1) as usize)
        .with_jitter()
}

/// Run a startup step under [`startup_backoff`].
///
/// Used for connecting to backing services while they come up. Request-path
/// storage calls never go through this.
pub async fn with_startup_retry<T, E, F, Fut>(
    service_name: &str,
    max_attempts: u32,
    connect: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let result = connect
        .retry(startup_backoff(max_attempts))
        .notify(|err: &E, dur: Duration| {
            warn!(
                service = %service_name,
                error = %err,
                delay = ?dur,
                "Connection failed, retrying"
            );
        })
        .await;

    match &result {
        Ok(_) => info!(service = %service_name, "Connected"),
        Err(e) => error!(
            service = %service_name,
            attempts = max_attempts,
            error = %e,
            "Giving up connecting"
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_with_startup_retry_recovers() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_startup_retry("store", 5, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(format!("attempt {}", n))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_startup_retry_single_attempt_does_not_retry() {
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = with_startup_retry("store", 1, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down".to_string())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_startup_retry_gives_up() {
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = with_startup_retry("store", 2, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down".to_string())
        })
        .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
