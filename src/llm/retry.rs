//! Retry with exponential backoff for transient service failures.
//!
//! Only [`LlmError::Service`] errors marked transient are retried (rate
//! limits, server errors, network failures). Context-length errors, auth
//! failures and everything else propagate on the first attempt.

use crate::error::{Error, LlmError, Result};
use crate::llm::{CompletionParams, CompletionProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 fails fast).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Scale delays down by a fixed per-attempt factor.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default backoff with `retries` retries.
    #[must_use]
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Self::default()
        }
    }

    /// No retries.
    #[must_use]
    pub fn none() -> Self {
        Self::with_retries(0)
    }

    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());

        let factor = if self.jitter {
            match attempt % 4 {
                0 => 0.75,
                1 => 0.90,
                2 => 0.60,
                _ => 0.85,
            }
        } else {
            1.0
        };
        Duration::from_secs_f64((capped * factor).max(0.0))
    }
}

/// Whether `error` is worth another attempt.
#[must_use]
pub const fn is_retryable(error: &Error) -> bool {
    matches!(error, Error::Llm(e) if e.is_transient())
}

/// Provider wrapper that retries transient failures.
///
/// # Examples
///
/// ```no_run
/// use recap_rs::llm::{OpenAiProvider, RetryConfig, RetryingProvider, ServiceConfig};
///
/// let inner = OpenAiProvider::new(&ServiceConfig::new("gpt-4o-mini"));
/// let provider = RetryingProvider::new(inner, RetryConfig::with_retries(3));
/// ```
#[derive(Debug)]
pub struct RetryingProvider<P> {
    inner: P,
    config: RetryConfig,
}

impl<P: CompletionProvider> RetryingProvider<P> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: P, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Returns the wrapped provider.
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for RetryingProvider<P> {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(prompt, params).await {
                Ok(text) => return Ok(text),
                Err(err) if is_retryable(&err) && attempt < self.config.max_retries => {
                    let delay = self.config.delay_for_attempt(attempt);
                    attempt += 1;
                    tracing::warn!(
                        model = self.inner.model(),
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient service error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if attempt > 0 {
                        tracing::warn!(attempts = attempt + 1, error = %err, "giving up");
                    }
                    return Err(err);
                }
            }
        }
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        transient: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CompletionProvider for Flaky {
        async fn complete(&self, prompt: &str, _params: &CompletionParams) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(LlmError::Service {
                    message: "HTTP 429".to_string(),
                    transient: self.transient,
                }
                .into());
            }
            Ok(prompt.to_uppercase())
        }

        fn model(&self) -> &str {
            "flaky"
        }
    }

    fn fast(retries: u32) -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryConfig::with_retries(retries)
        }
    }

    fn flaky(failures: u32, transient: bool) -> Flaky {
        Flaky {
            failures,
            transient,
            calls: AtomicU32::new(0),
        }
    }

    #[test]
    fn test_default_retries() {
        assert_eq!(RetryConfig::default().max_retries, 2);
        assert_eq!(RetryConfig::none().max_retries, 0);
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let config = RetryConfig {
            jitter: false,
            max_delay: Duration::from_secs(2),
            ..RetryConfig::with_retries(10)
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(9), Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_never_lengthens_delay() {
        let jittered = RetryConfig::default();
        let plain = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        for attempt in 0..6 {
            assert!(jittered.delay_for_attempt(attempt) <= plain.delay_for_attempt(attempt));
        }
    }

    #[test]
    fn test_only_transient_service_errors_retry() {
        let transient: Error = LlmError::Service {
            message: "overloaded".to_string(),
            transient: true,
        }
        .into();
        assert!(is_retryable(&transient));

        let length: Error = LlmError::ContentLength {
            message: "too long".to_string(),
        }
        .into();
        assert!(!is_retryable(&length));

        let config = Error::Config {
            message: "x".to_string(),
        };
        assert!(!is_retryable(&config));
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failures() {
        let provider = RetryingProvider::new(flaky(2, true), fast(2));
        let text = provider
            .complete("hi", &CompletionParams::summary())
            .await
            .unwrap();
        assert_eq!(text, "HI");
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let provider = RetryingProvider::new(flaky(5, true), fast(2));
        let result = provider.complete("hi", &CompletionParams::summary()).await;
        assert!(result.is_err());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_fast() {
        let provider = RetryingProvider::new(flaky(1, false), fast(3));
        let result = provider.complete("hi", &CompletionParams::summary()).await;
        assert!(result.is_err());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_fail_fast() {
        let provider = RetryingProvider::new(flaky(1, true), fast(0));
        assert!(provider.complete("hi", &CompletionParams::summary()).await.is_err());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);
    }
}
