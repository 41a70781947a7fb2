use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::app::{MontageError, Result};
use crate::domain::{Content, Parameters, Position};
use crate::provider::{fetch_guarded, CircuitBreaker, ContentProvider, SharedProvider};
use crate::tracer::Tracer;

/// Wraps a provider with retries, a per-attempt timeout, an optional
/// circuit breaker and an optional fallback.
///
/// All attempts of one call count as a single result for the breaker.
/// Only retryable errors (transport, timeout, 5xx) trigger another attempt.
pub struct ResilientContentProvider {
    delegate: SharedProvider,
    retries: u32,
    timeout: Duration,
    breaker: Option<Arc<CircuitBreaker>>,
    fallback: Option<SharedProvider>,
}

impl ResilientContentProvider {
    pub fn new(delegate: SharedProvider, retries: u32, timeout: Duration) -> Self {
        Self {
            delegate,
            retries,
            timeout,
            breaker: None,
            fallback: None,
        }
    }

    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Provider asked once retries are exhausted or the circuit is open.
    ///
    /// Only a breaker-guarded provider can have a fallback.
    pub fn with_fallback(mut self, fallback: SharedProvider) -> Result<Self> {
        if self.breaker.is_none() {
            return Err(MontageError::Config(format!(
                "fallback configured for {} without a circuit breaker",
                self.delegate.describe()
            )));
        }
        self.fallback = Some(fallback);
        Ok(self)
    }

    async fn call_with_retries(
        &self,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Result<Option<Content>> {
        let attempts = self.retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match tokio::time::timeout(
                self.timeout,
                fetch_guarded(self.delegate.as_ref(), position, tracer, parameters),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(MontageError::Timeout(self.timeout)),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        attempts,
                        self.delegate.describe(),
                        e
                    );
                }
                other => return other,
            }
        }
    }

    async fn call_guarded(
        &self,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Result<Option<Content>> {
        let Some(breaker) = &self.breaker else {
            return self.call_with_retries(position, tracer, parameters).await;
        };

        let Some(permit) = breaker.try_acquire() else {
            debug!("Circuit {} is open, skipping {}", breaker.name(), position);
            return Err(MontageError::CircuitOpen);
        };

        // a call dropped before it finishes releases its permit unreported
        let result = self.call_with_retries(position, tracer, parameters).await;
        match &result {
            Ok(_) => permit.record_success(),
            Err(_) => permit.record_failure(),
        }
        result
    }

    async fn call_fallback(
        &self,
        fallback: &SharedProvider,
        cause: MontageError,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Result<Option<Content>> {
        let source = fallback.describe();
        debug!("Falling back to {} for {}: {}", source, position, cause);
        tracer.fallback_started(position, &source);

        let result = fetch_guarded(fallback.as_ref(), position, tracer, parameters).await;
        let non_empty = matches!(&result, Ok(Some(content)) if content.is_available());
        tracer.fallback_completed(position, &source, non_empty);
        result
    }
}

#[async_trait]
impl ContentProvider for ResilientContentProvider {
    async fn get_content(
        &self,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Result<Option<Content>> {
        match self.call_guarded(position, tracer, parameters).await {
            Ok(content) => Ok(content),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    self.call_fallback(fallback, e, position, tracer, parameters)
                        .await
                }
                None => Err(e),
            },
        }
    }

    fn describe(&self) -> String {
        self.delegate.describe()
    }
}
