use std::sync::Arc;

use crate::app::{MontageError, Result};
use crate::config::ClientConfig;
use crate::fetcher::Fetcher;
use crate::provider::{
    static_text, CircuitBreaker, HttpContentProvider, ResilientContentProvider, SharedProvider,
    DEFAULT_ACCEPT,
};

/// Assembles an HTTP leaf provider with the resilience settings of its client.
///
/// Obtained from [`AppContext::content_from`](crate::app::AppContext::content_from).
pub struct ProviderBuilder {
    client_name: String,
    client: ClientConfig,
    fetcher: Arc<dyn Fetcher>,
    breaker: Arc<CircuitBreaker>,
    url_template: String,
    accept: String,
    fallback: Option<SharedProvider>,
}

impl ProviderBuilder {
    pub(crate) fn new(
        client_name: &str,
        client: ClientConfig,
        fetcher: Arc<dyn Fetcher>,
        breaker: Arc<CircuitBreaker>,
        url_template: &str,
    ) -> Self {
        Self {
            client_name: client_name.to_string(),
            client,
            fetcher,
            breaker,
            url_template: url_template.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            fallback: None,
        }
    }

    pub fn accept(mut self, media_type: impl Into<String>) -> Self {
        self.accept = media_type.into();
        self
    }

    pub fn fallback(mut self, provider: SharedProvider) -> Self {
        self.fallback = Some(provider);
        self
    }

    pub fn fallback_text(self, text: impl Into<String>) -> Self {
        self.fallback(static_text(text))
    }

    /// Fails if a fallback was given for a client that is not resilient.
    pub fn build(self) -> Result<SharedProvider> {
        let leaf: SharedProvider = Arc::new(
            HttpContentProvider::new(self.fetcher, self.url_template.clone()).with_accept(self.accept),
        );

        if !self.client.resilient {
            if self.fallback.is_some() {
                return Err(MontageError::Config(format!(
                    "fallback for {} requires a resilient client, but '{}' is not",
                    self.url_template, self.client_name
                )));
            }
            if self.client.retries == 0 {
                return Ok(leaf);
            }
            return Ok(Arc::new(ResilientContentProvider::new(
                leaf,
                self.client.retries,
                self.client.call_timeout(),
            )));
        }

        let mut provider =
            ResilientContentProvider::new(leaf, self.client.retries, self.client.call_timeout())
                .with_circuit_breaker(self.breaker);
        if let Some(fallback) = self.fallback {
            provider = provider.with_fallback(fallback)?;
        }
        Ok(Arc::new(provider))
    }
}
