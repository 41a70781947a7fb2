use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::app::error::{MontageError, Result};
use crate::config::{ClientConfig, Config};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::fragment::{Fragment, Page};
use crate::provider::{CircuitBreaker, ProviderBuilder};

/// Wires configured clients, their transports and circuit breakers.
///
/// Providers built for the same client and URL template share one breaker,
/// so its state carries over from one page execution to the next.
pub struct AppContext {
    pub config: Config,
    fetchers: HashMap<String, Arc<dyn Fetcher>>,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let mut fetchers: HashMap<String, Arc<dyn Fetcher>> = HashMap::new();
        for (name, client) in &config.clients {
            fetchers.insert(name.clone(), Arc::new(HttpFetcher::new(client)?));
        }

        Ok(Self {
            config,
            fetchers,
            breakers: Mutex::new(HashMap::new()),
        })
    }

    /// Context whose clients all use `fetcher` as transport.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let fetchers = config
            .clients
            .keys()
            .map(|name| (name.clone(), fetcher.clone()))
            .collect();

        Self {
            config,
            fetchers,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn client(&self, name: &str) -> Result<&ClientConfig> {
        self.config
            .client(name)
            .ok_or_else(|| MontageError::Config(format!("Unknown client '{}'", name)))
    }

    /// Start building a provider fetching `url_template` through client `client_name`.
    pub fn content_from(&self, client_name: &str, url_template: &str) -> Result<ProviderBuilder> {
        let client = self.client(client_name)?.clone();
        let fetcher = self
            .fetchers
            .get(client_name)
            .cloned()
            .ok_or_else(|| MontageError::Config(format!("Unknown client '{}'", client_name)))?;
        let breaker = self.circuit_breaker(client_name, url_template, &client);

        Ok(ProviderBuilder::new(
            client_name,
            client,
            fetcher,
            breaker,
            url_template,
        ))
    }

    pub fn circuit_breaker(
        &self,
        client_name: &str,
        url_template: &str,
        client: &ClientConfig,
    ) -> Arc<CircuitBreaker> {
        let key = format!("{}:{}", client_name, url_template);
        let mut breakers = self.breakers.lock().unwrap_or_else(|e| e.into_inner());
        breakers
            .entry(key.clone())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(key, client.circuit_breaker.clone())))
            .clone()
    }

    /// A page over `fragments` using the configured worker count.
    pub fn page(&self, fragments: Vec<Fragment>) -> Page {
        Page::with_workers(fragments, self.config.workers)
    }
}
