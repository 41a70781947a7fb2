use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;

use crate::app::Result;
use crate::config::ClientConfig;
use crate::domain::Headers;
use crate::fetcher::{Fetcher, HttpResponse};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.connect_timeout() + config.read_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("montage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, accept: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).header(ACCEPT, accept).send().await?;

        let status = response.status().as_u16();
        let headers = Headers::from(response.headers());
        let body = response.text().await?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_from_default_client_config() {
        assert!(HttpFetcher::new(&ClientConfig::default()).is_ok());
    }
}
