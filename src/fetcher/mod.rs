pub mod http_fetcher;
pub mod uri_template;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Headers;

pub use http_fetcher::HttpFetcher;

/// Response of a backend service, reduced to what content assembly needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 300
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Transport used by leaf content providers.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, accept: &str) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ranges() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(304, "").is_success());
        assert!(HttpResponse::new(404, "").is_client_error());
        assert!(!HttpResponse::new(404, "").is_server_error());
        assert!(HttpResponse::new(503, "").is_server_error());
    }
}
