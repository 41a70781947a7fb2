use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::app::{MontageError, Result};
use crate::domain::{Content, Parameters, Position, SingleContent};
use crate::fetcher::{uri_template, Fetcher};
use crate::provider::ContentProvider;
use crate::tracer::Tracer;

pub const DEFAULT_ACCEPT: &str = "text/html";

/// Leaf provider fetching one URL template from a backend service.
pub struct HttpContentProvider {
    fetcher: Arc<dyn Fetcher>,
    url_template: String,
    accept: String,
}

impl HttpContentProvider {
    pub fn new(fetcher: Arc<dyn Fetcher>, url_template: impl Into<String>) -> Self {
        Self {
            fetcher,
            url_template: url_template.into(),
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }
}

#[async_trait]
impl ContentProvider for HttpContentProvider {
    async fn get_content(
        &self,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Result<Option<Content>> {
        let url = uri_template::expand(&self.url_template, parameters)?;

        let started_at = Utc::now();
        tracer.started(position, &url);

        let response = self.fetcher.get(&url, &self.accept).await?;

        if response.is_server_error() {
            return Err(MontageError::ServerError {
                status: response.status,
                url,
            });
        }

        if response.is_client_error() {
            tracing::debug!("{} answered {} for {}", url, response.status, position);
            tracer.completed(position, &url, false);
            return Ok(None);
        }

        let content = Content::Single(SingleContent::new(
            position.clone(),
            url.clone(),
            response.status,
            response.body,
            response.headers,
            started_at,
            Utc::now(),
        ));
        tracer.completed(position, &url, content.is_available());

        Ok(Some(content).filter(Content::is_available))
    }

    fn describe(&self) -> String {
        self.url_template.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::ScriptedFetcher;
    use crate::tracer::EventType;

    fn provider(fetcher: ScriptedFetcher, template: &str) -> (Arc<ScriptedFetcher>, HttpContentProvider) {
        let fetcher = Arc::new(fetcher);
        let provider = HttpContentProvider::new(fetcher.clone(), template);
        (fetcher, provider)
    }

    #[tokio::test]
    async fn test_success_yields_single_content() {
        let (fetcher, provider) = provider(
            ScriptedFetcher::new().respond("http://backend/product/42", 200, "<p>42</p>"),
            "http://backend/product/{id}",
        );
        let tracer = Tracer::new();

        let content = provider
            .get_content(
                &Position::from("product"),
                &tracer,
                &Parameters::from([("id", "42")]),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(content.body(), "<p>42</p>");
        assert_eq!(content.source(), "http://backend/product/42");
        assert_eq!(content.headers().first("content-type"), Some("text/html"));
        assert_eq!(fetcher.requested(), vec!["http://backend/product/42"]);

        let events: Vec<_> = tracer.events().iter().map(|e| e.event_type).collect();
        assert_eq!(
            events,
            vec![EventType::FragmentStarted, EventType::FragmentCompleted]
        );
        assert!(tracer.events()[1].non_empty);
    }

    #[tokio::test]
    async fn test_empty_body_yields_nothing() {
        let (_, provider) = provider(
            ScriptedFetcher::new().respond("http://backend/empty", 200, ""),
            "http://backend/empty",
        );
        let tracer = Tracer::new();

        let content = provider
            .get_content(&Position::from("a"), &tracer, &Parameters::empty())
            .await
            .unwrap();

        assert!(content.is_none());
        assert_eq!(tracer.statistics().num_empty, 1);
    }

    #[tokio::test]
    async fn test_client_error_is_empty_not_error() {
        let (_, provider) = provider(ScriptedFetcher::new(), "http://backend/missing");
        let tracer = Tracer::new();

        let content = provider
            .get_content(&Position::from("a"), &tracer, &Parameters::empty())
            .await
            .unwrap();

        assert!(content.is_none());
        assert_eq!(tracer.statistics().num_errors, 0);
    }

    #[tokio::test]
    async fn test_server_error_is_an_error() {
        let (_, provider) = provider(
            ScriptedFetcher::new().respond("http://backend/down", 503, "unavailable"),
            "http://backend/down",
        );

        let result = provider
            .get_content(&Position::from("a"), &Tracer::noop(), &Parameters::empty())
            .await;

        match result {
            Err(error @ MontageError::ServerError { status: 503, .. }) => {
                assert!(error.is_retryable())
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_template_variable_fails_before_request() {
        let (fetcher, provider) = provider(ScriptedFetcher::new(), "http://backend/{id}");

        let result = provider
            .get_content(&Position::from("a"), &Tracer::noop(), &Parameters::empty())
            .await;

        assert!(matches!(
            result,
            Err(MontageError::MissingTemplateVariable { .. })
        ));
        assert!(fetcher.requested().is_empty());
    }
}
