//! Content providers and the combinators built from them.
//!
//! A [`ContentProvider`] produces at most one [`Content`] for a position.
//! Leaf providers talk to a backend through a [`Fetcher`](crate::fetcher::Fetcher);
//! combinators compose other providers:
//!
//! - [`quickest_of`]: race all providers, first match wins
//! - [`with_first`] / [`first_matching`]: lowest submission index wins
//! - [`with_all`] / [`all_matching`]: every match, merged into a composite
//! - [`ResilientContentProvider`]: retries, circuit breaker and fallback
//!
//! Providers never hand out unavailable content. "Nothing" is `Ok(None)`,
//! never an error.

mod builder;
mod circuit_breaker;
mod http;
mod quickest;
mod resilient;
mod selector;
mod static_content;

pub use builder::ProviderBuilder;
pub use circuit_breaker::{CallPermit, CircuitBreaker, CircuitState};
pub use http::{HttpContentProvider, DEFAULT_ACCEPT};
pub use quickest::QuickestWins;
pub use resilient::ResilientContentProvider;
pub use selector::{SelectMatching, Selection};
pub use static_content::StaticContentProvider;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::app::{MontageError, Result};
use crate::domain::{Content, Parameters, Position};
use crate::tracer::Tracer;

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch the content of `position`.
    ///
    /// Returns `Ok(None)` when there is nothing to show and `Err` when the
    /// fetch failed. Implementations must filter out unavailable content.
    async fn get_content(
        &self,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Result<Option<Content>>;

    /// Short label used as the source of error content and trace events.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

pub type SharedProvider = Arc<dyn ContentProvider>;

/// Predicate deciding whether a content satisfies a selection.
pub type ContentMatcher = Arc<dyn Fn(&Content) -> bool + Send + Sync>;

pub fn is_available() -> ContentMatcher {
    Arc::new(Content::is_available)
}

/// Race all providers; the first available content wins.
pub fn quickest_of(providers: Vec<SharedProvider>) -> SharedProvider {
    Arc::new(QuickestWins::new(providers, is_available()))
}

/// Race all providers; the first content accepted by `matcher` wins.
pub fn quickest_matching(matcher: ContentMatcher, providers: Vec<SharedProvider>) -> SharedProvider {
    Arc::new(QuickestWins::new(providers, matcher))
}

/// The available content of the lowest-indexed provider.
pub fn with_first(providers: Vec<SharedProvider>) -> SharedProvider {
    first_matching(is_available(), providers)
}

pub fn first_matching(matcher: ContentMatcher, providers: Vec<SharedProvider>) -> SharedProvider {
    Arc::new(SelectMatching::new(Selection::First, providers, matcher))
}

/// All available contents, in provider order, as one composite.
pub fn with_all(providers: Vec<SharedProvider>) -> SharedProvider {
    all_matching(is_available(), providers)
}

pub fn all_matching(matcher: ContentMatcher, providers: Vec<SharedProvider>) -> SharedProvider {
    Arc::new(SelectMatching::new(Selection::All, providers, matcher))
}

pub fn static_text(text: impl Into<String>) -> SharedProvider {
    Arc::new(StaticContentProvider::new(text))
}

/// Calls `provider`, turning a panic into an error.
pub(crate) async fn fetch_guarded(
    provider: &dyn ContentProvider,
    position: &Position,
    tracer: &Tracer,
    parameters: &Parameters,
) -> Result<Option<Content>> {
    AssertUnwindSafe(provider.get_content(position, tracer, parameters))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(MontageError::ProviderPanicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_fetch_guarded_converts_panics() {
        let result = fetch_guarded(
            &PanickingProvider,
            &Position::from("a"),
            &Tracer::noop(),
            &Parameters::empty(),
        )
        .await;

        match result {
            Err(MontageError::ProviderPanicked(message)) => {
                assert_eq!(message, "provider exploded")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_guarded_passes_results_through() {
        let result = fetch_guarded(
            &DelayedProvider::new("Hello", 0),
            &Position::from("a"),
            &Tracer::noop(),
            &Parameters::empty(),
        )
        .await
        .unwrap();

        assert_eq!(result.map(|c| c.body().to_string()), Some("Hello".into()));
    }
}
