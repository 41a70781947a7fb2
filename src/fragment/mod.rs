//! Fragments bind positions to providers; a [`Page`] runs them together.
//!
//! A fragment is either a single position or a composite: a first position
//! whose content is turned into parameters for a set of nested positions,
//! fetched concurrently once the first one is known.

mod page;

pub use page::{Page, PageResult};

use std::sync::Arc;

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};

use crate::app::{MontageError, Result};
use crate::domain::{Content, Parameters, Position};
use crate::provider::{fetch_guarded, SharedProvider};
use crate::tracer::Tracer;

/// Derives the parameters of nested fragments from the first content.
pub type ParameterExtractor = Arc<dyn Fn(&Content) -> Parameters + Send + Sync>;

/// One position filled by one provider.
pub struct SingleFragment {
    position: Position,
    provider: SharedProvider,
}

impl SingleFragment {
    pub fn new(position: Position, provider: SharedProvider) -> Self {
        Self { position, provider }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Available content for this position, if any.
    ///
    /// Provider failures, panics included, are traced and swallowed.
    pub async fn fetch_with(&self, tracer: &Tracer, parameters: Parameters) -> Option<Content> {
        let content = match fetch_guarded(self.provider.as_ref(), &self.position, tracer, &parameters).await {
            Ok(content) => content,
            Err(e) => {
                let source = self.provider.describe();
                tracing::debug!("Fetching {} from {} failed: {}", self.position, source, e);
                tracer.error(&self.position, &source, e.to_string());
                Some(Content::error(self.position.clone(), source, &e))
            }
        };
        content.filter(Content::is_available)
    }
}

/// Nested fragments run with parameters extracted from a first content.
pub struct Continuation {
    extractor: ParameterExtractor,
    fragments: Vec<SingleFragment>,
}

impl Continuation {
    pub fn fragments(&self) -> &[SingleFragment] {
        &self.fragments
    }
}

pub enum Fragment {
    Single(SingleFragment),
    Composite {
        first: SingleFragment,
        continuation: Continuation,
    },
}

/// A fragment filling `position` with content from `provider`.
pub fn fragment(position: impl Into<Position>, provider: SharedProvider) -> Fragment {
    Fragment::Single(SingleFragment::new(position.into(), provider))
}

impl Fragment {
    /// Runs `nested` with the parameters `extractor` derives from this
    /// fragment's content, merged over the page parameters.
    ///
    /// Only one level of nesting is allowed, and `nested` must not be empty.
    pub fn followed_by<F>(self, extractor: F, nested: Vec<Fragment>) -> Result<Fragment>
    where
        F: Fn(&Content) -> Parameters + Send + Sync + 'static,
    {
        let Fragment::Single(first) = self else {
            return Err(MontageError::Config(
                "a composite fragment cannot be continued again".into(),
            ));
        };

        if nested.is_empty() {
            return Err(MontageError::Config(format!(
                "continuation of {} has no nested fragments",
                first.position
            )));
        }

        let mut fragments = Vec::with_capacity(nested.len());
        for fragment in nested {
            match fragment {
                Fragment::Single(single) => fragments.push(single),
                Fragment::Composite { first: inner, .. } => {
                    return Err(MontageError::Config(format!(
                        "nested fragment {} must not have a continuation",
                        inner.position
                    )))
                }
            }
        }

        Ok(Fragment::Composite {
            first,
            continuation: Continuation {
                extractor: Arc::new(extractor),
                fragments,
            },
        })
    }

    pub fn positions(&self) -> Vec<&Position> {
        match self {
            Fragment::Single(single) => vec![&single.position],
            Fragment::Composite {
                first,
                continuation,
            } => std::iter::once(&first.position)
                .chain(continuation.fragments.iter().map(|f| &f.position))
                .collect(),
        }
    }

    /// Available contents of every position of this fragment, as they arrive.
    pub fn fetch_with<'a>(&'a self, tracer: &'a Tracer, parameters: Parameters) -> BoxStream<'a, Content> {
        match self {
            Fragment::Single(single) => stream::once(single.fetch_with(tracer, parameters))
                .filter_map(future::ready)
                .boxed(),
            Fragment::Composite {
                first,
                continuation,
            } => stream::once(first.fetch_with(tracer, parameters.clone()))
                .filter_map(future::ready)
                .flat_map(move |content| {
                    let nested = parameters.with(&(continuation.extractor)(&content));
                    let nested_contents =
                        stream::select_all(continuation.fragments.iter().map(move |fragment| {
                            stream::once(fragment.fetch_with(tracer, nested.clone()))
                                .filter_map(future::ready)
                                .boxed()
                        }));
                    stream::once(future::ready(content))
                        .chain(nested_contents)
                        .boxed()
                })
                .boxed(),
        }
    }
}
