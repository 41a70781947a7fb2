use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};

use crate::app::Result;
use crate::domain::{Content, IndexedContent, Parameters, Position};
use crate::provider::{fetch_guarded, ContentMatcher, ContentProvider, SharedProvider};
use crate::tracer::Tracer;

/// Races its providers and returns the first content accepted by the matcher.
///
/// Providers still running when a winner is found are dropped with the
/// race; their results are never looked at.
pub struct QuickestWins {
    providers: Vec<SharedProvider>,
    matcher: ContentMatcher,
}

impl QuickestWins {
    pub fn new(providers: Vec<SharedProvider>, matcher: ContentMatcher) -> Self {
        Self { providers, matcher }
    }
}

#[async_trait]
impl ContentProvider for QuickestWins {
    async fn get_content(
        &self,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Result<Option<Content>> {
        let mut race: FuturesUnordered<_> = self
            .providers
            .iter()
            .enumerate()
            .map(|(index, provider)| async move {
                (
                    index,
                    fetch_guarded(provider.as_ref(), position, tracer, parameters).await,
                )
            })
            .collect();

        while let Some((index, result)) = race.next().await {
            match result {
                Ok(Some(content)) => {
                    let candidate = IndexedContent::new(index, content);
                    if (self.matcher)(&candidate.content) {
                        tracing::debug!(
                            "Provider {} won the race for {}",
                            candidate.index,
                            position
                        );
                        return Ok(Some(candidate.content));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracer.error(position, &self.providers[index].describe(), e.to_string());
                }
            }
        }

        Ok(None)
    }

    fn describe(&self) -> String {
        format!("quickest of {}", self.providers.len())
    }
}
