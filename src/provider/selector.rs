use async_trait::async_trait;
use futures::future::join_all;

use crate::app::Result;
use crate::domain::{Content, IndexedContent, Parameters, Position};
use crate::provider::{fetch_guarded, ContentMatcher, ContentProvider, SharedProvider};
use crate::tracer::Tracer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The matching content of the lowest-indexed provider
    First,
    /// Every matching content, in provider order
    All,
}

/// Waits for all providers, then selects matches by submission order.
///
/// The outcome never depends on which provider answered first.
pub struct SelectMatching {
    selection: Selection,
    providers: Vec<SharedProvider>,
    matcher: ContentMatcher,
}

impl SelectMatching {
    pub fn new(selection: Selection, providers: Vec<SharedProvider>, matcher: ContentMatcher) -> Self {
        Self {
            selection,
            providers,
            matcher,
        }
    }

    async fn collect_matching(
        &self,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Vec<IndexedContent> {
        let results = join_all(self.providers.iter().enumerate().map(
            |(index, provider)| async move {
                let content = match fetch_guarded(provider.as_ref(), position, tracer, parameters).await {
                    Ok(content) => content,
                    Err(e) => {
                        let source = provider.describe();
                        tracer.error(position, &source, e.to_string());
                        Some(Content::error(position.clone(), source, &e))
                    }
                };
                content.map(|content| IndexedContent::new(index, content))
            },
        ))
        .await;

        let mut matching: Vec<IndexedContent> = results
            .into_iter()
            .flatten()
            .filter(|candidate| (self.matcher)(&candidate.content))
            .collect();
        matching.sort_by_key(|candidate| candidate.index);
        matching
    }
}

#[async_trait]
impl ContentProvider for SelectMatching {
    async fn get_content(
        &self,
        position: &Position,
        tracer: &Tracer,
        parameters: &Parameters,
    ) -> Result<Option<Content>> {
        let mut matching = self.collect_matching(position, tracer, parameters).await;

        let selected = match self.selection {
            Selection::First => matching.into_iter().next().map(|c| c.content),
            Selection::All => {
                matching.truncate(self.providers.len());
                match matching.len() {
                    0 => None,
                    1 => matching.pop().map(|c| c.content),
                    _ => {
                        let members = matching.into_iter().map(|c| c.content).collect();
                        Some(Content::composite(members)?)
                    }
                }
            }
        };

        // a permissive matcher may select error content; it is never handed on
        Ok(selected.filter(Content::is_available))
    }

    fn describe(&self) -> String {
        let kind = match self.selection {
            Selection::First => "first",
            Selection::All => "all",
        };
        format!("{} of {}", kind, self.providers.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::Availability;
    use crate::provider::testing::{DelayedProvider, FailingProvider, PanickingProvider};
    use crate::provider::{all_matching, first_matching, with_all, with_first};

    async fn fetch(provider: SharedProvider) -> Option<Content> {
        provider
            .get_content(&Position::from("a"), &Tracer::noop(), &Parameters::empty())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_is_lowest_index_regardless_of_completion_order() {
        let provider = with_first(vec![
            DelayedProvider::shared("X", 80),
            DelayedProvider::shared("", 5),
            DelayedProvider::shared("", 1),
        ]);

        assert_eq!(fetch(provider).await.unwrap().body(), "X");
    }

    #[tokio::test]
    async fn test_first_skips_unavailable_lower_indices() {
        let provider = with_first(vec![
            DelayedProvider::shared("", 1),
            DelayedProvider::shared("Second", 60),
            DelayedProvider::shared("Third", 1),
        ]);

        assert_eq!(fetch(provider).await.unwrap().body(), "Second");
    }

    #[tokio::test]
    async fn test_first_with_nothing_matching() {
        let provider = with_first(vec![
            DelayedProvider::shared("", 1),
            Arc::new(FailingProvider::server_error()),
        ]);

        assert!(fetch(provider).await.is_none());
    }

    #[tokio::test]
    async fn test_all_builds_composite_in_submission_order() {
        let provider = with_all(vec![
            DelayedProvider::shared("Hello", 60),
            DelayedProvider::shared("World", 1),
        ]);

        let content = fetch(provider).await.unwrap();
        assert!(matches!(content, Content::Composite(_)));
        assert_eq!(content.body(), "Hello\nWorld");
        assert_eq!(content.members().len(), 2);
    }

    #[tokio::test]
    async fn test_all_with_single_match_is_unwrapped() {
        let provider = with_all(vec![
            DelayedProvider::shared("", 1),
            DelayedProvider::shared("Only", 1),
        ]);

        let content = fetch(provider).await.unwrap();
        assert!(matches!(content, Content::Single(_)));
        assert_eq!(content.body(), "Only");
    }

    #[tokio::test]
    async fn test_all_with_no_match() {
        let provider = with_all(vec![DelayedProvider::shared("", 1)]);
        assert!(fetch(provider).await.is_none());
    }

    #[tokio::test]
    async fn test_failures_are_traced_but_never_emitted() {
        let tracer = Tracer::new();
        let provider = all_matching(
            Arc::new(|c: &Content| c.availability() != Availability::Empty),
            vec![
                Arc::new(FailingProvider::server_error()) as SharedProvider,
                Arc::new(PanickingProvider),
            ],
        );

        let content = provider
            .get_content(&Position::from("a"), &tracer, &Parameters::empty())
            .await
            .unwrap();

        assert!(content.is_none());
        assert_eq!(tracer.statistics().num_errors, 2);
    }

    #[tokio::test]
    async fn test_permissive_first_does_not_emit_error_content() {
        let provider = first_matching(
            Arc::new(|_: &Content| true),
            vec![Arc::new(FailingProvider::server_error()) as SharedProvider],
        );

        assert!(fetch(provider).await.is_none());
    }

    #[tokio::test]
    async fn test_composite_with_an_error_member_stays_available() {
        let provider = all_matching(
            Arc::new(|_: &Content| true),
            vec![
                DelayedProvider::shared("Hello", 1),
                Arc::new(FailingProvider::server_error()),
            ],
        );

        let content = fetch(provider).await.unwrap();
        assert!(content.is_available());
        assert_eq!(content.members().len(), 2);
    }

    #[tokio::test]
    async fn test_first_matching_custom_predicate() {
        let provider = first_matching(
            Arc::new(|c: &Content| c.body().len() > 3),
            vec![
                DelayedProvider::shared("abc", 1),
                DelayedProvider::shared("abcd", 1),
            ],
        );

        assert_eq!(fetch(provider).await.unwrap().body(), "abcd");
    }
}
