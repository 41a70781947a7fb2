use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Content, Parameters, Position};
use crate::provider::ContentProvider;
use crate::tracer::Tracer;

/// Always answers with the same text, for any position.
pub struct StaticContentProvider {
    text: String,
}

impl StaticContentProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ContentProvider for StaticContentProvider {
    async fn get_content(
        &self,
        position: &Position,
        _tracer: &Tracer,
        _parameters: &Parameters,
    ) -> Result<Option<Content>> {
        Ok(Some(Content::text(position.clone(), self.text.clone())).filter(Content::is_available))
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_text() {
        let content = tokio_test::block_on(StaticContentProvider::new("Fallback Content").get_content(
            &Position::from("a"),
            &Tracer::noop(),
            &Parameters::empty(),
        ))
        .unwrap()
        .unwrap();

        assert_eq!(content.body(), "Fallback Content");
        assert_eq!(content.position(), &Position::from("a"));
    }

    #[test]
    fn test_empty_static_text_yields_nothing() {
        let content = tokio_test::block_on(StaticContentProvider::new("").get_content(
            &Position::from("a"),
            &Tracer::noop(),
            &Parameters::empty(),
        ))
        .unwrap();

        assert!(content.is_none());
    }
}
