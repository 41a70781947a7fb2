use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::{Content, Position};

/// The winning content of every filled position of one page execution.
#[derive(Debug, Clone, Default)]
pub struct Contents {
    by_position: HashMap<Position, Content>,
}

impl Contents {
    /// Content for `position`, or [`Content::Missing`] if nothing filled it.
    pub fn get(&self, position: &Position) -> Content {
        self.by_position
            .get(position)
            .cloned()
            .unwrap_or_else(|| Content::missing(position.clone()))
    }

    /// Body for `position`, empty if nothing filled it.
    pub fn body(&self, position: &Position) -> &str {
        self.by_position
            .get(position)
            .map(Content::body)
            .unwrap_or("")
    }

    pub fn get_all(&self) -> Vec<&Content> {
        let mut all: Vec<_> = self.by_position.values().collect();
        all.sort_by(|a, b| a.position().cmp(b.position()));
        all
    }

    pub fn positions(&self) -> Vec<&Position> {
        let mut positions: Vec<_> = self.by_position.keys().collect();
        positions.sort();
        positions
    }

    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}

/// Shared accumulator fragments write into while a page executes.
///
/// The last content put for a position wins.
#[derive(Debug, Clone, Default)]
pub struct ContentsBuilder {
    inner: Arc<Mutex<HashMap<Position, Content>>>,
}

impl ContentsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, content: Content) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = map.insert(content.position().clone(), content) {
            tracing::warn!(
                "Position {} filled more than once, replacing content from {}",
                previous.position(),
                previous.source()
            );
        }
    }

    pub fn build(&self) -> Contents {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Contents {
            by_position: map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_position_resolves_to_missing_content() {
        let contents = ContentsBuilder::new().build();
        let content = contents.get(&Position::from("nowhere"));

        assert!(matches!(content, Content::Missing(_)));
        assert_eq!(content.position(), &Position::from("nowhere"));
        assert_eq!(contents.body(&Position::from("nowhere")), "");
        assert!(contents.is_empty());
    }

    #[test]
    fn test_latest_put_wins() {
        let builder = ContentsBuilder::new();
        builder.put(Content::text(Position::from("a"), "first"));
        builder.put(Content::text(Position::from("a"), "second"));
        builder.put(Content::text(Position::from("b"), "other"));

        let contents = builder.build();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents.body(&Position::from("a")), "second");
        assert_eq!(
            contents.positions(),
            vec![&Position::from("a"), &Position::from("b")]
        );
    }

    #[test]
    fn test_concurrent_puts() {
        let builder = ContentsBuilder::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let builder = builder.clone();
                std::thread::spawn(move || {
                    builder.put(Content::text(Position::new(format!("p{i}")), "x"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(builder.build().get_all().len(), 8);
    }
}
