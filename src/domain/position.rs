use std::fmt;

use serde::{Deserialize, Serialize};

/// Named slot of a page that a fragment fills with content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Position {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Position {
    fn from(name: String) -> Self {
        Self(name)
    }
}
