use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::{MontageError, Result};
use crate::domain::{Headers, Position};

/// Outcome category of a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,
    Empty,
    Error,
}

/// Content fetched from a backend service.
#[derive(Debug, Clone)]
pub struct SingleContent {
    position: Position,
    source: String,
    status: u16,
    body: String,
    headers: Headers,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl SingleContent {
    pub fn new(
        position: Position,
        source: impl Into<String>,
        status: u16,
        body: impl Into<String>,
        headers: Headers,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            position,
            source: source.into(),
            status,
            body: body.into(),
            headers,
            started_at,
            completed_at,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// 2xx with a body is available, 2xx without one is empty. Anything
    /// below 500 that is not a success counts as empty, 5xx as an error.
    pub fn availability(&self) -> Availability {
        if self.status < 300 {
            if self.body.is_empty() {
                Availability::Empty
            } else {
                Availability::Available
            }
        } else if self.status < 500 {
            Availability::Empty
        } else {
            Availability::Error
        }
    }
}

/// Two or more contents for the same position, kept in order.
#[derive(Debug, Clone)]
pub struct CompositeContent {
    position: Position,
    members: Vec<Content>,
    body: String,
    source: String,
    headers: Headers,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl CompositeContent {
    pub fn new(members: Vec<Content>) -> Result<Self> {
        if members.len() < 2 {
            return Err(MontageError::InvalidComposite(format!(
                "expected at least two contents, got {}",
                members.len()
            )));
        }

        let position = members[0].position().clone();
        if let Some(other) = members.iter().find(|c| c.position() != &position) {
            return Err(MontageError::InvalidComposite(format!(
                "mixed positions {} and {}",
                position,
                other.position()
            )));
        }

        let body = members
            .iter()
            .map(Content::body)
            .collect::<Vec<_>>()
            .join("\n");
        let source = members
            .iter()
            .map(Content::source)
            .collect::<Vec<_>>()
            .join(";");

        let mut headers = Headers::new();
        for member in &members {
            headers.merge(member.headers());
        }

        let started_at = members
            .iter()
            .map(Content::started_at)
            .min()
            .unwrap_or_else(Utc::now);
        let completed_at = members
            .iter()
            .map(Content::completed_at)
            .max()
            .unwrap_or_else(Utc::now);

        Ok(Self {
            position,
            members,
            body,
            source,
            headers,
            started_at,
            completed_at,
        })
    }

    pub fn members(&self) -> &[Content] {
        &self.members
    }

    pub fn availability(&self) -> Availability {
        if self.members.iter().any(Content::is_available) {
            Availability::Available
        } else if self
            .members
            .iter()
            .all(|c| c.availability() == Availability::Error)
        {
            Availability::Error
        } else {
            Availability::Empty
        }
    }
}

/// A provider failed while fetching this position.
#[derive(Debug, Clone)]
pub struct ErrorContent {
    position: Position,
    source: String,
    message: String,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl ErrorContent {
    pub fn new(
        position: Position,
        source: impl Into<String>,
        message: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            position,
            source: source.into(),
            message: message.into(),
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone)]
pub struct MissingContent {
    position: Position,
    created_at: DateTime<Utc>,
}

impl MissingContent {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            created_at: Utc::now(),
        }
    }
}

/// Literal text supplied in code or configuration, typically as a fallback.
#[derive(Debug, Clone)]
pub struct StaticContent {
    position: Position,
    text: String,
    created_at: DateTime<Utc>,
}

impl StaticContent {
    pub fn new(position: Position, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// The result of fetching one position.
///
/// Only [`Content::Single`], [`Content::Composite`] and [`Content::Static`]
/// can ever be available. Providers filter unavailable content before
/// handing it on, so consumers of a page only see available values.
#[derive(Debug, Clone)]
pub enum Content {
    Single(SingleContent),
    Composite(CompositeContent),
    Error(ErrorContent),
    Missing(MissingContent),
    Static(StaticContent),
}

impl Content {
    pub fn error(position: Position, source: impl Into<String>, error: &MontageError) -> Self {
        Content::Error(ErrorContent::new(
            position,
            source,
            error.to_string(),
            Utc::now(),
        ))
    }

    pub fn missing(position: Position) -> Self {
        Content::Missing(MissingContent::new(position))
    }

    pub fn text(position: Position, text: impl Into<String>) -> Self {
        Content::Static(StaticContent::new(position, text))
    }

    pub fn composite(members: Vec<Content>) -> Result<Self> {
        CompositeContent::new(members).map(Content::Composite)
    }

    pub fn position(&self) -> &Position {
        match self {
            Content::Single(c) => &c.position,
            Content::Composite(c) => &c.position,
            Content::Error(c) => &c.position,
            Content::Missing(c) => &c.position,
            Content::Static(c) => &c.position,
        }
    }

    /// Diagnostic identifier of where the content came from, usually a URL.
    pub fn source(&self) -> &str {
        match self {
            Content::Single(c) => &c.source,
            Content::Composite(c) => &c.source,
            Content::Error(c) => &c.source,
            Content::Missing(_) => "",
            Content::Static(_) => "static",
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Content::Single(c) => &c.body,
            Content::Composite(c) => &c.body,
            Content::Static(c) => &c.text,
            Content::Error(_) | Content::Missing(_) => "",
        }
    }

    pub fn headers(&self) -> &Headers {
        static NO_HEADERS: Headers = Headers::EMPTY;
        match self {
            Content::Single(c) => &c.headers,
            Content::Composite(c) => &c.headers,
            _ => &NO_HEADERS,
        }
    }

    pub fn availability(&self) -> Availability {
        match self {
            Content::Single(c) => c.availability(),
            Content::Composite(c) => c.availability(),
            Content::Error(_) => Availability::Error,
            Content::Missing(_) => Availability::Empty,
            Content::Static(c) if c.text.is_empty() => Availability::Empty,
            Content::Static(_) => Availability::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability() == Availability::Available
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        match self {
            Content::Single(c) => c.started_at,
            Content::Composite(c) => c.started_at,
            Content::Error(c) => c.started_at,
            Content::Missing(c) => c.created_at,
            Content::Static(c) => c.created_at,
        }
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        match self {
            Content::Single(c) => c.completed_at,
            Content::Composite(c) => c.completed_at,
            Content::Error(c) => c.completed_at,
            Content::Missing(c) => c.created_at,
            Content::Static(c) => c.created_at,
        }
    }

    /// The aggregated contents of a composite, or this content alone.
    pub fn members(&self) -> &[Content] {
        match self {
            Content::Composite(c) => c.members(),
            other => std::slice::from_ref(other),
        }
    }
}

/// Content tagged with the order its provider was submitted in.
#[derive(Debug, Clone)]
pub(crate) struct IndexedContent {
    pub index: usize,
    pub content: Content,
}

impl IndexedContent {
    pub fn new(index: usize, content: Content) -> Self {
        Self { index, content }
    }
}
