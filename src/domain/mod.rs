pub mod content;
pub mod contents;
pub mod headers;
pub mod parameters;
pub mod position;

pub use content::{
    Availability, CompositeContent, Content, ErrorContent, MissingContent, SingleContent,
    StaticContent,
};
pub(crate) use content::IndexedContent;
pub use contents::{Contents, ContentsBuilder};
pub use headers::Headers;
pub use parameters::Parameters;
pub use position::Position;
