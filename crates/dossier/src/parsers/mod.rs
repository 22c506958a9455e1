//! Documentation and manifest parsers.

pub mod manifest;
pub mod markdown;

pub use manifest::DependencyRecord;
pub use markdown::{DocParser, MarkdownParser, ParsedSection, ParserRegistry};
