//! Heading-based Markdown segmentation.
//!
//! A document is cut at every ATX heading (`#` to `######`). Each heading
//! becomes one [`ParsedSection`] whose body is the text up to the next
//! heading. Heading depth maps to a [`DocLevel`] and the heading text to a
//! [`SectionType`].

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::entity::prelude::{DocLevel, SectionType};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})\s+(.+)$").expect("heading pattern is valid"));

/// Title given to a document without headings.
pub const UNTITLED_SECTION: &str = "Content";

/// One section cut out of a document, before it is attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedSection {
    pub title: String,
    pub content: String,
    pub level: DocLevel,
    pub section_type: SectionType,
    pub source_file: Option<String>,
    pub order: i32,
}

/// A parser for one family of documentation formats.
pub trait DocParser: Send + Sync {
    /// Lower-case extensions including the dot, e.g. `.md`.
    fn supported_extensions(&self) -> &[&'static str];

    fn parse(&self, content: &str, source_file: Option<&str>) -> Vec<ParsedSection>;

    fn can_parse(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = format!(".{}", ext.to_lowercase());
        self.supported_extensions().contains(&ext.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl DocParser for MarkdownParser {
    fn supported_extensions(&self) -> &[&'static str] {
        &[".md", ".markdown"]
    }

    fn parse(&self, content: &str, source_file: Option<&str>) -> Vec<ParsedSection> {
        let source_file = source_file.map(str::to_string);
        let headings: Vec<_> = HEADING.captures_iter(content).collect();

        if headings.is_empty() {
            return vec![ParsedSection {
                title: UNTITLED_SECTION.to_string(),
                content: content.trim().to_string(),
                level: DocLevel::Detailed,
                section_type: SectionType::General,
                source_file,
                order: 0,
            }];
        }

        headings
            .iter()
            .enumerate()
            .map(|(i, caps)| {
                let depth = caps.get(1).map_or(1, |m| m.as_str().len());
                let title = caps.get(2).map_or("", |m| m.as_str()).trim();
                let start = caps.get(0).map_or(0, |m| m.end());
                let end = headings
                    .get(i + 1)
                    .and_then(|next| next.get(0))
                    .map_or(content.len(), |m| m.start());

                ParsedSection {
                    title: title.to_string(),
                    content: content[start..end].trim().to_string(),
                    level: DocLevel::from_heading_depth(depth),
                    section_type: SectionType::infer(title),
                    source_file: source_file.clone(),
                    order: i32::try_from(i).unwrap_or(i32::MAX),
                }
            })
            .collect()
    }
}

/// Picks a parser by file extension.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocParser>>,
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("parsers", &self.parsers.len())
            .finish()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(MarkdownParser));
        registry
    }
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    pub fn register(&mut self, parser: Box<dyn DocParser>) {
        self.parsers.push(parser);
    }

    /// First registered parser that accepts `path`.
    pub fn parser_for(&self, path: &Path) -> Option<&dyn DocParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(path))
            .map(|p| p.as_ref())
    }
}
