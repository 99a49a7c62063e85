//! Documentation extraction
//!
//! Extracts headings, fenced code blocks and one whole-document record per
//! file:
//! - Markdown is parsed with pulldown-cmark
//! - reStructuredText headings are found by their underlines
//! - Plain text yields only the whole-document record

use super::{line_at, preview, Element, ElementKind, Extracted, Extractor, Strategy};
use crate::config::ExtractConfig;
use crate::error::ScanError;
use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel as CmarkHeadingLevel, Parser, Tag, TagEnd,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Heading level in documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
    H4 = 4,
    H5 = 5,
    H6 = 6,
}

impl HeadingLevel {
    /// Level from a nesting depth, clamped to 1..=6
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            4 => HeadingLevel::H4,
            5 => HeadingLevel::H5,
            _ => HeadingLevel::H6,
        }
    }

    pub fn depth(&self) -> usize {
        *self as usize
    }
}

impl From<CmarkHeadingLevel> for HeadingLevel {
    fn from(level: CmarkHeadingLevel) -> Self {
        match level {
            CmarkHeadingLevel::H1 => HeadingLevel::H1,
            CmarkHeadingLevel::H2 => HeadingLevel::H2,
            CmarkHeadingLevel::H3 => HeadingLevel::H3,
            CmarkHeadingLevel::H4 => HeadingLevel::H4,
            CmarkHeadingLevel::H5 => HeadingLevel::H5,
            CmarkHeadingLevel::H6 => HeadingLevel::H6,
        }
    }
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "H{}", *self as u8)
    }
}

/// A construct extracted from documentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocElement {
    pub name: String,
    pub kind: ElementKind,
    /// File path relative to the project root
    pub file_path: String,
    pub line_number: usize,
    pub strategy: Strategy,
    /// Heading line, code block body, or document preview
    pub content: String,
    /// Entire file text, whole-document records only
    pub full_content: Option<String>,
    pub heading_level: Option<HeadingLevel>,
    pub code_block_language: Option<String>,
}

impl Element for DocElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn file_path(&self) -> &str {
        &self.file_path
    }

    fn line_number(&self) -> usize {
        self.line_number
    }
}

impl DocElement {
    fn new(
        name: &str,
        kind: ElementKind,
        line_number: usize,
        strategy: Strategy,
        content: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            file_path: String::new(),
            line_number,
            strategy,
            content,
            full_content: None,
            heading_level: None,
            code_block_language: None,
        }
    }

    fn heading(
        name: &str,
        level: HeadingLevel,
        line: usize,
        strategy: Strategy,
        content: String,
    ) -> Self {
        let mut element = Self::new(name, ElementKind::DocHeading, line, strategy, content);
        element.heading_level = Some(level);
        element
    }

    /// The per-file record: named after the file stem, with a bounded preview
    fn whole_document(
        path: &Path,
        content: &str,
        preview_chars: usize,
        strategy: Strategy,
    ) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut element = Self::new(
            &stem,
            ElementKind::Documentation,
            1,
            strategy,
            preview(content, preview_chars),
        );
        element.full_content = Some(content.to_string());
        element
    }
}

/// Extracts headings and fenced code blocks from Markdown
pub struct MarkdownExtractor {
    preview_chars: usize,
}

impl MarkdownExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            preview_chars: config.doc_preview_chars,
        }
    }

    fn parse_elements(&self, content: &str) -> Vec<DocElement> {
        let mut elements = Vec::new();

        let mut heading: Option<(HeadingLevel, usize, String)> = None;
        let mut code_block: Option<(String, usize, String)> = None;

        for (event, range) in Parser::new(content).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading = Some((level.into(), range.start, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    let Some((level, start, text)) = heading.take() else {
                        continue;
                    };
                    let name = text.trim();
                    if name.is_empty() {
                        continue;
                    }
                    let line = line_at(content, start);
                    let raw = content.lines().nth(line - 1).unwrap_or(name).trim();
                    elements.push(DocElement::heading(
                        name,
                        level,
                        line,
                        Strategy::Structural,
                        raw.to_string(),
                    ));
                }
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    let language = info
                        .split_whitespace()
                        .next()
                        .unwrap_or("text")
                        .to_string();
                    code_block = Some((language, line_at(content, range.start), String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    let Some((language, line, body)) = code_block.take() else {
                        continue;
                    };
                    let mut element = DocElement::new(
                        &format!("Code block ({})", language),
                        ElementKind::DocCodeBlock,
                        line,
                        Strategy::Structural,
                        body.trim().to_string(),
                    );
                    element.code_block_language = Some(language);
                    elements.push(element);
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, _, buf)) = heading.as_mut() {
                        buf.push_str(&text);
                    } else if let Some((_, _, buf)) = code_block.as_mut() {
                        buf.push_str(&text);
                    }
                }
                _ => {}
            }
        }

        elements
    }
}

impl Extractor for MarkdownExtractor {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["md", "markdown", "mdx"]
    }

    fn strategy(&self) -> Strategy {
        Strategy::Structural
    }

    fn extract(&mut self, path: &Path, content: &str) -> Result<Extracted, ScanError> {
        let mut elements = self.parse_elements(content);
        elements.push(DocElement::whole_document(
            path,
            content,
            self.preview_chars,
            Strategy::Structural,
        ));
        Ok(Extracted::Docs(elements))
    }
}

/// Extracts underlined headings from reStructuredText
pub struct RstExtractor {
    preview_chars: usize,
    min_underline_len: usize,
}

impl RstExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            preview_chars: config.doc_preview_chars,
            min_underline_len: config.min_underline_len.max(1),
        }
    }

    /// The repeated character when `line` is a valid underline
    fn underline_char(&self, line: &str) -> Option<char> {
        let line = line.trim_end();
        let first = line.chars().next()?;
        if !first.is_ascii_punctuation() || line.chars().count() < self.min_underline_len {
            return None;
        }
        line.chars().all(|c| c == first).then_some(first)
    }

    fn parse_headings(&self, content: &str) -> Vec<DocElement> {
        let lines: Vec<&str> = content.lines().collect();
        // Levels follow the order in which underline styles first appear
        let mut styles: Vec<char> = Vec::new();
        let mut elements = Vec::new();

        let mut i = 0;
        while i + 1 < lines.len() {
            let title = lines[i];
            let is_title = !title.trim().is_empty()
                && !title.starts_with(char::is_whitespace)
                && self.underline_char(title).is_none();

            if let Some(marker) = self.underline_char(lines[i + 1]).filter(|_| is_title) {
                let depth = match styles.iter().position(|&c| c == marker) {
                    Some(index) => index + 1,
                    None => {
                        styles.push(marker);
                        styles.len()
                    }
                };

                elements.push(DocElement::heading(
                    title.trim(),
                    HeadingLevel::from_depth(depth),
                    i + 1,
                    Strategy::Lexical,
                    format!("{}\n{}", title, lines[i + 1]),
                ));
                i += 2;
            } else {
                i += 1;
            }
        }

        elements
    }
}

impl Extractor for RstExtractor {
    fn name(&self) -> &'static str {
        "restructuredtext"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rst"]
    }

    fn strategy(&self) -> Strategy {
        Strategy::Lexical
    }

    fn extract(&mut self, path: &Path, content: &str) -> Result<Extracted, ScanError> {
        let mut elements = self.parse_headings(content);
        elements.push(DocElement::whole_document(
            path,
            content,
            self.preview_chars,
            Strategy::Lexical,
        ));
        Ok(Extracted::Docs(elements))
    }
}

/// Plain text: a single whole-document record with a larger preview
pub struct PlainTextExtractor {
    preview_chars: usize,
}

impl PlainTextExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            preview_chars: config.text_preview_chars,
        }
    }
}

impl Extractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["txt"]
    }

    fn strategy(&self) -> Strategy {
        Strategy::Lexical
    }

    fn extract(&mut self, path: &Path, content: &str) -> Result<Extracted, ScanError> {
        Ok(Extracted::Docs(vec![DocElement::whole_document(
            path,
            content,
            self.preview_chars,
            Strategy::Lexical,
        )]))
    }
}
