//! Code and documentation element extraction
//!
//! This module turns retained files into elements:
//! - Source files, via tree-sitter where a grammar is available and regex
//!   heuristics otherwise
//! - Documentation files (Markdown, reStructuredText, plain text)
//!
//! Extractors are registered by extension in an [`ExtractorRegistry`].

pub mod code;
pub mod doc;
pub mod lexical;
pub mod python;
pub mod rust_lang;

pub use code::{ApiInfo, CodeElement, MethodInfo, Parameter, UNKNOWN_ENDPOINT};
pub use doc::{DocElement, MarkdownExtractor, PlainTextExtractor, RstExtractor};
pub use lexical::ScriptExtractor;
pub use python::PythonExtractor;
pub use rust_lang::RustExtractor;

use crate::config::ExtractConfig;
use crate::error::ScanError;
use crate::filter::to_slash;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Kind of an extracted element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Function,
    Class,
    ApiEndpoint,
    Import,
    Configuration,
    DocHeading,
    DocCodeBlock,
    /// The single whole-document record of a documentation file
    Documentation,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Function => write!(f, "function"),
            ElementKind::Class => write!(f, "class"),
            ElementKind::ApiEndpoint => write!(f, "api_endpoint"),
            ElementKind::Import => write!(f, "import"),
            ElementKind::Configuration => write!(f, "configuration"),
            ElementKind::DocHeading => write!(f, "doc_heading"),
            ElementKind::DocCodeBlock => write!(f, "doc_code_block"),
            ElementKind::Documentation => write!(f, "documentation"),
        }
    }
}

/// How an element was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// From a parser's syntax tree
    Structural,
    /// From line and regex heuristics; may miss or misattribute declarations
    Lexical,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Structural => write!(f, "structural"),
            Strategy::Lexical => write!(f, "lexical"),
        }
    }
}

/// Common trait for all extracted elements
pub trait Element {
    /// Element name (file stem for whole-document records)
    fn name(&self) -> &str;

    fn kind(&self) -> ElementKind;

    /// Path relative to the project root, `/`-separated
    fn file_path(&self) -> &str;

    /// 1-based source line
    fn line_number(&self) -> usize;
}

/// Elements produced from one file
#[derive(Debug, Clone)]
pub enum Extracted {
    Code(Vec<CodeElement>),
    Docs(Vec<DocElement>),
}

impl Extracted {
    pub fn len(&self) -> usize {
        match self {
            Extracted::Code(elements) => elements.len(),
            Extracted::Docs(elements) => elements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stamp the originating file and order elements by source position
    fn stamp(&mut self, file_path: &str) {
        match self {
            Extracted::Code(elements) => {
                for element in elements.iter_mut() {
                    element.file_path = file_path.to_string();
                }
                elements.sort_by_key(|e| e.line_number);
            }
            Extracted::Docs(elements) => {
                for element in elements.iter_mut() {
                    element.file_path = file_path.to_string();
                }
                elements.sort_by_key(|e| e.line_number);
            }
        }
    }
}

/// One extraction strategy for a family of file extensions
pub trait Extractor {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Lowercase extensions (without the dot) this extractor handles
    fn extensions(&self) -> &'static [&'static str];

    fn strategy(&self) -> Strategy;

    /// Extract elements from file content.
    ///
    /// `path` is only used for naming and error reporting; the content is
    /// already read.
    fn extract(&mut self, path: &Path, content: &str) -> Result<Extracted, ScanError>;
}

/// Maps file extensions to extractors
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
    by_extension: HashMap<String, usize>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in extractor
    pub fn with_defaults(config: &ExtractConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(PythonExtractor::new(config)?));
        registry.register(Box::new(RustExtractor::new(config)?));
        registry.register(Box::new(ScriptExtractor::new(config)));
        registry.register(Box::new(MarkdownExtractor::new(config)));
        registry.register(Box::new(RstExtractor::new(config)));
        registry.register(Box::new(PlainTextExtractor::new(config)));
        Ok(registry)
    }

    /// Add an extractor; it takes over any extension already claimed
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        let index = self.extractors.len();
        for ext in extractor.extensions() {
            self.by_extension.insert(ext.to_string(), index);
        }
        self.extractors.push(extractor);
    }

    fn index_for(&self, path: &Path) -> Option<usize> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        self.by_extension.get(&ext).copied()
    }

    /// Whether some extractor handles this path
    pub fn supports(&self, path: &Path) -> bool {
        self.index_for(path).is_some()
    }

    /// The extractor registered for this path
    pub fn extractor_for(&self, path: &Path) -> Option<&dyn Extractor> {
        self.index_for(path).map(|i| self.extractors[i].as_ref())
    }

    /// Extract one file. Returns `None` when no extractor handles it.
    ///
    /// Elements are stamped with `relative` and sorted by line.
    pub fn extract(
        &mut self,
        relative: &Path,
        content: &str,
    ) -> Option<Result<Extracted, ScanError>> {
        let index = self.index_for(relative)?;
        let extractor = &mut self.extractors[index];
        tracing::trace!("Extracting {:?} with {}", relative, extractor.name());

        let file_path = to_slash(relative);
        Some(extractor.extract(relative, content).map(|mut extracted| {
            extracted.stamp(&file_path);
            extracted
        }))
    }
}

/// 1-based line of a byte offset
pub(crate) fn line_at(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset.min(content.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Longest prefix of at most `max_chars` characters
pub(crate) fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => content[..end].to_string(),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_dispatch_by_extension() {
        let registry = ExtractorRegistry::with_defaults(&ExtractConfig::default()).unwrap();

        let python = registry.extractor_for(Path::new("src/app.py")).unwrap();
        assert_eq!(python.strategy(), Strategy::Structural);

        let script = registry.extractor_for(Path::new("web/App.TSX")).unwrap();
        assert_eq!(script.strategy(), Strategy::Lexical);

        assert!(registry.supports(Path::new("README.md")));
        assert!(registry.supports(Path::new("notes.txt")));
        assert!(!registry.supports(Path::new("config.yaml")));
        assert!(!registry.supports(Path::new("Makefile")));
    }

    #[test]
    fn test_registry_stamps_relative_path() {
        let mut registry = ExtractorRegistry::with_defaults(&ExtractConfig::default()).unwrap();
        let extracted = registry
            .extract(Path::new("docs/guide.md"), "# Intro\n\ntext\n")
            .unwrap()
            .unwrap();

        let Extracted::Docs(docs) = extracted else {
            panic!("expected documentation elements");
        };
        assert!(docs.iter().all(|d| d.file_path == "docs/guide.md"));
    }

    #[test]
    fn test_registry_unsupported() {
        let mut registry = ExtractorRegistry::with_defaults(&ExtractConfig::default()).unwrap();
        assert!(registry.extract(Path::new("data.csv"), "a,b").is_none());
    }

    #[test]
    fn test_line_at() {
        let content = "a\nb\nc";
        assert_eq!(line_at(content, 0), 1);
        assert_eq!(line_at(content, 2), 2);
        assert_eq!(line_at(content, 4), 3);
        assert_eq!(line_at(content, 100), 3);
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("äöü", 2), "äö");
        assert_eq!(preview("abc", 10), "abc");
    }
}
