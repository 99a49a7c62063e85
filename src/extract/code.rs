//! Code element data model

use super::{Element, ElementKind, Strategy};
use serde::{Deserialize, Serialize};

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<String>,
    /// Default expression as written
    pub default: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_annotation: None,
            default: None,
        }
    }
}

/// Route path recorded when it is not statically determinable
pub const UNKNOWN_ENDPOINT: &str = "unknown";

/// HTTP endpoint metadata for `ApiEndpoint` elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    /// Route path, or "unknown" when not statically determinable
    pub endpoint: String,
    /// Uppercase HTTP verb
    pub method: String,
}

impl std::fmt::Display for ApiInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}

/// A method declared on a class or type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub is_private: bool,
}

/// A construct extracted from source code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeElement {
    pub name: String,
    pub kind: ElementKind,
    /// File path relative to the project root
    pub file_path: String,
    /// 1-based line where the declaration starts
    pub line_number: usize,
    pub strategy: Strategy,
    pub signature: Option<String>,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    /// Attached documentation comment, if any
    pub docstring: Option<String>,
    pub api_info: Option<ApiInfo>,
    /// Methods, for `Class` elements
    pub methods: Vec<MethodInfo>,
    /// Imported names, for `Import` elements
    pub imports: Vec<String>,
    /// Source module of a `from`-style import
    pub import_from: Option<String>,
    /// Verbatim source lines of the declaration
    pub code_snippet: Option<String>,
}

impl Element for CodeElement {
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

impl CodeElement {
    /// Create an element; the file path is stamped later by the registry
    pub fn new(name: &str, kind: ElementKind, line_number: usize, strategy: Strategy) -> Self {
        Self {
            name: name.to_string(),
            kind,
            file_path: String::new(),
            line_number,
            strategy,
            signature: None,
            parameters: Vec::new(),
            return_type: None,
            docstring: None,
            api_info: None,
            methods: Vec::new(),
            imports: Vec::new(),
            import_from: None,
            code_snippet: None,
        }
    }

    /// Whether this kind is expected to be documented
    pub fn is_documentable(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Function | ElementKind::Class | ElementKind::ApiEndpoint
        )
    }
}

/// Source lines `start..=end` (1-based), joined verbatim
pub(crate) fn snippet(source: &str, start: usize, end: usize) -> String {
    source
        .lines()
        .skip(start.saturating_sub(1))
        .take(end.saturating_sub(start) + 1)
        .collect::<Vec<_>>()
        .join("\n")
}
