//! Lexical extraction for JavaScript and TypeScript
//!
//! No grammar is bundled for these languages, so declarations are
//! approximated with line-anchored regular expressions. The results are
//! tagged [`Strategy::Lexical`]: declarations spread over several lines, or
//! written in unusual styles, may be missed or attributed to the wrong class.

use super::code::snippet;
use super::{
    line_at, CodeElement, ElementKind, Extracted, Extractor, MethodInfo, Parameter, Strategy,
};
use crate::config::ExtractConfig;
use crate::error::ScanError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::path::Path;

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        concat!(
            r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:async\s+)?",
            r"function\s*\*?\s*([A-Za-z_$][\w$]*)\s*(?:<[^>(]*>)?",
            r"\s*\(([^)]*)\)(?:\s*:\s*([^{;]+?))?\s*\{",
        ),
    )
    .expect("valid function regex")
});

/// `const name = function (...)`, `const name = (...) =>`, `const name = x =>`
static BOUND_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        concat!(
            r"(?m)^[ \t]*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)",
            r"\s*(?::[^=]+)?=\s*(?:async\s+)?",
            r"(?:function\s*\*?\s*(?:[A-Za-z_$][\w$]*)?\s*\(([^)]*)\)",
            r"|\(([^)]*)\)(?:\s*:\s*([^=]+?))?\s*=>",
            r"|([A-Za-z_$][\w$]*)\s*=>)",
        ),
    )
    .expect("valid bound function regex")
});

static CLASS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)",
    )
    .expect("valid class regex")
});

/// Indented `name(...) {` lines, taken as methods of the preceding class
static METHOD_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        concat!(
            r"(?m)^[ \t]+(?:(?:public|private|protected|static|async|readonly|get|set)\s+)*",
            r"(#?[A-Za-z_$][\w$]*)\s*\(([^)]*)\)(?:\s*:\s*([^{;]+?))?\s*\{",
        ),
    )
    .expect("valid method regex")
});

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+(?:(?:type\s+)?(.+?)\s+from\s+)?['"]([^'"]+)['"]"#)
        .expect("valid import regex")
});

static REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        concat!(
            r"(?m)^[ \t]*(?:const|let|var)\s+(\{[^}]*\}|[A-Za-z_$][\w$]*)",
            r#"\s*=\s*require\(\s*['"]([^'"]+)['"]\s*\)"#,
        ),
    )
    .expect("valid require regex")
});

const NOT_METHODS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "return", "function", "else",
];

/// Regex-based extractor for JavaScript and TypeScript
pub struct ScriptExtractor {
    private_marker: char,
}

impl ScriptExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            private_marker: config.private_marker,
        }
    }

    fn extract_functions(&self, content: &str, elements: &mut Vec<CodeElement>) {
        for caps in FUNCTION_DECL.captures_iter(content) {
            let mut element = function_element(content, &caps, 1);
            element.parameters = parse_parameters(caps.get(2).map_or("", |m| m.as_str()));
            element.return_type = caps.get(3).map(|m| m.as_str().trim().to_string());
            elements.push(element);
        }

        for caps in BOUND_FUNCTION.captures_iter(content) {
            let mut element = function_element(content, &caps, 1);
            let params = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(5))
                .map_or("", |m| m.as_str());
            element.parameters = parse_parameters(params);
            element.return_type = caps.get(4).map(|m| m.as_str().trim().to_string());
            elements.push(element);
        }
    }

    fn extract_classes(&self, content: &str, elements: &mut Vec<CodeElement>) {
        let mut classes: Vec<CodeElement> = CLASS_DECL
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str();
                let line = line_at(content, whole.start());
                let mut element =
                    CodeElement::new(name, ElementKind::Class, line, Strategy::Lexical);
                element.signature = Some(whole.as_str().trim().to_string());
                element.code_snippet = Some(snippet(content, line, line));
                Some(element)
            })
            .collect();

        if !classes.is_empty() {
            for caps in METHOD_DECL.captures_iter(content) {
                let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                    continue;
                };
                if NOT_METHODS.contains(&name) {
                    continue;
                }
                let line = line_at(content, caps.get(0).map_or(0, |m| m.start()));

                // Attribute the method to the nearest class declared above it
                if let Some(class) = classes.iter_mut().rev().find(|c| c.line_number < line) {
                    class.methods.push(MethodInfo {
                        name: name.to_string(),
                        is_private: name.starts_with(self.private_marker) || name.starts_with('#'),
                    });
                }
            }
        }

        elements.append(&mut classes);
    }

    fn extract_imports(&self, content: &str, elements: &mut Vec<CodeElement>) {
        for caps in IMPORT_FROM.captures_iter(content) {
            let module = caps.get(2).map_or("", |m| m.as_str());
            let names = caps
                .get(1)
                .map(|m| imported_names(m.as_str()))
                .unwrap_or_default();
            elements.push(import_element(content, &caps, module, names));
        }

        for caps in REQUIRE.captures_iter(content) {
            let module = caps.get(2).map_or("", |m| m.as_str());
            let names = caps
                .get(1)
                .map(|m| imported_names(m.as_str()))
                .unwrap_or_default();
            elements.push(import_element(content, &caps, module, names));
        }
    }
}

impl Extractor for ScriptExtractor {
    fn name(&self) -> &'static str {
        "script"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs", "ts", "tsx"]
    }

    fn strategy(&self) -> Strategy {
        Strategy::Lexical
    }

    fn extract(&mut self, _path: &Path, content: &str) -> Result<Extracted, ScanError> {
        let mut elements = Vec::new();
        self.extract_functions(content, &mut elements);
        self.extract_classes(content, &mut elements);
        self.extract_imports(content, &mut elements);

        let mut seen = HashSet::new();
        elements.retain(|e| seen.insert((e.name.clone(), e.line_number, e.kind)));

        Ok(Extracted::Code(elements))
    }
}

fn function_element(content: &str, caps: &Captures, name_group: usize) -> CodeElement {
    let name = caps.get(name_group).map_or("", |m| m.as_str());
    let whole = caps.get(0).map_or("", |m| m.as_str());
    let line = line_at(content, caps.get(0).map_or(0, |m| m.start()));

    let mut element = CodeElement::new(name, ElementKind::Function, line, Strategy::Lexical);
    element.signature = Some(whole.trim().trim_end_matches('{').trim().to_string());
    element.code_snippet = Some(snippet(content, line, line));
    element
}

fn import_element(content: &str, caps: &Captures, module: &str, names: Vec<String>) -> CodeElement {
    let line = line_at(content, caps.get(0).map_or(0, |m| m.start()));
    let name = if names.is_empty() {
        module.to_string()
    } else {
        format!("from {}: {}", module, names.join(", "))
    };

    let mut element = CodeElement::new(&name, ElementKind::Import, line, Strategy::Lexical);
    element.imports = names;
    element.import_from = Some(module.to_string());
    element
}

/// Names from an import clause: `a`, `{ b, c as d }`, `* as ns`
fn imported_names(clause: &str) -> Vec<String> {
    clause
        .split(',')
        .map(|part| part.trim().trim_matches(|c| c == '{' || c == '}').trim())
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once(" as ") {
            Some((name, _)) => name.trim().to_string(),
            None => part.to_string(),
        })
        .collect()
}

/// Byte offsets of `needle` outside any brackets; `=>` arrows are skipped
fn top_level(list: &str, needle: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0i32;
    let mut chars = list.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth -= 1,
            '=' if chars.peek().is_some_and(|&(_, next)| next == '>') => {
                chars.next();
            }
            c if c == needle && depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

/// Split a parameter list on top-level commas
fn parse_parameters(list: &str) -> Vec<Parameter> {
    let mut parts = Vec::new();
    let mut start = 0;
    for i in top_level(list, ',') {
        parts.push(&list[start..i]);
        start = i + 1;
    }
    parts.push(&list[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|part| {
            let (head, default) = match top_level(part, '=').first() {
                Some(&i) => (part[..i].trim(), Some(part[i + 1..].trim().to_string())),
                None => (part, None),
            };
            let (name, type_annotation) = match top_level(head, ':').first() {
                Some(&i) => (head[..i].trim(), Some(head[i + 1..].trim().to_string())),
                None => (head, None),
            };
            Parameter {
                name: name.trim_start_matches("...").trim_end_matches('?').to_string(),
                type_annotation,
                default,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(code: &str) -> Vec<CodeElement> {
        let mut extractor = ScriptExtractor::new(&ExtractConfig::default());
        match extractor.extract(Path::new("app.ts"), code).unwrap() {
            Extracted::Code(elements) => elements,
            Extracted::Docs(_) => panic!("expected code elements"),
        }
    }

    fn find<'a>(elements: &'a [CodeElement], name: &str) -> &'a CodeElement {
        elements.iter().find(|e| e.name == name).unwrap()
    }

    #[test]
    fn test_function_declaration() {
        let code = concat!(
            "\nexport async function fetchUser(id: number, retries = 3): Promise<User> {\n",
            "  return api(id);\n}\n",
        );
        let elements = extract(code);
        let f = find(&elements, "fetchUser");

        assert_eq!(f.kind, ElementKind::Function);
        assert_eq!(f.strategy, Strategy::Lexical);
        assert_eq!(f.line_number, 2);
        assert_eq!(f.parameters.len(), 2);
        assert_eq!(f.parameters[0].type_annotation.as_deref(), Some("number"));
        assert_eq!(f.parameters[1].name, "retries");
        assert_eq!(f.parameters[1].default.as_deref(), Some("3"));
        assert_eq!(f.return_type.as_deref(), Some("Promise<User>"));
    }

    #[test]
    fn test_functions_bound_to_names() {
        let code = concat!(
            "const add = (a, b) => a + b;\n",
            "let twice = x => x * 2;\n",
            "var legacy = function (items) {\n  return items;\n};\n",
        );
        let elements = extract(code);

        assert_eq!(find(&elements, "add").parameters.len(), 2);
        assert_eq!(find(&elements, "twice").parameters[0].name, "x");
        assert_eq!(find(&elements, "legacy").line_number, 3);
    }

    #[test]
    fn test_class_and_methods() {
        let code = r#"
export class Cart {
  constructor(items) {
    this.items = items;
  }

  total() {
    if (this.items) {
      return 1;
    }
  }

  _recalculate() {
  }
}
"#;

        let elements = extract(code);
        let cart = find(&elements, "Cart");
        assert_eq!(cart.kind, ElementKind::Class);
        let methods: Vec<&str> = cart.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["constructor", "total", "_recalculate"]);
        assert!(cart.methods[2].is_private);
    }

    #[test]
    fn test_imports_and_require() {
        let code = concat!(
            "import React, { useState as state } from 'react';\n",
            "import './styles.css';\n",
            "const fs = require(\"fs\");\n",
        );
        let elements = extract(code);
        let imports: Vec<&CodeElement> = elements
            .iter()
            .filter(|e| e.kind == ElementKind::Import)
            .collect();

        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].imports, vec!["React", "useState"]);
        assert_eq!(imports[0].import_from.as_deref(), Some("react"));
        assert_eq!(imports[1].name, "./styles.css");
        assert_eq!(imports[2].name, "from fs: fs");
    }

    #[test]
    fn test_parse_parameters_nested() {
        let params = parse_parameters("{ a, b }: Props, cb: (x: number) => void, ...rest");
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "{ a, b }");
        assert_eq!(params[0].type_annotation.as_deref(), Some("Props"));
        assert_eq!(params[1].type_annotation.as_deref(), Some("(x: number) => void"));
        assert_eq!(params[1].default, None);
        assert_eq!(params[2].name, "rest");
    }
}
