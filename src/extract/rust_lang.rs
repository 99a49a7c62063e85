//! Structural extraction for Rust using tree-sitter
//!
//! Extracts:
//! - Free functions and impl methods (`Type::method`)
//! - Structs, enums and traits as classes, with their methods
//! - `use` declarations
//! - Handlers carrying route attributes such as `#[get("/path")]`

use super::code::{snippet, UNKNOWN_ENDPOINT};
use super::{
    ApiInfo, CodeElement, ElementKind, Extracted, Extractor, MethodInfo, Parameter, Strategy,
};
use crate::config::ExtractConfig;
use crate::error::ScanError;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node;

/// Extracts code elements from Rust source
pub struct RustExtractor {
    parser: tree_sitter::Parser,
    api_verbs: Vec<String>,
}

impl RustExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .context("Failed to set Rust language")?;

        Ok(Self {
            parser,
            api_verbs: config.api_verbs.iter().map(|v| v.to_lowercase()).collect(),
        })
    }

    /// Walk the Rust AST. Impl and trait bodies are handled by their owners
    /// and not descended into again.
    fn walk_rust_tree(
        &self,
        node: Node,
        source: &str,
        elements: &mut Vec<CodeElement>,
        impl_methods: &mut HashMap<String, Vec<MethodInfo>>,
    ) {
        match node.kind() {
            "function_item" => {
                elements.extend(self.extract_function(node, source, None));
            }
            "struct_item" | "enum_item" => {
                elements.extend(self.extract_type(node, source));
            }
            "trait_item" => {
                elements.extend(self.extract_trait(node, source));
                return;
            }
            "impl_item" => {
                self.extract_impl(node, source, elements, impl_methods);
                return;
            }
            "use_declaration" => {
                elements.extend(self.extract_use(node, source));
                return;
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_rust_tree(child, source, elements, impl_methods);
        }
    }

    fn extract_function(
        &self,
        node: Node,
        source: &str,
        owner: Option<&str>,
    ) -> Option<CodeElement> {
        let name = text(node.child_by_field_name("name")?, source)?;
        let full_name = match owner {
            Some(owner) => format!("{}::{}", owner, name),
            None => name.to_string(),
        };
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;

        let api_info = self.detect_route(node, source);
        let kind = if api_info.is_some() {
            ElementKind::ApiEndpoint
        } else {
            ElementKind::Function
        };

        let mut element = CodeElement::new(&full_name, kind, start_line, Strategy::Structural);
        element.parameters = self.extract_parameters(node, source);
        element.return_type = field_text(node, "return_type", source);
        element.signature = self.extract_rust_function_signature(node, source);
        element.docstring = self.extract_rust_doc_comment(node, source);
        element.api_info = api_info;
        element.code_snippet = Some(snippet(source, start_line, end_line));

        Some(element)
    }

    fn extract_type(&self, node: Node, source: &str) -> Option<CodeElement> {
        let name = text(node.child_by_field_name("name")?, source)?;
        let keyword = match node.kind() {
            "enum_item" => "enum",
            "trait_item" => "trait",
            _ => "struct",
        };
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;

        let mut element =
            CodeElement::new(name, ElementKind::Class, start_line, Strategy::Structural);
        element.signature = Some(format!("{} {}", keyword, name));
        element.docstring = self.extract_rust_doc_comment(node, source);
        element.code_snippet = Some(snippet(source, start_line, end_line));

        Some(element)
    }

    /// A trait is a class whose methods are its declared functions
    fn extract_trait(&self, node: Node, source: &str) -> Option<CodeElement> {
        let mut element = self.extract_type(node, source)?;

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for item in body.named_children(&mut cursor) {
                if !matches!(item.kind(), "function_item" | "function_signature_item") {
                    continue;
                }
                if let Some(name) = item.child_by_field_name("name").and_then(|n| text(n, source)) {
                    element.methods.push(MethodInfo {
                        name: name.to_string(),
                        is_private: false,
                    });
                }
            }
        }

        Some(element)
    }

    /// Extract methods from an impl block and remember them for the type
    fn extract_impl(
        &self,
        node: Node,
        source: &str,
        elements: &mut Vec<CodeElement>,
        impl_methods: &mut HashMap<String, Vec<MethodInfo>>,
    ) {
        let type_name = node
            .child_by_field_name("type")
            .and_then(|n| text(n, source))
            .map(base_type_name)
            .unwrap_or("Unknown");

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        let mut cursor = body.walk();
        for item in body.named_children(&mut cursor) {
            if item.kind() != "function_item" {
                continue;
            }
            let Some(method) = self.extract_function(item, source, Some(type_name)) else {
                continue;
            };

            let short_name = method
                .name
                .rsplit("::")
                .next()
                .unwrap_or(&method.name)
                .to_string();
            impl_methods
                .entry(type_name.to_string())
                .or_default()
                .push(MethodInfo {
                    name: short_name,
                    is_private: !self.has_rust_visibility(item, source),
                });
            elements.push(method);
        }
    }

    fn extract_use(&self, node: Node, source: &str) -> Option<CodeElement> {
        let argument = text(node.child_by_field_name("argument")?, source)?;
        let argument: String = argument.split_whitespace().collect::<Vec<_>>().join(" ");

        let (module, names) = match argument.split_once("::{") {
            Some((module, rest)) => (
                module.to_string(),
                rest.trim_end_matches('}')
                    .split(',')
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect(),
            ),
            None => match argument.rsplit_once("::") {
                Some((module, name)) => (module.to_string(), vec![name.to_string()]),
                None => (String::new(), vec![argument.clone()]),
            },
        };

        let line = node.start_position().row + 1;
        let mut element =
            CodeElement::new(&argument, ElementKind::Import, line, Strategy::Structural);
        element.imports = names;
        element.import_from = (!module.is_empty()).then_some(module);
        Some(element)
    }

    /// Parameters in declaration order, `self` included
    fn extract_parameters(&self, node: Node, source: &str) -> Vec<Parameter> {
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };

        let mut parameters = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "self_parameter" => parameters.push(Parameter::new("self")),
                "parameter" => {
                    if let Some(name) = field_text(param, "pattern", source) {
                        parameters.push(Parameter {
                            name,
                            type_annotation: field_text(param, "type", source),
                            default: None,
                        });
                    }
                }
                _ => {}
            }
        }

        parameters
    }

    /// Route attribute directly above a function, e.g. `#[get("/users")]`
    fn detect_route(&self, node: Node, source: &str) -> Option<ApiInfo> {
        let mut current = node.prev_sibling();
        while let Some(sibling) = current {
            match sibling.kind() {
                "attribute_item" => {
                    if let Some(info) = self.route_from_attribute(text(sibling, source)?) {
                        return Some(info);
                    }
                }
                "line_comment" | "block_comment" => {}
                _ => break,
            }
            current = sibling.prev_sibling();
        }
        None
    }

    fn route_from_attribute(&self, attribute: &str) -> Option<ApiInfo> {
        let inner = attribute
            .trim()
            .strip_prefix("#[")?
            .strip_suffix(']')?
            .trim();
        let (path, args) = inner.split_once('(').unwrap_or((inner, ""));

        let verb = path.rsplit("::").next().unwrap_or(path).trim().to_lowercase();
        if !self.api_verbs.contains(&verb) {
            return None;
        }

        let endpoint = args
            .trim()
            .strip_prefix('"')
            .and_then(|rest| rest.split_once('"'))
            .map(|(route, _)| route.to_string())
            .unwrap_or_else(|| UNKNOWN_ENDPOINT.to_string());

        Some(ApiInfo {
            endpoint,
            method: verb.to_uppercase(),
        })
    }

    /// Check if a Rust node has pub visibility
    fn has_rust_visibility(&self, node: Node, source: &str) -> bool {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "visibility_modifier" {
                if let Some(text) = text(child, source) {
                    return text.starts_with("pub");
                }
            }
        }
        false
    }

    /// Extract doc comment for a Rust node
    fn extract_rust_doc_comment(&self, node: Node, source: &str) -> Option<String> {
        // Look for preceding `///` lines, stepping over attributes
        let prefix = &source[..node.start_byte()];

        let mut doc_lines = Vec::new();
        for line in prefix.lines().rev() {
            let trimmed = line.trim();
            if let Some(doc) = trimmed.strip_prefix("///") {
                doc_lines.push(doc.trim());
            } else if trimmed.starts_with("#[") || (trimmed.is_empty() && doc_lines.is_empty()) {
                continue;
            } else {
                break;
            }
        }

        if doc_lines.is_empty() {
            None
        } else {
            doc_lines.reverse();
            Some(doc_lines.join("\n"))
        }
    }

    /// Everything up to the body block
    fn extract_rust_function_signature(&self, node: Node, source: &str) -> Option<String> {
        let signature_end = node
            .child_by_field_name("body")
            .map(|b| b.start_byte())
            .unwrap_or(node.end_byte());

        let signature = source.get(node.start_byte()..signature_end)?;
        Some(signature.trim().to_string())
    }
}

impl Extractor for RustExtractor {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn strategy(&self) -> Strategy {
        Strategy::Structural
    }

    fn extract(&mut self, path: &Path, content: &str) -> Result<Extracted, ScanError> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| ScanError::parse(path, "parser returned no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(ScanError::parse(path, "syntax error"));
        }

        let mut elements = Vec::new();
        let mut impl_methods = HashMap::new();
        self.walk_rust_tree(root, content, &mut elements, &mut impl_methods);

        for element in elements.iter_mut().filter(|e| e.kind == ElementKind::Class) {
            if let Some(methods) = impl_methods.remove(&element.name) {
                element.methods.extend(methods);
            }
        }

        Ok(Extracted::Code(elements))
    }
}

fn text<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

fn field_text(node: Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| text(n, source))
        .map(str::to_string)
}

/// `Foo<T>` and `crate::Foo` both name `Foo`
fn base_type_name(type_text: &str) -> &str {
    let without_generics = type_text.split('<').next().unwrap_or(type_text);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(code: &str) -> Vec<CodeElement> {
        let mut extractor = RustExtractor::new(&ExtractConfig::default()).unwrap();
        match extractor.extract(Path::new("test.rs"), code).unwrap() {
            Extracted::Code(elements) => elements,
            Extracted::Docs(_) => panic!("expected code elements"),
        }
    }

    #[test]
    fn test_extract_rust_function() {
        let code = r#"
/// This is a doc comment
/// with multiple lines
pub fn hello_world(name: &str, times: usize) -> String {
    format!("Hello, {}!", name)
}
"#;

        let elements = extract(code);

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].name, "hello_world");
        assert_eq!(elements[0].kind, ElementKind::Function);
        assert_eq!(elements[0].parameters.len(), 2);
        assert_eq!(elements[0].parameters[1].name, "times");
        assert_eq!(elements[0].parameters[1].type_annotation.as_deref(), Some("usize"));
        assert_eq!(elements[0].return_type.as_deref(), Some("String"));
        assert_eq!(
            elements[0].docstring.as_deref(),
            Some("This is a doc comment\nwith multiple lines")
        );
        assert_eq!(
            elements[0].signature.as_deref(),
            Some("pub fn hello_world(name: &str, times: usize) -> String")
        );
    }

    #[test]
    fn test_impl_methods_attach_to_type() {
        let code = r#"
pub struct Counter {
    value: u32,
}

impl Counter {
    pub fn increment(&mut self) {}
    fn reset(&mut self) {}
}
"#;

        let elements = extract(code);
        let names: Vec<&str> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Counter", "Counter::increment", "Counter::reset"]);

        let counter = &elements[0];
        assert_eq!(counter.kind, ElementKind::Class);
        assert_eq!(counter.methods.len(), 2);
        assert!(!counter.methods[0].is_private);
        assert!(counter.methods[1].is_private);
        assert_eq!(elements[1].parameters[0].name, "self");
    }

    #[test]
    fn test_trait_methods_are_not_duplicated() {
        let code = r#"
trait Shape {
    fn area(&self) -> f64;
    fn name(&self) -> String { String::new() }
}
"#;

        let elements = extract(code);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].signature.as_deref(), Some("trait Shape"));
        assert_eq!(elements[0].methods.len(), 2);
    }

    #[test]
    fn test_use_declarations() {
        let code = "use std::collections::{HashMap, HashSet};\nuse anyhow::Result;\n";
        let elements = extract(code);

        assert_eq!(elements[0].kind, ElementKind::Import);
        assert_eq!(elements[0].imports, vec!["HashMap", "HashSet"]);
        assert_eq!(elements[0].import_from.as_deref(), Some("std::collections"));
        assert_eq!(elements[1].imports, vec!["Result"]);
        assert_eq!(elements[1].import_from.as_deref(), Some("anyhow"));
    }

    #[test]
    fn test_route_attribute() {
        let code = r#"
/// Lists users
#[get("/users")]
async fn list_users() -> String {
    String::new()
}
"#;

        let elements = extract(code);
        assert_eq!(elements[0].kind, ElementKind::ApiEndpoint);
        assert_eq!(elements[0].docstring.as_deref(), Some("Lists users"));
        assert_eq!(
            elements[0].api_info,
            Some(ApiInfo {
                endpoint: "/users".to_string(),
                method: "GET".to_string()
            })
        );
    }

    #[test]
    fn test_non_route_attribute() {
        let code = "#[test]\nfn works() {}\n";
        let elements = extract(code);
        assert_eq!(elements[0].kind, ElementKind::Function);
    }

    #[test]
    fn test_base_type_name() {
        assert_eq!(base_type_name("Foo<T>"), "Foo");
        assert_eq!(base_type_name("crate::Foo"), "Foo");
    }
}
