//! Structural extraction for Python using tree-sitter
//!
//! Extracts:
//! - Functions and methods, with parameters, return annotation and docstring
//! - HTTP endpoints declared through `@app.get("/path")`-style decorators
//! - Classes with their method names
//! - `import` and `from ... import` statements

use super::code::{snippet, UNKNOWN_ENDPOINT};
use super::{
    ApiInfo, CodeElement, ElementKind, Extracted, Extractor, MethodInfo, Parameter, Strategy,
};
use crate::config::ExtractConfig;
use crate::error::ScanError;
use anyhow::{Context, Result};
use std::path::Path;
use tree_sitter::Node;

/// Extracts code elements from Python source
pub struct PythonExtractor {
    parser: tree_sitter::Parser,
    api_verbs: Vec<String>,
    api_receivers: Vec<String>,
    private_marker: char,
}

impl PythonExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .context("Failed to set Python language")?;

        Ok(Self {
            parser,
            api_verbs: config.api_verbs.iter().map(|v| v.to_lowercase()).collect(),
            api_receivers: config
                .api_receivers
                .iter()
                .map(|r| r.to_lowercase())
                .collect(),
            private_marker: config.private_marker,
        })
    }

    /// Walk the syntax tree in source order
    fn walk_python_tree(&self, node: Node, source: &str, elements: &mut Vec<CodeElement>) {
        let element = match node.kind() {
            "function_definition" => self.extract_function(node, source),
            "class_definition" => self.extract_class(node, source),
            "import_statement" => self.extract_import(node, source),
            "import_from_statement" => self.extract_import_from(node, source),
            _ => None,
        };
        elements.extend(element);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_python_tree(child, source, elements);
        }
    }

    fn extract_function(&self, node: Node, source: &str) -> Option<CodeElement> {
        let name = text(node.child_by_field_name("name")?, source)?;
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;

        let api_info = self.detect_endpoint(node, source);
        let kind = if api_info.is_some() {
            ElementKind::ApiEndpoint
        } else {
            ElementKind::Function
        };

        let mut element = CodeElement::new(name, kind, start_line, Strategy::Structural);
        element.parameters = self.extract_parameters(node, source);
        element.return_type = node
            .child_by_field_name("return_type")
            .and_then(|n| text(n, source))
            .map(str::to_string);
        element.signature = self.extract_signature(node, source);
        element.docstring = self
            .extract_docstring(node, source)
            .or_else(|| leading_comment(node, source));
        element.api_info = api_info;
        element.code_snippet = Some(snippet(source, start_line, end_line));

        Some(element)
    }

    fn extract_class(&self, node: Node, source: &str) -> Option<CodeElement> {
        let name = text(node.child_by_field_name("name")?, source)?;
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;

        let mut element =
            CodeElement::new(name, ElementKind::Class, start_line, Strategy::Structural);
        element.methods = self.extract_methods(node, source);
        element.signature = Some(match node.child_by_field_name("superclasses") {
            Some(bases) => format!("class {}{}", name, text(bases, source).unwrap_or("")),
            None => format!("class {}", name),
        });
        element.docstring = self
            .extract_docstring(node, source)
            .or_else(|| leading_comment(node, source));
        element.code_snippet = Some(snippet(source, start_line, end_line));

        Some(element)
    }

    /// Direct methods of a class body, decorated or not
    fn extract_methods(&self, node: Node, source: &str) -> Vec<MethodInfo> {
        let Some(body) = node.child_by_field_name("body") else {
            return Vec::new();
        };

        let mut methods = Vec::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let function = match child.kind() {
                "function_definition" => Some(child),
                "decorated_definition" => child
                    .child_by_field_name("definition")
                    .filter(|d| d.kind() == "function_definition"),
                _ => None,
            };

            if let Some(name) = function
                .and_then(|f| f.child_by_field_name("name"))
                .and_then(|n| text(n, source))
            {
                methods.push(MethodInfo {
                    name: name.to_string(),
                    is_private: name.starts_with(self.private_marker),
                });
            }
        }

        methods
    }

    /// Parameters in declaration order; `*args` and `**kwargs` are skipped
    fn extract_parameters(&self, node: Node, source: &str) -> Vec<Parameter> {
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };

        let mut parameters = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let parameter = match param.kind() {
                "identifier" => text(param, source).map(Parameter::new),
                "typed_parameter" => {
                    let mut inner = param.walk();
                    let name = param
                        .named_children(&mut inner)
                        .next()
                        .filter(|n| n.kind() == "identifier")
                        .and_then(|n| text(n, source));
                    name.map(|name| Parameter {
                        name: name.to_string(),
                        type_annotation: field_text(param, "type", source),
                        default: None,
                    })
                }
                "default_parameter" | "typed_default_parameter" => {
                    field_text(param, "name", source).map(|name| Parameter {
                        name,
                        type_annotation: field_text(param, "type", source),
                        default: field_text(param, "value", source),
                    })
                }
                _ => None,
            };
            parameters.extend(parameter);
        }

        parameters
    }

    /// Endpoint metadata from the decorators of a decorated function
    fn detect_endpoint(&self, node: Node, source: &str) -> Option<ApiInfo> {
        let parent = node
            .parent()
            .filter(|p| p.kind() == "decorated_definition")?;

        let mut cursor = parent.walk();
        for decorator in parent
            .children(&mut cursor)
            .filter(|c| c.kind() == "decorator")
        {
            let mut inner = decorator.walk();
            let Some(expr) = decorator.named_children(&mut inner).next() else {
                continue;
            };

            match expr.kind() {
                "call" => {
                    if let Some(info) = self.endpoint_from_call(expr, source) {
                        return Some(info);
                    }
                }
                "identifier" => {
                    let verb = text(expr, source)?.to_lowercase();
                    if self.api_verbs.contains(&verb) {
                        return Some(ApiInfo {
                            endpoint: UNKNOWN_ENDPOINT.to_string(),
                            method: verb.to_uppercase(),
                        });
                    }
                }
                _ => {}
            }
        }

        None
    }

    /// `@receiver.verb("/path")` where the receiver looks like an app or router
    fn endpoint_from_call(&self, call: Node, source: &str) -> Option<ApiInfo> {
        let function = call
            .child_by_field_name("function")
            .filter(|f| f.kind() == "attribute")?;
        let verb = field_text(function, "attribute", source)?.to_lowercase();
        let receiver = field_text(function, "object", source)?.to_lowercase();

        let receiver_name = receiver.rsplit('.').next().unwrap_or(&receiver);
        let is_router = self
            .api_receivers
            .iter()
            .any(|r| receiver_name.ends_with(r.as_str()));
        if !is_router || !self.api_verbs.contains(&verb) {
            return None;
        }

        let endpoint = call
            .child_by_field_name("arguments")
            .and_then(|args| args.named_children(&mut args.walk()).next())
            .and_then(|arg| string_literal(arg, source))
            .unwrap_or_else(|| UNKNOWN_ENDPOINT.to_string());

        Some(ApiInfo {
            endpoint,
            method: verb.to_uppercase(),
        })
    }

    /// First statement of the body when it is a string
    fn extract_docstring(&self, node: Node, source: &str) -> Option<String> {
        let body = node.child_by_field_name("body")?;

        let mut cursor = body.walk();
        let first = body.named_children(&mut cursor).next()?;
        if first.kind() != "expression_statement" {
            return None;
        }

        let mut inner = first.walk();
        let string = first
            .named_children(&mut inner)
            .next()
            .filter(|n| n.kind() == "string")?;
        let doc = strip_quotes(text(string, source)?).trim().to_string();
        (!doc.is_empty()).then_some(doc)
    }

    fn extract_signature(&self, node: Node, source: &str) -> Option<String> {
        let name = text(node.child_by_field_name("name")?, source)?;
        let params = text(node.child_by_field_name("parameters")?, source)?;

        let signature = match field_text(node, "return_type", source) {
            Some(ret) => format!("def {}{} -> {}", name, params, ret),
            None => format!("def {}{}", name, params),
        };
        Some(signature)
    }

    fn extract_import(&self, node: Node, source: &str) -> Option<CodeElement> {
        let names = imported_names(node, source);
        if names.is_empty() {
            return None;
        }

        let line = node.start_position().row + 1;
        let mut element =
            CodeElement::new(&names.join(", "), ElementKind::Import, line, Strategy::Structural);
        element.imports = names;
        Some(element)
    }

    fn extract_import_from(&self, node: Node, source: &str) -> Option<CodeElement> {
        let module = field_text(node, "module_name", source).unwrap_or_default();
        let mut names = imported_names(node, source);

        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import")
        {
            names.push("*".to_string());
        }

        let line = node.start_position().row + 1;
        let name = format!("from {}: {}", module, names.join(", "));
        let mut element = CodeElement::new(&name, ElementKind::Import, line, Strategy::Structural);
        element.imports = names;
        element.import_from = Some(module);
        Some(element)
    }
}

impl Extractor for PythonExtractor {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
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
            let line = first_error_line(root).unwrap_or(1);
            return Err(ScanError::parse(path, format!("syntax error near line {}", line)));
        }

        let mut elements = Vec::new();
        self.walk_python_tree(root, content, &mut elements);
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

/// Names bound by an import statement, aliases resolved to the imported name
fn imported_names(node: Node, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|n| match n.kind() {
            "aliased_import" => field_text(n, "name", source),
            _ => text(n, source).map(str::to_string),
        })
        .collect()
}

/// Value of a plain string literal; f-strings are not static
fn string_literal(node: Node, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "interpolation")
    {
        return None;
    }
    Some(strip_quotes(text(node, source)?).to_string())
}

fn strip_quotes(literal: &str) -> &str {
    let body = literal.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|b| b.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}

/// `#` comments directly above a definition (or above its decorators)
fn leading_comment(node: Node, source: &str) -> Option<String> {
    let anchor = node
        .parent()
        .filter(|p| p.kind() == "decorated_definition")
        .unwrap_or(node);

    let mut lines = Vec::new();
    let mut row = anchor.start_position().row;
    let mut current = anchor.prev_sibling();
    while let Some(comment) = current.filter(|c| c.kind() == "comment") {
        if comment.end_position().row + 1 != row {
            break;
        }
        lines.push(text(comment, source)?.trim_start_matches('#').trim().to_string());
        row = comment.start_position().row;
        current = comment.prev_sibling();
    }

    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_line)
}
