//! Discrepancy matching between code and documentation
//!
//! Elements are paired by exact name only. Three result lists come out of a
//! match:
//! - code elements no documentation element names
//! - documentation elements no code element names
//! - same-name pairs whose content disagrees (see [`rules`])

pub mod rules;

pub use rules::{MismatchReason, MismatchRule, MismatchRules};

use crate::config::MatcherConfig;
use crate::extract::{CodeElement, DocElement, ElementKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A code element and its same-name documentation that disagree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MismatchedPair {
    pub code: CodeElement,
    pub documentation: DocElement,
    pub reason: MismatchReason,
}

/// Result of matching code against documentation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Discrepancies {
    pub undocumented_code: Vec<CodeElement>,
    pub outdated_documentation: Vec<DocElement>,
    pub mismatched_elements: Vec<MismatchedPair>,
}

impl Discrepancies {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of findings across all three lists
    pub fn total(&self) -> usize {
        self.undocumented_code.len()
            + self.outdated_documentation.len()
            + self.mismatched_elements.len()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Pairs code and documentation elements by name and applies mismatch rules
pub struct DiscrepancyMatcher {
    rules: MismatchRules,
    skip_whole_document: bool,
}

impl DiscrepancyMatcher {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            rules: MismatchRules::new(config),
            skip_whole_document: config.skip_whole_document_in_outdated,
        }
    }

    /// Add a rule evaluated after the built-in ones
    pub fn with_rule(mut self, rule: Box<dyn MismatchRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Find undocumented code, outdated documentation and mismatched pairs.
    ///
    /// When several elements share a name, the last one in input order is
    /// used for pairing. Output lists keep input order.
    pub fn find_discrepancies(
        &self,
        code_elements: &[CodeElement],
        doc_elements: &[DocElement],
    ) -> Discrepancies {
        let code_by_name: HashMap<&str, &CodeElement> = code_elements
            .iter()
            .map(|e| (e.name.as_str(), e))
            .collect();
        let doc_by_name: HashMap<&str, &DocElement> = doc_elements
            .iter()
            .map(|e| (e.name.as_str(), e))
            .collect();

        let undocumented_code: Vec<CodeElement> = code_elements
            .iter()
            .filter(|e| e.is_documentable() && !doc_by_name.contains_key(e.name.as_str()))
            .cloned()
            .collect();

        let outdated_documentation: Vec<DocElement> = doc_elements
            .iter()
            .filter(|e| !(self.skip_whole_document && e.kind == ElementKind::Documentation))
            .filter(|e| !code_by_name.contains_key(e.name.as_str()))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let mut mismatched_elements = Vec::new();
        for element in code_elements {
            let name = element.name.as_str();
            if !seen.insert(name) {
                continue;
            }
            let (Some(code), Some(doc)) = (code_by_name.get(name), doc_by_name.get(name)) else {
                continue;
            };
            if let Some(reason) = self.rules.check(code, doc) {
                mismatched_elements.push(MismatchedPair {
                    code: (*code).clone(),
                    documentation: (*doc).clone(),
                    reason,
                });
            }
        }

        tracing::debug!(
            "Matched {} code / {} doc elements: {} undocumented, {} outdated, {} mismatched",
            code_elements.len(),
            doc_elements.len(),
            undocumented_code.len(),
            outdated_documentation.len(),
            mismatched_elements.len()
        );

        Discrepancies {
            undocumented_code,
            outdated_documentation,
            mismatched_elements,
        }
    }
}

impl Default for DiscrepancyMatcher {
    fn default() -> Self {
        Self::new(&MatcherConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Parameter, Strategy};

    fn code(name: &str, kind: ElementKind) -> CodeElement {
        CodeElement::new(name, kind, 1, Strategy::Structural)
    }

    fn doc(name: &str, kind: ElementKind, content: &str) -> DocElement {
        DocElement {
            name: name.to_string(),
            kind,
            file_path: "docs/guide.md".to_string(),
            line_number: 1,
            strategy: Strategy::Structural,
            content: content.to_string(),
            full_content: None,
            heading_level: None,
            code_block_language: None,
        }
    }

    #[test]
    fn test_undocumented_code() {
        let matcher = DiscrepancyMatcher::default();
        let code_elements = vec![
            code("foo", ElementKind::Function),
            code("Bar", ElementKind::Class),
            code("os", ElementKind::Import),
        ];
        let docs = vec![doc("Bar", ElementKind::DocHeading, "## Bar")];

        let found = matcher.find_discrepancies(&code_elements, &docs);
        let names: Vec<_> = found.undocumented_code.iter().map(|e| e.name.as_str()).collect();
        // Imports are never reported as undocumented
        assert_eq!(names, vec!["foo"]);
        assert!(found.outdated_documentation.is_empty());
    }

    #[test]
    fn test_outdated_documentation() {
        let matcher = DiscrepancyMatcher::default();
        let code_elements = vec![code("foo", ElementKind::Function)];
        let docs = vec![
            doc("foo", ElementKind::DocHeading, "## foo"),
            doc("Removed", ElementKind::DocHeading, "## Removed"),
            doc("guide", ElementKind::Documentation, "whole file"),
        ];

        let found = matcher.find_discrepancies(&code_elements, &docs);
        let names: Vec<_> = found
            .outdated_documentation
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Removed"]);
    }

    #[test]
    fn test_whole_document_can_be_reported() {
        let config = MatcherConfig {
            skip_whole_document_in_outdated: false,
            ..MatcherConfig::default()
        };
        let matcher = DiscrepancyMatcher::new(&config);
        let docs = vec![doc("guide", ElementKind::Documentation, "whole file")];

        let found = matcher.find_discrepancies(&[], &docs);
        assert_eq!(found.outdated_documentation.len(), 1);
    }

    #[test]
    fn test_mismatch_uses_last_element_per_name() {
        let matcher = DiscrepancyMatcher::default();

        let first = code("f", ElementKind::Function);
        let mut second = code("f", ElementKind::Function);
        second.parameters.push(Parameter::new("x"));
        second.line_number = 10;

        let docs = vec![doc("f", ElementKind::DocHeading, "## f")];
        let found = matcher.find_discrepancies(&[first, second], &docs);

        assert_eq!(found.mismatched_elements.len(), 1);
        let pair = &found.mismatched_elements[0];
        assert_eq!(pair.code.line_number, 10);
        assert_eq!(pair.reason, MismatchReason::ParameterMismatch);
    }

    #[test]
    fn test_matched_pair_without_disagreement() {
        let matcher = DiscrepancyMatcher::default();
        let mut f = code("f", ElementKind::Function);
        f.parameters.push(Parameter::new("x"));
        let docs = vec![doc("f", ElementKind::DocHeading, "f takes a param x")];

        let found = matcher.find_discrepancies(&[f], &docs);
        assert!(found.is_empty());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let matcher = DiscrepancyMatcher::default();
        let found = matcher.find_discrepancies(
            &[code("Foo", ElementKind::Function)],
            &[doc("foo", ElementKind::DocHeading, "## foo")],
        );
        assert_eq!(found.undocumented_code.len(), 1);
        assert_eq!(found.outdated_documentation.len(), 1);
        assert_eq!(found.total(), 2);
    }

    #[test]
    fn test_empty_inputs() {
        let found = DiscrepancyMatcher::default().find_discrepancies(&[], &[]);
        assert!(found.is_empty());
        assert!(found.to_json().unwrap().contains("undocumented_code"));
    }
}
