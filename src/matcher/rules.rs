//! Mismatch heuristics
//!
//! Each rule compares one code element with the documentation element of
//! the same name. Rules are advisory: they look for keywords, shared words
//! and the literal endpoint line, so false positives and negatives are
//! expected.
//! Missing data on either side never counts as a mismatch.

use crate::config::MatcherConfig;
use crate::extract::{CodeElement, DocElement, UNKNOWN_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Why a code/documentation pair was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    /// Code declares parameters, documentation never mentions any
    ParameterMismatch,
    /// Code declares a return type, documentation never mentions returning
    ReturnMismatch,
    /// Docstring and documentation share no words
    ContentDivergence,
    /// Documentation content differs from the endpoint's `METHOD /path`
    ApiInfoMismatch,
}

impl std::fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchReason::ParameterMismatch => write!(f, "parameter_mismatch"),
            MismatchReason::ReturnMismatch => write!(f, "return_mismatch"),
            MismatchReason::ContentDivergence => write!(f, "content_divergence"),
            MismatchReason::ApiInfoMismatch => write!(f, "api_info_mismatch"),
        }
    }
}

/// Trait for mismatch heuristics
pub trait MismatchRule: Send + Sync {
    /// Rule name
    fn name(&self) -> &str;

    /// Check a pair sharing the same name
    fn check(&self, code: &CodeElement, doc: &DocElement) -> Option<MismatchReason>;
}

/// Rules evaluated in order; the first one that fires decides
pub struct MismatchRules {
    rules: Vec<Box<dyn MismatchRule>>,
}

impl MismatchRules {
    /// The built-in rules in their fixed order
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            rules: vec![
                Box::new(ParameterMentionRule::new(&config.parameter_keywords)),
                Box::new(ReturnMentionRule::new(&config.return_keywords)),
                Box::new(ContentDivergenceRule {
                    min_len: config.min_divergence_len,
                }),
                Box::new(ApiInfoRule),
            ],
        }
    }

    /// Append a custom rule after the built-in ones
    pub fn push(&mut self, rule: Box<dyn MismatchRule>) {
        self.rules.push(rule);
    }

    /// First rule that flags the pair
    pub fn check(&self, code: &CodeElement, doc: &DocElement) -> Option<MismatchReason> {
        self.rules.iter().find_map(|rule| {
            let reason = rule.check(code, doc)?;
            tracing::trace!("Rule {} flagged {}", rule.name(), code.name);
            Some(reason)
        })
    }

    /// Names of the rules, in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl Default for MismatchRules {
    fn default() -> Self {
        Self::new(&MatcherConfig::default())
    }
}

fn mentions_any(content: &str, keywords: &[String]) -> bool {
    let content = content.to_lowercase();
    keywords.iter().any(|k| content.contains(k.as_str()))
}

fn lowercase_all(keywords: &[String]) -> Vec<String> {
    keywords.iter().map(|k| k.to_lowercase()).collect()
}

/// Flags code with parameters whose documentation names no parameter keyword
struct ParameterMentionRule {
    keywords: Vec<String>,
}

impl ParameterMentionRule {
    fn new(keywords: &[String]) -> Self {
        Self {
            keywords: lowercase_all(keywords),
        }
    }
}

impl MismatchRule for ParameterMentionRule {
    fn name(&self) -> &str {
        "parameter_mention"
    }

    fn check(&self, code: &CodeElement, doc: &DocElement) -> Option<MismatchReason> {
        if code.parameters.is_empty() || mentions_any(&doc.content, &self.keywords) {
            return None;
        }
        Some(MismatchReason::ParameterMismatch)
    }
}

/// Flags code with a return type whose documentation never mentions returning
struct ReturnMentionRule {
    keywords: Vec<String>,
}

impl ReturnMentionRule {
    fn new(keywords: &[String]) -> Self {
        Self {
            keywords: lowercase_all(keywords),
        }
    }
}

impl MismatchRule for ReturnMentionRule {
    fn name(&self) -> &str {
        "return_mention"
    }

    fn check(&self, code: &CodeElement, doc: &DocElement) -> Option<MismatchReason> {
        let return_type = code.return_type.as_deref()?.trim();
        if return_type.is_empty()
            || return_type.eq_ignore_ascii_case("none")
            || mentions_any(&doc.content, &self.keywords)
        {
            return None;
        }
        Some(MismatchReason::ReturnMismatch)
    }
}

/// Flags a docstring and documentation that share no word at all
struct ContentDivergenceRule {
    min_len: usize,
}

impl MismatchRule for ContentDivergenceRule {
    fn name(&self) -> &str {
        "content_divergence"
    }

    fn check(&self, code: &CodeElement, doc: &DocElement) -> Option<MismatchReason> {
        let docstring = code.docstring.as_deref()?;
        if docstring.chars().count() <= self.min_len || doc.content.chars().count() <= self.min_len
        {
            return None;
        }

        let code_words: HashSet<String> = docstring
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let shares_word = doc
            .content
            .split_whitespace()
            .any(|w| code_words.contains(&w.to_lowercase()));

        (!shares_word).then_some(MismatchReason::ContentDivergence)
    }
}

/// Flags endpoint documentation whose content is not exactly `METHOD /path`
struct ApiInfoRule;

impl MismatchRule for ApiInfoRule {
    fn name(&self) -> &str {
        "api_info"
    }

    fn check(&self, code: &CodeElement, doc: &DocElement) -> Option<MismatchReason> {
        let info = code.api_info.as_ref()?;
        // A route that could not be resolved, or an empty doc, has nothing to compare
        if info.endpoint == UNKNOWN_ENDPOINT || doc.content.is_empty() {
            return None;
        }

        (info.to_string() != doc.content).then_some(MismatchReason::ApiInfoMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ApiInfo, ElementKind, Parameter, Strategy};

    fn code(name: &str) -> CodeElement {
        CodeElement::new(name, ElementKind::Function, 1, Strategy::Structural)
    }

    fn doc(name: &str, content: &str) -> DocElement {
        DocElement {
            name: name.to_string(),
            kind: ElementKind::DocHeading,
            file_path: "docs/api.md".to_string(),
            line_number: 1,
            strategy: Strategy::Structural,
            content: content.to_string(),
            full_content: None,
            heading_level: None,
            code_block_language: None,
        }
    }

    #[test]
    fn test_rule_order() {
        let rules = MismatchRules::default();
        assert_eq!(
            rules.names(),
            vec!["parameter_mention", "return_mention", "content_divergence", "api_info"]
        );
    }

    #[test]
    fn test_parameter_mention() {
        let rules = MismatchRules::default();
        let mut f = code("f");
        f.parameters.push(Parameter::new("x"));

        assert_eq!(
            rules.check(&f, &doc("f", "## f")),
            Some(MismatchReason::ParameterMismatch)
        );
        assert_eq!(rules.check(&f, &doc("f", "## f takes one Argument")), None);
    }

    #[test]
    fn test_return_mention() {
        let rules = MismatchRules::default();
        let mut f = code("f");
        f.return_type = Some("int".to_string());
        assert_eq!(
            rules.check(&f, &doc("f", "## f")),
            Some(MismatchReason::ReturnMismatch)
        );
        assert_eq!(rules.check(&f, &doc("f", "Returns the count")), None);

        f.return_type = Some("None".to_string());
        assert_eq!(rules.check(&f, &doc("f", "## f")), None);
    }

    #[test]
    fn test_parameter_rule_short_circuits() {
        let rules = MismatchRules::default();
        let mut f = code("f");
        f.parameters.push(Parameter::new("x"));
        f.return_type = Some("int".to_string());
        assert_eq!(
            rules.check(&f, &doc("f", "## f")),
            Some(MismatchReason::ParameterMismatch)
        );
    }

    #[test]
    fn test_content_divergence() {
        let rules = MismatchRules::default();
        let mut f = code("f");
        f.docstring = Some("Computes checksums over file blocks".to_string());

        assert_eq!(
            rules.check(&f, &doc("f", "## Something entirely unrelated here")),
            Some(MismatchReason::ContentDivergence)
        );
        assert_eq!(
            rules.check(&f, &doc("f", "## Computes a digest of everything")),
            None
        );
        // Short texts are never compared
        assert_eq!(rules.check(&f, &doc("f", "## f")), None);
    }

    #[test]
    fn test_api_info_compares_verbatim() {
        let rules = MismatchRules::default();
        let mut f = code("list_users");
        f.kind = ElementKind::ApiEndpoint;
        f.api_info = Some(ApiInfo {
            endpoint: "/users".to_string(),
            method: "GET".to_string(),
        });

        assert_eq!(
            rules.check(&f, &doc("list_users", "## list_users")),
            Some(MismatchReason::ApiInfoMismatch)
        );
        // Mentioning the route among other words is still a difference
        assert_eq!(
            rules.check(
                &f,
                &doc("list_users", "## list_users: get /users, and many other words")
            ),
            Some(MismatchReason::ApiInfoMismatch)
        );
        assert_eq!(
            rules.check(&f, &doc("list_users", "get /users")),
            Some(MismatchReason::ApiInfoMismatch)
        );
        assert_eq!(rules.check(&f, &doc("list_users", "GET /users")), None);
    }

    #[test]
    fn test_api_info_unknown_endpoint() {
        let rules = MismatchRules::default();
        let mut f = code("create");
        f.api_info = Some(ApiInfo {
            endpoint: UNKNOWN_ENDPOINT.to_string(),
            method: "POST".to_string(),
        });
        assert_eq!(rules.check(&f, &doc("create", "## create")), None);
    }

    #[test]
    fn test_missing_data_is_not_a_mismatch() {
        let rules = MismatchRules::default();
        assert_eq!(rules.check(&code("f"), &doc("f", "")), None);
    }
}
