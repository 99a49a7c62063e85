//! Filter rules and pattern compilation
//!
//! Patterns are compiled with `globset`. `**` crosses directory separators,
//! `*` and `?` stay within one path segment. A pattern that fails to compile
//! degrades to a case-folded substring match.

use crate::error::ScanError;
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a rule is allowed to match relative to the directory that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Matches at any depth beneath the owning directory
    Global,
    /// Matches only relative to the owning directory
    Anchored,
}

/// Whether a rule excludes or re-includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Exclude,
    /// `!pattern`; parsed and kept, but never matches
    Include,
}

/// A compiled glob, or the literal fallback for a malformed one
#[derive(Debug, Clone)]
pub(crate) enum PatternMatcher {
    Glob(GlobMatcher),
    Literal(String),
}

impl PatternMatcher {
    /// Compile a glob; on failure fall back to substring matching on `literal`
    pub(crate) fn compile(glob: &str, literal: &str, literal_separator: bool) -> Self {
        Self::compile_checked(glob, literal, literal_separator).0
    }

    /// Like [`compile`](Self::compile), also returning the glob error behind a fallback
    pub(crate) fn compile_checked(
        glob: &str,
        literal: &str,
        literal_separator: bool,
    ) -> (Self, Option<globset::Error>) {
        match GlobBuilder::new(glob)
            .case_insensitive(true)
            .literal_separator(literal_separator)
            .backslash_escape(true)
            .build()
        {
            Ok(glob) => (PatternMatcher::Glob(glob.compile_matcher()), None),
            Err(err) => {
                tracing::warn!(
                    "Invalid pattern '{}', falling back to literal match: {}",
                    literal,
                    err
                );
                (PatternMatcher::Literal(literal.to_lowercase()), Some(err))
            }
        }
    }

    /// Compile a filename glob (no separator semantics)
    pub(crate) fn filename(pattern: &str) -> Self {
        Self::compile(pattern, pattern, false)
    }

    /// The glob error of a filename pattern, if it would fall back to a literal
    pub(crate) fn filename_error(pattern: &str) -> Option<globset::Error> {
        Self::compile_checked(pattern, pattern, false).1
    }

    pub(crate) fn is_match(&self, candidate: &str) -> bool {
        match self {
            PatternMatcher::Glob(glob) => glob.is_match(candidate),
            PatternMatcher::Literal(literal) => candidate.to_lowercase().contains(literal.as_str()),
        }
    }

    pub(crate) fn is_literal(&self) -> bool {
        matches!(self, PatternMatcher::Literal(_))
    }
}

/// One ignore-style pattern with its scope and polarity
#[derive(Debug, Clone)]
pub struct FilterRule {
    /// The pattern as written
    pub pattern: String,
    pub scope: Scope,
    pub polarity: Polarity,
    /// Trailing `/`: the pattern only names directories
    pub directory_only: bool,
    own: PatternMatcher,
    descendants: PatternMatcher,
    /// Why the pattern fell back to a literal match
    compile_error: Option<globset::Error>,
}

impl FilterRule {
    /// Parse one line of an ignore file. Blank lines and comments yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (polarity, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (Polarity::Include, rest),
            None => (Polarity::Exclude, trimmed),
        };
        // "\#foo" and "\!foo" name files starting with those characters
        let body = body.strip_prefix('\\').filter(|b| b.starts_with(['#', '!'])).unwrap_or(body);

        let directory_only = body.ends_with('/');
        let body = body.trim_end_matches('/');

        let anchored = body.starts_with('/') || (body.contains('/') && !body.starts_with("**/"));
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }

        let scope = if anchored { Scope::Anchored } else { Scope::Global };
        let glob = match scope {
            Scope::Anchored => body.to_string(),
            Scope::Global if body.starts_with("**/") => body.to_string(),
            Scope::Global => format!("**/{}", body),
        };

        Some(Self::build(trimmed, scope, polarity, directory_only, &glob, body))
    }

    /// A rule naming directories at any depth, used for configured exclude patterns
    pub fn directory_glob(pattern: &str) -> Option<Self> {
        let body = pattern.trim().trim_matches('/');
        if body.is_empty() {
            return None;
        }
        let glob = if body.starts_with("**/") {
            body.to_string()
        } else {
            format!("**/{}", body)
        };
        Some(Self::build(
            pattern,
            Scope::Global,
            Polarity::Exclude,
            true,
            &glob,
            body,
        ))
    }

    fn build(
        pattern: &str,
        scope: Scope,
        polarity: Polarity,
        directory_only: bool,
        glob: &str,
        literal: &str,
    ) -> Self {
        let (own, compile_error) = PatternMatcher::compile_checked(glob, literal, true);
        let descendants = if own.is_literal() {
            own.clone()
        } else {
            PatternMatcher::compile(&format!("{}/**", glob), literal, true)
        };

        Self {
            pattern: pattern.to_string(),
            scope,
            polarity,
            directory_only,
            own,
            descendants,
            compile_error,
        }
    }

    /// Check a `/`-separated path relative to the rule's owning directory
    pub fn matches(&self, relative: &str, is_directory: bool) -> bool {
        if self.polarity == Polarity::Include {
            return false;
        }

        if self.own.is_match(relative) && (is_directory || !self.directory_only) {
            return true;
        }

        // Anything beneath a matched directory is matched too
        self.descendants.is_match(relative)
    }

    /// Whether the pattern compiled as a glob
    pub fn is_glob(&self) -> bool {
        !self.own.is_literal()
    }

    /// The literal fallback as an error to record, tagged with the declaring file
    pub fn pattern_error(&self, origin: Option<&Path>) -> Option<ScanError> {
        self.compile_error
            .clone()
            .map(|source| ScanError::pattern(&self.pattern, origin, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::path::PathBuf;

    #[test]
    fn test_comments_and_blanks_are_skipped() {
        assert!(FilterRule::parse("").is_none());
        assert!(FilterRule::parse("   ").is_none());
        assert!(FilterRule::parse("# comment").is_none());
        assert!(FilterRule::parse("/").is_none());
    }

    #[test]
    fn test_unanchored_matches_any_depth() {
        let rule = FilterRule::parse("*.tmp").unwrap();
        assert_eq!(rule.scope, Scope::Global);
        assert!(rule.matches("a.tmp", false));
        assert!(rule.matches("deep/nested/a.tmp", false));
        assert!(!rule.matches("a.txt", false));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let rule = FilterRule::parse("/docs/*.md").unwrap();
        assert_eq!(rule.scope, Scope::Anchored);
        assert!(rule.matches("docs/a.md", false));
        assert!(!rule.matches("docs/api/a.md", false));
    }

    #[test]
    fn test_double_star_crosses_segments() {
        let rule = FilterRule::parse("docs/**/*.md").unwrap();
        assert!(rule.matches("docs/api/v1/a.md", false));
        assert!(rule.matches("docs/a.md", false));
        assert!(!rule.matches("src/a.md", false));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        let rule = FilterRule::parse("file?.log").unwrap();
        assert!(rule.matches("file1.log", false));
        assert!(!rule.matches("file12.log", false));
    }

    #[test]
    fn test_anchored_only_at_owner() {
        let rule = FilterRule::parse("/build").unwrap();
        assert!(rule.matches("build", true));
        assert!(rule.matches("build/out.js", false));
        assert!(!rule.matches("src/build", true));
    }

    #[test]
    fn test_directory_only() {
        let rule = FilterRule::parse("cache/").unwrap();
        assert!(rule.directory_only);
        assert!(rule.matches("cache", true));
        assert!(!rule.matches("cache", false));
        assert!(rule.matches("cache/item.json", false));
        assert!(rule.matches("nested/cache/item.json", false));
    }

    #[test]
    fn test_negation_never_matches() {
        let rule = FilterRule::parse("!keep.tmp").unwrap();
        assert_eq!(rule.polarity, Polarity::Include);
        assert!(!rule.matches("keep.tmp", false));
    }

    #[test]
    fn test_malformed_pattern_falls_back_to_literal() {
        let rule = FilterRule::parse("[abc").unwrap();
        assert!(!rule.is_glob());
        assert!(rule.matches("x/[abc/y", false));
        assert!(rule.matches("notes[ABC].txt", false));
        assert!(!rule.matches("abc", false));

        let err = rule.pattern_error(Some(Path::new("pkg/.gitignore"))).unwrap();
        assert_eq!(err.category(), ErrorCategory::Pattern);
        assert_eq!(err.path(), Some(PathBuf::from("pkg/.gitignore")));
        assert!(err.to_string().contains("[abc"));
    }

    #[test]
    fn test_valid_pattern_has_no_error() {
        let rule = FilterRule::parse("*.tmp").unwrap();
        assert!(rule.pattern_error(None).is_none());
        assert!(PatternMatcher::filename_error("*.min.js").is_none());
        assert!(PatternMatcher::filename_error("[bad").is_some());
    }

    #[test]
    fn test_case_insensitive() {
        let rule = FilterRule::parse("*.LOG").unwrap();
        assert!(rule.matches("debug.log", false));
    }

    #[test]
    fn test_directory_glob() {
        let rule = FilterRule::directory_glob("coverage/lcov-report").unwrap();
        assert!(rule.matches("web/coverage/lcov-report", true));
        assert!(rule.matches("coverage/lcov-report/index.html", false));
        assert!(!rule.matches("coverage", true));

        let rule = FilterRule::directory_glob("*.egg-info").unwrap();
        assert!(rule.matches("pkg.egg-info", true));
        assert!(!rule.matches("pkg.egg-info", false));
    }

    #[test]
    fn test_filename_matcher() {
        let matcher = PatternMatcher::filename("*.min.js");
        assert!(matcher.is_match("app.min.js"));
        assert!(matcher.is_match("APP.MIN.JS"));
        assert!(!matcher.is_match("app.js"));
    }
}
