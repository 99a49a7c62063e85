//! Per-directory ignore rules
//!
//! Ignore files are read once, during a pre-pass, into an index keyed by the
//! directory that declares them. Lookups walk from a path's directory up to
//! the scan root, so each query costs O(depth).

use super::rule::{FilterRule, Polarity};
use super::to_slash;
use crate::error::ScanError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Ignore rules discovered under one scan root
#[derive(Debug, Clone, Default)]
pub struct IgnoreFileSet {
    /// Directory (relative to the scan root, "" for the root) to its rules
    rules: BTreeMap<PathBuf, Vec<FilterRule>>,
}

impl IgnoreFileSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse ignore-file content into rules, in declaration order
    pub fn parse_rules(content: &str) -> Vec<FilterRule> {
        content.lines().filter_map(FilterRule::parse).collect()
    }

    /// Add rules declared in `dir`; rules already present for it are extended
    pub fn insert(&mut self, dir: impl Into<PathBuf>, rules: Vec<FilterRule>) {
        if rules.is_empty() {
            return;
        }
        self.rules.entry(dir.into()).or_default().extend(rules);
    }

    /// Read the named ignore files in `root/relative_dir`.
    ///
    /// Missing files are not an error. Unreadable ones are skipped and
    /// returned so the caller can record them, as are patterns that fell
    /// back to literal matching.
    pub fn load_dir(
        &mut self,
        root: &Path,
        relative_dir: &Path,
        names: &[String],
    ) -> Vec<ScanError> {
        let mut errors = Vec::new();

        for name in names {
            let path = root.join(relative_dir).join(name);
            if !path.is_file() {
                continue;
            }

            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let rules = Self::parse_rules(&content);
                    errors.extend(rules.iter().filter_map(|r| r.pattern_error(Some(&path))));
                    tracing::debug!("Loaded {} ignore rules from {:?}", rules.len(), path);
                    self.insert(relative_dir.to_path_buf(), rules);
                }
                Err(err) => {
                    tracing::debug!("Skipping unreadable ignore file {:?}: {}", path, err);
                    errors.push(ScanError::filesystem(path, err));
                }
            }
        }

        errors
    }

    /// Find the nearest exclude rule matching a path relative to the scan root
    pub fn matching_rule(&self, relative: &Path, is_directory: bool) -> Option<&FilterRule> {
        let parent = relative.parent().unwrap_or_else(|| Path::new(""));

        for dir in parent.ancestors() {
            let Some(rules) = self.rules.get(dir) else {
                continue;
            };
            let local = to_slash(relative.strip_prefix(dir).unwrap_or(relative));

            if let Some(rule) = rules
                .iter()
                .filter(|r| r.polarity == Polarity::Exclude)
                .find(|r| r.matches(&local, is_directory))
            {
                return Some(rule);
            }
        }

        None
    }

    /// Whether any ignore rule excludes the path
    pub fn is_ignored(&self, relative: &Path, is_directory: bool) -> bool {
        self.matching_rule(relative, is_directory).is_some()
    }

    /// Directories that declare rules, in order
    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.rules.keys().map(|p| p.as_path())
    }

    /// Rules declared in one directory
    pub fn rules_for(&self, dir: &Path) -> &[FilterRule] {
        self.rules.get(dir).map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Number of directories with rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
