//! Path inclusion and exclusion
//!
//! Decides, for every path under a scan root, whether it takes part in the
//! scan. Rules are evaluated in a fixed order and the first decisive one wins:
//! - Excluded file names
//! - Blacklisted or excluded directory segments
//! - Per-directory ignore files, nearest directory first
//! - Include patterns

pub mod defaults;
mod ignore_index;
mod rule;

pub use ignore_index::IgnoreFileSet;
pub use rule::{FilterRule, Polarity, Scope};

use crate::config::ScanConfig;
use crate::error::ScanError;
use rule::PatternMatcher;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Outcome of filtering one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    Exclude(ExclusionReason),
}

impl Decision {
    pub fn is_included(&self) -> bool {
        matches!(self, Decision::Include)
    }
}

/// Why a path was left out of the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Matched the excluded file-name list
    FileName,
    /// Inside a blacklisted or excluded directory
    Directory,
    /// Matched a rule from an ignore file
    IgnoreFile,
    /// Matched no include pattern
    NotIncluded,
    /// Larger than the configured maximum size
    TooLarge,
    /// Retained by the filter but no extractor handles it
    Unsupported,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::FileName => write!(f, "file_name"),
            ExclusionReason::Directory => write!(f, "directory"),
            ExclusionReason::IgnoreFile => write!(f, "ignore_file"),
            ExclusionReason::NotIncluded => write!(f, "not_included"),
            ExclusionReason::TooLarge => write!(f, "too_large"),
            ExclusionReason::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Result of the ignore-file discovery pass
#[derive(Debug, Default)]
pub struct PrePass {
    /// Directories and files that survived pruning
    pub entries: usize,
    /// Unreadable ignore files and walk errors
    pub errors: Vec<ScanError>,
}

/// Decides inclusion for paths relative to one scan root
#[derive(Debug, Clone)]
pub struct PathFilter {
    exclude_files: Vec<PatternMatcher>,
    exclude_dirs: Vec<FilterRule>,
    include: Vec<PatternMatcher>,
    ignore_file_names: Vec<String>,
    ignore_files: IgnoreFileSet,
}

impl PathFilter {
    /// Compile the static pattern lists from configuration
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            exclude_files: config
                .exclude_files
                .iter()
                .map(|p| PatternMatcher::filename(p))
                .collect(),
            exclude_dirs: config
                .exclude_patterns
                .iter()
                .filter_map(|p| FilterRule::directory_glob(p))
                .collect(),
            include: config
                .include_patterns
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| PatternMatcher::filename(p))
                .collect(),
            ignore_file_names: config.ignore_file_names.clone(),
            ignore_files: IgnoreFileSet::new(),
        }
    }

    /// Configured patterns that are not valid globs and will match literally
    pub fn pattern_errors(config: &ScanConfig) -> Vec<ScanError> {
        let filename_errors = config
            .exclude_files
            .iter()
            .chain(config.include_patterns.iter().filter(|p| !p.trim().is_empty()))
            .filter_map(|p| {
                PatternMatcher::filename_error(p)
                    .map(|err| ScanError::pattern(p.as_str(), None, err))
            });
        let directory_errors = config
            .exclude_patterns
            .iter()
            .filter_map(|p| FilterRule::directory_glob(p)?.pattern_error(None));

        filename_errors.chain(directory_errors).collect()
    }

    /// Replace the ignore-file index
    pub fn with_ignore_files(mut self, ignore_files: IgnoreFileSet) -> Self {
        self.ignore_files = ignore_files;
        self
    }

    /// The ignore-file index
    pub fn ignore_files(&self) -> &IgnoreFileSet {
        &self.ignore_files
    }

    /// Walk `root` once, loading every ignore file into the index.
    ///
    /// Excluded directories are pruned here as well, so ignore files inside
    /// them are never read. A directory's own ignore file is loaded before
    /// any of its children are judged.
    pub fn discover_ignore_files(&mut self, root: &Path, max_depth: usize) -> PrePass {
        let mut pre_pass = PrePass::default();
        let mut entries = WalkDir::new(root)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    pre_pass.errors.push(ScanError::Walk(err));
                    continue;
                }
            };

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let is_dir = entry.file_type().is_dir();

            if entry.depth() > 0 && !self.decide(relative, is_dir).is_included() {
                if is_dir {
                    entries.skip_current_dir();
                }
                continue;
            }

            pre_pass.entries += 1;
            if is_dir {
                let errors = self
                    .ignore_files
                    .load_dir(root, relative, &self.ignore_file_names);
                pre_pass.errors.extend(errors);
            }
        }

        pre_pass
    }

    /// Decide whether a path relative to the scan root takes part in the scan
    pub fn decide(&self, path: &Path, is_directory: bool) -> Decision {
        if !is_directory {
            let file_name = file_name_of(path);
            if self.exclude_files.iter().any(|m| m.is_match(&file_name)) {
                return Decision::Exclude(ExclusionReason::FileName);
            }
        }

        if self.in_excluded_directory(path, is_directory) {
            return Decision::Exclude(ExclusionReason::Directory);
        }

        if self.ignore_files.is_ignored(path, is_directory) {
            return Decision::Exclude(ExclusionReason::IgnoreFile);
        }

        if !is_directory && !self.include.is_empty() {
            let file_name = file_name_of(path);
            if !self.include.iter().any(|m| m.is_match(&file_name)) {
                return Decision::Exclude(ExclusionReason::NotIncluded);
            }
        }

        Decision::Include
    }

    fn in_excluded_directory(&self, path: &Path, is_directory: bool) -> bool {
        let dirs = if is_directory {
            Some(path)
        } else {
            path.parent()
        };

        let blacklisted = dirs
            .map(|d| {
                d.components().any(|c| match c {
                    Component::Normal(name) => {
                        defaults::is_excluded_dir_name(&name.to_string_lossy())
                    }
                    _ => false,
                })
            })
            .unwrap_or(false);
        if blacklisted {
            return true;
        }

        let relative = to_slash(path);
        self.exclude_dirs
            .iter()
            .any(|rule| rule.matches(&relative, is_directory))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Render a path with `/` separators, keeping a leading root or drive prefix
pub(crate) fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part = match component {
            Component::Prefix(prefix) => {
                out.push_str(&prefix.as_os_str().to_string_lossy());
                continue;
            }
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::CurDir => continue,
            Component::ParentDir => "..".into(),
            Component::Normal(part) => part.to_string_lossy(),
        };
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}
