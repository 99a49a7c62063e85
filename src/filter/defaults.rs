//! Fixed directory blacklist
//!
//! Build output and dependency directories that are pruned before any
//! other rule is consulted. Bump `RULESET_VERSION` whenever the list changes.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Version of the built-in directory blacklist
pub const RULESET_VERSION: u32 = 1;

const EXCLUDED_DIR_NAMES: &[&str] = &[
    "venv",
    ".venv",
    "node_modules",
    "__pycache__",
    ".git",
    "dist",
    "build",
    ".pytest_cache",
    ".vscode",
    ".idea",
    "target",
    "out",
    ".next",
    "coverage",
    ".tox",
    ".nox",
    "env",
    ".env",
    "env.bak",
    ".env.bak",
    "__bundle",
    "pods",
    ".dart_tool",
    ".pub",
    "vendor",
    "bower_components",
    ".npm",
    ".yarn",
    "jspm_packages",
    ".angular",
    ".nuxt",
    ".vercel",
    ".netlify",
    ".cache",
    "tmp",
    "temp",
    ".tmp",
    ".temp",
];

static EXCLUDED_DIRS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| EXCLUDED_DIR_NAMES.iter().copied().collect());

/// Whether a single directory name is on the blacklist (case-insensitive)
pub fn is_excluded_dir_name(name: &str) -> bool {
    EXCLUDED_DIRS.contains(name.to_ascii_lowercase().as_str())
}

/// The blacklist entries, lowercased
pub fn excluded_dir_names() -> impl Iterator<Item = &'static str> {
    EXCLUDED_DIR_NAMES.iter().copied()
}
