//! Scan statistics
//!
//! A passive aggregator fed by the walker. Nothing here influences which
//! files are scanned.

use crate::error::{ErrorCategory, ScanError};
use crate::filter::ExclusionReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Coarse file family, by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Code,
    Documentation,
    Configuration,
    Data,
    Image,
    Media,
    Other,
}

impl FileCategory {
    /// Categorize a lowercase extension without the leading dot
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "py" | "js" | "jsx" | "ts" | "tsx" | "java" | "cpp" | "c" | "h" | "cs" | "go"
            | "rb" | "php" | "html" | "css" | "sql" | "sh" | "pl" | "r" | "m" | "swift" | "kt"
            | "scala" | "dart" | "rs" | "vue" | "svelte" => FileCategory::Code,
            "md" | "markdown" | "mdx" | "rst" | "txt" | "pdf" | "doc" | "docx" | "odt" | "tex"
            | "org" => FileCategory::Documentation,
            "json" | "yaml" | "yml" | "toml" | "ini" | "cfg" | "conf" | "xml" | "env"
            | "properties" | "lock" => FileCategory::Configuration,
            "csv" | "jsonl" | "xlsx" | "xls" | "db" | "sqlite" | "sqlitedb" | "hdf5" | "pkl"
            | "pickle" | "npy" | "npz" => FileCategory::Data,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "ico" => FileCategory::Image,
            "mp3" | "wav" | "mp4" | "avi" | "mov" | "mkv" => FileCategory::Media,
            _ => FileCategory::Other,
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileCategory::Code => write!(f, "code"),
            FileCategory::Documentation => write!(f, "documentation"),
            FileCategory::Configuration => write!(f, "configuration"),
            FileCategory::Data => write!(f, "data"),
            FileCategory::Image => write!(f, "image"),
            FileCategory::Media => write!(f, "media"),
            FileCategory::Other => write!(f, "other"),
        }
    }
}

/// Lowercase extension of a path, or "" when it has none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Size summary over included files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeSummary {
    pub count: usize,
    pub total_bytes: u64,
    pub min_bytes: u64,
    pub max_bytes: u64,
}

impl SizeSummary {
    fn record(&mut self, size: u64) {
        if self.count == 0 {
            self.min_bytes = size;
            self.max_bytes = size;
        } else {
            self.min_bytes = self.min_bytes.min(size);
            self.max_bytes = self.max_bytes.max(size);
        }
        self.count += 1;
        self.total_bytes += size;
    }

    pub fn average_bytes(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.count as f64
        }
    }
}

/// A unit of work that failed and was skipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: Option<PathBuf>,
    pub category: ErrorCategory,
    pub message: String,
}

/// Counts and timings for one scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatistics {
    /// Files the filter was consulted for
    pub total_files: usize,
    pub included_files: usize,
    pub excluded_files: usize,
    pub excluded_by_size: usize,
    pub by_category: BTreeMap<FileCategory, usize>,
    pub by_extension: BTreeMap<String, usize>,
    pub excluded_extensions: BTreeMap<String, usize>,
    pub excluded_reasons: BTreeMap<ExclusionReason, usize>,
    /// Excluded directory name to how often it was pruned
    pub excluded_dirs: BTreeMap<String, usize>,
    pub file_sizes: SizeSummary,
    pub directories_scanned: usize,
    pub included_paths: Vec<PathBuf>,
    pub excluded_paths: Vec<PathBuf>,
    pub missing_roots: Vec<PathBuf>,
    pub skipped: Vec<SkippedEntry>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl Default for ScanStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStatistics {
    pub fn new() -> Self {
        Self {
            total_files: 0,
            included_files: 0,
            excluded_files: 0,
            excluded_by_size: 0,
            by_category: BTreeMap::new(),
            by_extension: BTreeMap::new(),
            excluded_extensions: BTreeMap::new(),
            excluded_reasons: BTreeMap::new(),
            excluded_dirs: BTreeMap::new(),
            file_sizes: SizeSummary::default(),
            directories_scanned: 0,
            included_paths: Vec::new(),
            excluded_paths: Vec::new(),
            missing_roots: Vec::new(),
            skipped: Vec::new(),
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn record_included(&mut self, relative: &Path, size: u64) {
        let ext = extension_of(relative);
        self.total_files += 1;
        self.included_files += 1;
        *self
            .by_category
            .entry(FileCategory::from_extension(&ext))
            .or_default() += 1;
        *self.by_extension.entry(ext).or_default() += 1;
        self.file_sizes.record(size);
        self.included_paths.push(relative.to_path_buf());
    }

    pub fn record_excluded(&mut self, relative: &Path, reason: ExclusionReason) {
        self.total_files += 1;
        self.excluded_files += 1;
        if reason == ExclusionReason::TooLarge {
            self.excluded_by_size += 1;
        }
        *self.excluded_reasons.entry(reason).or_default() += 1;
        *self
            .excluded_extensions
            .entry(extension_of(relative))
            .or_default() += 1;
        self.excluded_paths.push(relative.to_path_buf());
    }

    /// A pruned directory; its contents are never counted
    pub fn record_excluded_dir(&mut self, relative: &Path) {
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        *self.excluded_dirs.entry(name).or_default() += 1;
    }

    pub fn record_directory(&mut self) {
        self.directories_scanned += 1;
    }

    pub fn record_missing_root(&mut self, root: &Path) {
        self.missing_roots.push(root.to_path_buf());
    }

    pub fn record_error(&mut self, err: &ScanError) {
        self.skipped.push(SkippedEntry {
            path: err.path(),
            category: err.category(),
            message: err.to_string(),
        });
    }

    /// Stamp the elapsed time since `started_at`
    pub fn finish(&mut self) {
        self.elapsed = (Utc::now() - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
    }

    /// Percentage of considered files that were included
    pub fn inclusion_rate(&self) -> f64 {
        self.included_files as f64 / self.total_files.max(1) as f64 * 100.0
    }

    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.included_files as f64 / secs
        } else {
            0.0
        }
    }
}
