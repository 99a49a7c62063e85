//! Directory traversal
//!
//! Walks each scan root top-down, consulting a [`PathFilter`] per entry.
//! Excluded directories are pruned before their children are read, and
//! oversized files are counted but never handed to the visitor.

pub mod stats;

pub use stats::{FileCategory, ScanStatistics, SizeSummary, SkippedEntry};

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::filter::{Decision, ExclusionReason, PathFilter};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Receives progress notifications during a walk.
///
/// Returning `ControlFlow::Break(())` aborts the walk. The walker stops at
/// the next entry, drops its directory handles and returns what it has.
pub trait ProgressObserver {
    fn notify(&mut self, done: usize, total: usize, description: &str) -> ControlFlow<()>;
}

impl<F> ProgressObserver for F
where
    F: FnMut(usize, usize, &str) -> ControlFlow<()>,
{
    fn notify(&mut self, done: usize, total: usize, description: &str) -> ControlFlow<()> {
        self(done, total, description)
    }
}

/// Observer that ignores all notifications
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn notify(&mut self, _done: usize, _total: usize, _description: &str) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Observer that logs every notification at debug level
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn notify(&mut self, done: usize, total: usize, description: &str) -> ControlFlow<()> {
        tracing::debug!("[{}/{}] {}", done, total, description);
        ControlFlow::Continue(())
    }
}

/// A file that passed filtering and the size ceiling
#[derive(Debug, Clone)]
pub struct RetainedFile {
    /// Absolute (or project-joined) path to read from
    pub path: PathBuf,
    /// Path relative to the project root
    pub relative: PathBuf,
    pub size: u64,
}

/// What the visitor did with a retained file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Extracted,
    /// No extractor claims the file; it is counted as excluded
    Unsupported,
}

/// Result of a walk
#[derive(Debug)]
pub struct WalkOutcome {
    pub stats: ScanStatistics,
    /// The observer requested an abort
    pub aborted: bool,
}

/// Top-down, pruning directory walker
pub struct DirectoryWalker {
    config: ScanConfig,
}

impl DirectoryWalker {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Resolve configured scan paths against `project`.
    ///
    /// Missing roots are recorded and skipped. A root nested inside an
    /// earlier root is dropped so no file is visited twice.
    pub fn resolve_roots(&self, project: &Path, stats: &mut ScanStatistics) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();

        for scan_path in &self.config.scan_paths {
            let root = project.join(scan_path);
            if !root.exists() {
                tracing::warn!("Scan root {:?} does not exist, skipping", root);
                stats.record_missing_root(&root);
                continue;
            }

            let root = std::fs::canonicalize(&root).unwrap_or(root);
            if let Some(outer) = roots.iter().find(|r| root.starts_with(r)) {
                tracing::debug!("Scan root {:?} is inside {:?}, skipping", root, outer);
                continue;
            }
            roots.push(root);
        }

        roots
    }

    /// Walk every scan root under `project`, calling `visit` for each retained file
    pub fn walk<V>(
        &self,
        project: &Path,
        observer: &mut dyn ProgressObserver,
        mut visit: V,
    ) -> WalkOutcome
    where
        V: FnMut(&RetainedFile) -> Result<Handled, ScanError>,
    {
        let mut stats = ScanStatistics::new();
        let project = std::fs::canonicalize(project).unwrap_or_else(|_| project.to_path_buf());
        let roots = self.resolve_roots(&project, &mut stats);

        if !roots.is_empty() {
            for err in PathFilter::pattern_errors(&self.config) {
                stats.record_error(&err);
            }
        }

        // Ignore files are indexed up front; the pre-pass also sizes the progress total
        let mut total = 0;
        let mut filtered_roots = Vec::with_capacity(roots.len());
        for root in roots {
            let mut filter = PathFilter::new(&self.config);
            let pre_pass = filter.discover_ignore_files(&root, self.config.max_depth);
            for err in &pre_pass.errors {
                stats.record_error(err);
            }
            total += pre_pass.entries;
            filtered_roots.push((root, filter));
        }

        let mut done = 0;
        let mut aborted = false;

        'roots: for (root, filter) in &filtered_roots {
            let mut entries = WalkDir::new(root)
                .max_depth(self.config.max_depth)
                .sort_by_file_name()
                .into_iter();

            while let Some(entry) = entries.next() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::debug!("Skipping unreadable entry: {}", err);
                        stats.record_error(&ScanError::Walk(err));
                        continue;
                    }
                };

                let path = entry.path();
                let relative = path.strip_prefix(&project).unwrap_or(path);
                // The filter sees paths relative to its own root
                let filter_path = if entry.depth() == 0 {
                    path.file_name().map(Path::new).unwrap_or(path)
                } else {
                    path.strip_prefix(root).unwrap_or(path)
                };

                if entry.file_type().is_dir() {
                    if entry.depth() > 0 && !filter.decide(filter_path, true).is_included() {
                        stats.record_excluded_dir(relative);
                        entries.skip_current_dir();
                        continue;
                    }

                    stats.record_directory();
                    done += 1;
                    let description = format!("Scanning directory {}", relative.display());
                    if observer
                        .notify(done, total.max(done), &description)
                        .is_break()
                    {
                        aborted = true;
                        break 'roots;
                    }
                    continue;
                }

                if !entry.file_type().is_file() {
                    continue;
                }

                if let Decision::Exclude(reason) = filter.decide(filter_path, false) {
                    stats.record_excluded(relative, reason);
                    continue;
                }

                let size = match entry.metadata() {
                    Ok(metadata) => metadata.len(),
                    Err(err) => {
                        stats.record_error(&ScanError::Walk(err));
                        continue;
                    }
                };
                if size > self.config.max_file_size {
                    tracing::debug!(
                        "Skipping {:?}: {} bytes exceeds limit of {}",
                        relative,
                        size,
                        self.config.max_file_size
                    );
                    stats.record_excluded(relative, ExclusionReason::TooLarge);
                    continue;
                }

                let file = RetainedFile {
                    path: path.to_path_buf(),
                    relative: relative.to_path_buf(),
                    size,
                };
                match visit(&file) {
                    Ok(Handled::Extracted) => stats.record_included(relative, size),
                    Ok(Handled::Unsupported) => {
                        stats.record_excluded(relative, ExclusionReason::Unsupported)
                    }
                    Err(err) => {
                        tracing::warn!("Skipping {:?}: {}", relative, err);
                        stats.record_error(&err);
                    }
                }

                done += 1;
                let description = format!("Scanning file {}", relative.display());
                if observer
                    .notify(done, total.max(done), &description)
                    .is_break()
                {
                    aborted = true;
                    break 'roots;
                }
            }
        }

        if aborted {
            tracing::info!("Scan aborted after {} entries", done);
        }
        stats.finish();

        WalkOutcome { stats, aborted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/app.py"), "def handler():\n    pass\n").unwrap();
        fs::write(root.join("src/util.py"), "x = 1\n").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "function f() {}\n").unwrap();
        fs::write(root.join("README.md"), "# Readme\n").unwrap();
        dir
    }

    fn visited(dir: &Path, config: &ScanConfig) -> (Vec<PathBuf>, WalkOutcome) {
        let mut seen = Vec::new();
        let outcome = DirectoryWalker::new(config).walk(dir, &mut NoProgress, |file| {
            seen.push(file.relative.clone());
            Ok(Handled::Extracted)
        });
        (seen, outcome)
    }

    #[test]
    fn test_walk_visits_retained_files_in_order() {
        let dir = project();
        let (seen, outcome) = visited(dir.path(), &ScanConfig::default());

        assert_eq!(
            seen,
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("src/app.py"),
                PathBuf::from("src/util.py"),
            ]
        );
        assert_eq!(outcome.stats.included_files, 3);
        assert!(!outcome.aborted);
    }

    #[test]
    fn test_excluded_directory_is_pruned() {
        let dir = project();
        let (seen, outcome) = visited(dir.path(), &ScanConfig::default());

        assert!(seen.iter().all(|p| !p.starts_with("node_modules")));
        assert!(outcome
            .stats
            .excluded_paths
            .iter()
            .all(|p| !p.starts_with("node_modules")));
        assert_eq!(outcome.stats.excluded_dirs["node_modules"], 1);
    }

    #[test]
    fn test_size_ceiling() {
        let dir = project();
        fs::write(dir.path().join("src/big.py"), "x".repeat(64)).unwrap();
        let mut config = ScanConfig::default();
        config.max_file_size = 32;

        let (seen, outcome) = visited(dir.path(), &config);

        assert!(!seen.contains(&PathBuf::from("src/big.py")));
        assert_eq!(outcome.stats.excluded_by_size, 1);
        assert!(outcome
            .stats
            .excluded_paths
            .contains(&PathBuf::from("src/big.py")));
    }

    #[test]
    fn test_max_depth() {
        let dir = project();
        let mut config = ScanConfig::default();
        config.max_depth = 1;

        let (seen, _) = visited(dir.path(), &config);
        assert_eq!(seen, vec![PathBuf::from("README.md")]);
    }

    #[test]
    fn test_unreadable_ignore_file_is_recorded_and_scan_continues() {
        let dir = project();
        fs::write(dir.path().join(".gitignore"), b"*.py\n\xff\xfe\n").unwrap();

        let (seen, outcome) = visited(dir.path(), &ScanConfig::default());

        assert_eq!(seen.len(), 3);
        assert_eq!(outcome.stats.skipped.len(), 1);
        assert_eq!(outcome.stats.skipped[0].category, ErrorCategory::Filesystem);
    }

    #[test]
    fn test_malformed_ignore_pattern_matches_literally() {
        let dir = project();
        fs::write(dir.path().join(".gitignore"), "[abc\n").unwrap();
        fs::write(dir.path().join("src/notes[abc].py"), "x = 1\n").unwrap();

        let (seen, outcome) = visited(dir.path(), &ScanConfig::default());

        assert!(!seen.contains(&PathBuf::from("src/notes[abc].py")));
        assert_eq!(seen.len(), 3);
        let pattern_errors: Vec<_> = outcome
            .stats
            .skipped
            .iter()
            .filter(|s| s.category == ErrorCategory::Pattern)
            .collect();
        assert_eq!(pattern_errors.len(), 1);
        assert!(pattern_errors[0].message.contains("[abc"));
    }

    #[test]
    fn test_malformed_configured_pattern_is_recorded_once() {
        let dir = project();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/extra.py"), "y = 2\n").unwrap();
        let mut config = ScanConfig::default();
        config.exclude_files.push("[bad".to_string());
        config.scan_paths = vec!["src".to_string(), "lib".to_string()];

        let (seen, outcome) = visited(dir.path(), &config);

        assert_eq!(seen.len(), 3);
        let skipped = &outcome.stats.skipped;
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].category, ErrorCategory::Pattern);
        assert_eq!(skipped[0].path, None);
    }

    #[test]
    fn test_zero_roots_is_empty() {
        let dir = project();
        let mut config = ScanConfig::default();
        config.scan_paths.clear();

        let (seen, outcome) = visited(dir.path(), &config);
        assert!(seen.is_empty());
        assert_eq!(outcome.stats.total_files, 0);
        assert!(outcome.stats.missing_roots.is_empty());
    }

    #[test]
    fn test_missing_root_is_recorded() {
        let dir = project();
        let mut config = ScanConfig::default();
        config.scan_paths = vec!["missing".to_string(), "src".to_string()];

        let (seen, outcome) = visited(dir.path(), &config);
        assert_eq!(outcome.stats.missing_roots.len(), 1);
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_nested_root_is_skipped() {
        let dir = project();
        let mut config = ScanConfig::default();
        config.scan_paths = vec![".".to_string(), "src".to_string()];

        let (seen, _) = visited(dir.path(), &config);
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_unsupported_files_count_as_excluded() {
        let dir = project();
        let mut config = ScanConfig::default();
        config.include_patterns.clear();

        let outcome = DirectoryWalker::new(&config).walk(dir.path(), &mut NoProgress, |file| {
            if file.relative.extension().is_some_and(|e| e == "py") {
                Ok(Handled::Extracted)
            } else {
                Ok(Handled::Unsupported)
            }
        });

        assert_eq!(outcome.stats.included_files, 2);
        assert_eq!(
            outcome.stats.excluded_reasons[&ExclusionReason::Unsupported],
            1
        );
    }

    #[test]
    fn test_observer_abort() {
        let dir = project();
        let mut calls = 0;
        let mut observer = |_done: usize, _total: usize, _desc: &str| {
            calls += 1;
            if calls == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };

        let mut seen = 0;
        let outcome = DirectoryWalker::new(&ScanConfig::default()).walk(
            dir.path(),
            &mut observer,
            |_| {
                seen += 1;
                Ok(Handled::Extracted)
            },
        );

        assert!(outcome.aborted);
        assert_eq!(seen, 1);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_progress_totals() {
        let dir = project();
        let mut last = (0, 0);
        let mut observer = |done: usize, total: usize, _desc: &str| {
            assert!(done <= total);
            last = (done, total);
            ControlFlow::Continue(())
        };

        DirectoryWalker::new(&ScanConfig::default()).walk(dir.path(), &mut observer, |_| {
            Ok(Handled::Extracted)
        });

        // root, src and three files
        assert_eq!(last, (5, 5));
    }
}
