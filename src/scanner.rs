//! Scan orchestration
//!
//! Walks the project, hands each retained file to the extractor registry and
//! collects the resulting code and documentation elements.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::extract::{CodeElement, DocElement, Extracted, ExtractorRegistry};
use crate::matcher::{Discrepancies, DiscrepancyMatcher};
use crate::walk::{DirectoryWalker, Handled, NoProgress, ProgressObserver, ScanStatistics};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything one scan produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Code elements, in walk order then source order
    pub code_elements: Vec<CodeElement>,
    /// Documentation elements, in walk order then source order
    pub doc_elements: Vec<DocElement>,
    pub statistics: ScanStatistics,
    /// The progress observer stopped the scan early
    pub aborted: bool,
}

impl ScanResult {
    /// Match the collected elements against each other
    pub fn discrepancies(&self, matcher: &DiscrepancyMatcher) -> Discrepancies {
        matcher.find_discrepancies(&self.code_elements, &self.doc_elements)
    }

    /// Export elements and statistics as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize scan result")
    }
}

/// Elements of a single scanned file
#[derive(Debug, Clone)]
pub enum FileScan {
    Code(Vec<CodeElement>),
    Docs(Vec<DocElement>),
    /// No extractor handles the file's extension
    Unsupported,
}

/// Walks a project and extracts elements from every retained file
pub struct Scanner {
    config: ScanConfig,
    walker: DirectoryWalker,
    registry: ExtractorRegistry,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let registry = ExtractorRegistry::with_defaults(&config.extract)
            .context("Failed to initialize extractors")?;

        Ok(Self {
            walker: DirectoryWalker::new(&config),
            config,
            registry,
        })
    }

    /// Scanner configured from `<root>/.docsift.toml`, or defaults
    pub fn for_project(project_root: &Path) -> Result<Self> {
        Self::new(ScanConfig::load_or_default(project_root)?)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Access the registry, e.g. to register additional extractors
    pub fn registry_mut(&mut self) -> &mut ExtractorRegistry {
        &mut self.registry
    }

    /// Scan a project without progress reporting
    pub fn scan(&mut self, project: &Path) -> ScanResult {
        self.scan_with_progress(project, &mut NoProgress)
    }

    /// Scan a project, reporting progress to `observer`.
    ///
    /// Per-file failures are recorded in the statistics and never abort the
    /// scan. A missing project yields an empty result.
    pub fn scan_with_progress(
        &mut self,
        project: &Path,
        observer: &mut dyn ProgressObserver,
    ) -> ScanResult {
        let mut code_elements = Vec::new();
        let mut doc_elements = Vec::new();

        let outcome = self.walker.walk(project, observer, |file| {
            let bytes = std::fs::read(&file.path)
                .map_err(|e| ScanError::filesystem(&file.path, e))?;
            let content = String::from_utf8_lossy(&bytes);

            match self.registry.extract(&file.relative, &content) {
                None => Ok(Handled::Unsupported),
                Some(Err(e)) => Err(e),
                Some(Ok(Extracted::Code(elements))) => {
                    code_elements.extend(elements);
                    Ok(Handled::Extracted)
                }
                Some(Ok(Extracted::Docs(elements))) => {
                    doc_elements.extend(elements);
                    Ok(Handled::Extracted)
                }
            }
        });

        let statistics = outcome.stats;
        tracing::info!(
            "Scanned {} files ({} included, {} excluded) in {:.2?}",
            statistics.total_files,
            statistics.included_files,
            statistics.excluded_files,
            statistics.elapsed
        );
        tracing::info!(
            "Extracted {} code elements and {} doc elements",
            code_elements.len(),
            doc_elements.len()
        );
        if !statistics.skipped.is_empty() {
            tracing::info!("{} entries skipped because of errors", statistics.skipped.len());
        }

        ScanResult {
            code_elements,
            doc_elements,
            statistics,
            aborted: outcome.aborted,
        }
    }

    /// Extract a single file, bypassing the path filter
    pub fn scan_file(&mut self, path: &Path) -> Result<FileScan> {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        let content = String::from_utf8_lossy(&bytes);

        let scan = match self.registry.extract(path, &content) {
            None => FileScan::Unsupported,
            Some(result) => match result.with_context(|| format!("Failed to extract {:?}", path))? {
                Extracted::Code(elements) => FileScan::Code(elements),
                Extracted::Docs(elements) => FileScan::Docs(elements),
            },
        };

        Ok(scan)
    }
}
