//! Human-readable reports
//!
//! Renders scan results and discrepancies as Markdown. Long lists are cut
//! after [`LIST_LIMIT`] entries.

use crate::extract::Element;
use crate::matcher::Discrepancies;
use crate::scanner::ScanResult;
use std::fmt::Write;

/// Entries shown per list before "... and N more"
pub const LIST_LIMIT: usize = 10;

fn write_list<T, F>(out: &mut String, items: &[T], mut line: F)
where
    F: FnMut(&T) -> String,
{
    for item in items.iter().take(LIST_LIMIT) {
        let _ = writeln!(out, "- {}", line(item));
    }
    if items.len() > LIST_LIMIT {
        let _ = writeln!(out, "- ... and {} more", items.len() - LIST_LIMIT);
    }
}

fn location<E: Element>(element: &E) -> String {
    format!(
        "`{}` ({}) at {}:{}",
        element.name(),
        element.kind(),
        element.file_path(),
        element.line_number()
    )
}

/// Markdown summary of a scan
pub fn scan_report(result: &ScanResult) -> String {
    let stats = &result.statistics;
    let mut out = String::new();

    let _ = writeln!(out, "# Scan Report\n");
    let _ = writeln!(out, "Started: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "Duration: {:.2?}", stats.elapsed);
    if result.aborted {
        let _ = writeln!(out, "\n**Scan was aborted before completion.**");
    }

    let _ = writeln!(out, "\n## Files\n");
    let _ = writeln!(out, "- Total: {}", stats.total_files);
    let _ = writeln!(
        out,
        "- Included: {} ({:.1}%)",
        stats.included_files,
        stats.inclusion_rate()
    );
    let _ = writeln!(out, "- Excluded: {}", stats.excluded_files);
    let _ = writeln!(out, "- Too large: {}", stats.excluded_by_size);
    let _ = writeln!(out, "- Directories scanned: {}", stats.directories_scanned);
    let _ = writeln!(out, "- Files per second: {:.1}", stats.files_per_second());
    if stats.file_sizes.count > 0 {
        let _ = writeln!(
            out,
            "- Size: {} bytes total, {:.0} average, {} largest",
            stats.file_sizes.total_bytes,
            stats.file_sizes.average_bytes(),
            stats.file_sizes.max_bytes
        );
    }

    if !stats.by_category.is_empty() {
        let _ = writeln!(out, "\n## Categories\n");
        for (category, count) in &stats.by_category {
            let _ = writeln!(out, "- {}: {}", category, count);
        }
    }

    if !stats.excluded_reasons.is_empty() {
        let _ = writeln!(out, "\n## Exclusions\n");
        for (reason, count) in &stats.excluded_reasons {
            let _ = writeln!(out, "- {}: {}", reason, count);
        }
    }

    if !stats.skipped.is_empty() {
        let _ = writeln!(out, "\n## Errors\n");
        write_list(&mut out, &stats.skipped, |entry| match &entry.path {
            Some(path) => format!("{} `{}`: {}", entry.category, path.display(), entry.message),
            None => format!("{}: {}", entry.category, entry.message),
        });
    }

    let _ = writeln!(out, "\n## Code Elements ({})\n", result.code_elements.len());
    write_list(&mut out, &result.code_elements, location);

    let _ = writeln!(out, "\n## Documentation Elements ({})\n", result.doc_elements.len());
    write_list(&mut out, &result.doc_elements, location);

    out
}

/// Markdown summary of discrepancies
pub fn discrepancy_report(discrepancies: &Discrepancies) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Discrepancy Report\n");
    if discrepancies.is_empty() {
        let _ = writeln!(out, "No discrepancies found.");
        return out;
    }

    let _ = writeln!(
        out,
        "\n## Undocumented Code ({})\n",
        discrepancies.undocumented_code.len()
    );
    write_list(&mut out, &discrepancies.undocumented_code, location);

    let _ = writeln!(
        out,
        "\n## Outdated Documentation ({})\n",
        discrepancies.outdated_documentation.len()
    );
    write_list(&mut out, &discrepancies.outdated_documentation, location);

    let _ = writeln!(
        out,
        "\n## Mismatched Elements ({})\n",
        discrepancies.mismatched_elements.len()
    );
    write_list(&mut out, &discrepancies.mismatched_elements, |pair| {
        format!(
            "`{}` in {} vs {}:{}: {}",
            pair.code.name,
            pair.code.file_path,
            pair.documentation.file_path,
            pair.documentation.line_number,
            pair.reason
        )
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{CodeElement, ElementKind, Strategy};
    use crate::walk::ScanStatistics;

    fn function(name: &str) -> CodeElement {
        let mut element = CodeElement::new(name, ElementKind::Function, 3, Strategy::Structural);
        element.file_path = "src/app.py".to_string();
        element
    }

    #[test]
    fn test_discrepancy_report_truncates() {
        let discrepancies = Discrepancies {
            undocumented_code: (0..13).map(|i| function(&format!("f{}", i))).collect(),
            ..Discrepancies::default()
        };

        let report = discrepancy_report(&discrepancies);
        assert!(report.contains("## Undocumented Code (13)"));
        assert!(report.contains("`f9` (function) at src/app.py:3"));
        assert!(!report.contains("`f10`"));
        assert!(report.contains("... and 3 more"));
    }

    #[test]
    fn test_empty_discrepancy_report() {
        let report = discrepancy_report(&Discrepancies::default());
        assert!(report.contains("No discrepancies found."));
    }

    #[test]
    fn test_scan_report() {
        let result = ScanResult {
            code_elements: vec![function("handler")],
            doc_elements: Vec::new(),
            statistics: ScanStatistics::new(),
            aborted: true,
        };

        let report = scan_report(&result);
        assert!(report.starts_with("# Scan Report"));
        assert!(report.contains("aborted"));
        assert!(report.contains("## Code Elements (1)"));
        assert!(report.contains("`handler`"));
    }
}
