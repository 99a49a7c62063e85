//! DocSift - project scanning for code/documentation discrepancies
//!
//! This library walks a project tree, extracts code elements (functions,
//! classes, endpoints, imports) and documentation elements (headings, code
//! blocks, whole documents), and reports where the two disagree.
//!
//! ```no_run
//! use docsift::{DiscrepancyMatcher, ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let project = Path::new(".");
//! let config = ScanConfig::load_or_default(project)?;
//! let matcher = DiscrepancyMatcher::new(&config.matcher);
//!
//! let mut scanner = Scanner::new(config)?;
//! let result = scanner.scan(project);
//! println!("{}", docsift::report::discrepancy_report(&result.discrepancies(&matcher)));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod logging;
pub mod matcher;
pub mod report;
pub mod scanner;
pub mod walk;

/// Re-export commonly used types
pub use config::ScanConfig;
pub use error::{ErrorCategory, ScanError};
pub use extract::{CodeElement, DocElement, Element, ElementKind, Strategy};
pub use filter::{Decision, ExclusionReason, PathFilter};
pub use matcher::{Discrepancies, DiscrepancyMatcher, MismatchReason, MismatchedPair};
pub use scanner::{FileScan, ScanResult, Scanner};
pub use walk::{DirectoryWalker, ProgressObserver, ScanStatistics};

/// Application-wide result type
pub use anyhow::Result;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "docsift";
