//! Scan configuration for DocSift

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the per-project configuration file
pub const CONFIG_FILE_NAME: &str = ".docsift.toml";

/// Configuration for one scan invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Scan roots, relative to the project path
    #[serde(default = "default_scan_paths")]
    pub scan_paths: Vec<String>,

    /// Filename globs a file must match to be retained (empty = everything)
    #[serde(default = "default_include_patterns")]
    pub include_patterns: Vec<String>,

    /// Directory-name globs; patterns containing `/` match relative paths
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Filename globs that are always excluded (case-insensitive)
    #[serde(default = "default_exclude_files")]
    pub exclude_files: Vec<String>,

    /// Maximum directory depth below each scan root
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum file size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Names of per-directory ignore files
    #[serde(default = "default_ignore_file_names")]
    pub ignore_file_names: Vec<String>,

    /// Element extraction settings
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Discrepancy matching settings
    #[serde(default)]
    pub matcher: MatcherConfig,
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Decorator callee names that mark an HTTP endpoint
    #[serde(default = "default_api_verbs")]
    pub api_verbs: Vec<String>,

    /// Receiver name suffixes the verb must be bound to (e.g. `app.get`)
    #[serde(default = "default_api_receivers")]
    pub api_receivers: Vec<String>,

    /// Leading character marking a private method
    #[serde(default = "default_private_marker")]
    pub private_marker: char,

    /// Preview length for structured documents
    #[serde(default = "default_doc_preview_chars")]
    pub doc_preview_chars: usize,

    /// Preview length for plain text documents
    #[serde(default = "default_text_preview_chars")]
    pub text_preview_chars: usize,

    /// Minimum underline length for underline-style headings
    #[serde(default = "default_min_underline_len")]
    pub min_underline_len: usize,
}

/// Matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Words whose presence counts as documenting parameters
    #[serde(default = "default_parameter_keywords")]
    pub parameter_keywords: Vec<String>,

    /// Words whose presence counts as documenting a return value
    #[serde(default = "default_return_keywords")]
    pub return_keywords: Vec<String>,

    /// Both texts must be longer than this before divergence is judged
    #[serde(default = "default_min_divergence_len")]
    pub min_divergence_len: usize,

    /// Leave whole-document records out of `outdated_documentation`
    #[serde(default = "default_true")]
    pub skip_whole_document_in_outdated: bool,
}

fn default_scan_paths() -> Vec<String> {
    vec![".".to_string()]
}

fn default_include_patterns() -> Vec<String> {
    to_strings(&[
        "*.py", "*.js", "*.jsx", "*.ts", "*.tsx", "*.rs", "*.json", "*.yaml", "*.yml", "*.md",
        "*.markdown", "*.rst", "*.txt", ".env", ".env.example",
    ])
}

fn default_exclude_patterns() -> Vec<String> {
    to_strings(&[
        "node_modules", "venv", ".venv", "venv.bak", "__pycache__", ".git", "dist", "build",
        ".pytest_cache", ".vscode", ".idea", "target", "out", ".next", "coverage", ".tox",
        ".nox", "env", ".env", "env.bak", ".env.bak", "__bundle", "Pods", ".dart_tool",
        ".pub", "vendor", "bower_components", ".npm", ".yarn", "jspm_packages", ".angular",
        ".nuxt", ".vercel", ".netlify", ".cache", "tmp", "temp", ".tmp", ".temp",
        ".serverless", ".dynamodb", ".fusebox", ".nyc_output", "nyc_output", ".sass-cache",
        "lib-cov", "e2e", "nightwatch", "webdriver", ".grunt", ".node_repl_history", ".nvm",
        ".rbenv", ".bundle", "TestResults", ".hypothesis", "site-packages", "htmlcov",
        ".cover", ".coverage", ".spyderproject", ".spyproject", ".ropeproject", ".mypy_cache",
        "mypy_cache", ".pyre", ".pytype", ".vs", ".settings", ".history", ".vagrant", ".c9",
        ".istanbul", "coverage/lcov-report", "vendor/bundle", "vendor/cache", "vendor/gems",
        "vendor/ruby", "paket-files", ".paket", "packages", "lib", "obj", ".nuget",
        "CMakeFiles",
    ])
}

fn default_exclude_files() -> Vec<String> {
    to_strings(&[
        "*.pyc", "*.pyo", "*.pyd", "*.log", "*.tmp", "*.temp", "*.bak", "package-lock.json",
        "yarn.lock", "*.lock", "*.min.js", "*.bundle.js", "*.ico", "*.png", "*.jpg", "*.svg",
        "*.swp", "*.swo", "*~", "#*#", ".#*", ".DS_Store", "Thumbs.db", "ehthumbs.db",
        "*.lcov", "*.coverage", "coverage.xml", "nosetests.xml", ".coverage.*", "lcov.info",
        "jacoco*.xml", "*.gcda", "*.gcno", "coverage-final.json", ".nfs*", ".fuse_hidden*",
        "._*", "Icon?", "*.tmproj", "*.pid", "*.seed", "*.pid.lock", "*.webmanifest",
        "key.pem", "*.secret", "*.a", "*.o", "*.so", "*.dll", "*.dylib", "*.class", "*.obj",
        "*.exe", "*.lib", "*.nupkg", "*.egg-info", "pip-log.txt",
        "pip-delete-this-directory.txt", ".python-version", ".node-version", ".nvmrc",
        ".ruby-version", "npm-debug.log*", "yarn-debug.log*", "yarn-error.log*",
        ".yarn-integrity", "packages.lock.json", ".dmypy.json", "dmypy.json",
        "pyrightconfig.json", "*.sublime-project", "*.sublime-workspace", "CACHEDIR.TAG",
        "CMakeCache.txt",
    ])
}

fn default_max_depth() -> usize {
    10
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_ignore_file_names() -> Vec<String> {
    vec![".gitignore".to_string()]
}

fn default_api_verbs() -> Vec<String> {
    to_strings(&["get", "post", "put", "delete", "patch"])
}

fn default_api_receivers() -> Vec<String> {
    to_strings(&["app", "router"])
}

fn default_private_marker() -> char {
    '_'
}

fn default_doc_preview_chars() -> usize {
    1000
}

fn default_text_preview_chars() -> usize {
    2000
}

fn default_min_underline_len() -> usize {
    2
}

fn default_parameter_keywords() -> Vec<String> {
    to_strings(&["parameter", "param", "arg"])
}

fn default_return_keywords() -> Vec<String> {
    to_strings(&["return", "returns", "rueckgabe"])
}

fn default_min_divergence_len() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_paths: default_scan_paths(),
            include_patterns: default_include_patterns(),
            exclude_patterns: default_exclude_patterns(),
            exclude_files: default_exclude_files(),
            max_depth: default_max_depth(),
            max_file_size: default_max_file_size(),
            ignore_file_names: default_ignore_file_names(),
            extract: ExtractConfig::default(),
            matcher: MatcherConfig::default(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            api_verbs: default_api_verbs(),
            api_receivers: default_api_receivers(),
            private_marker: default_private_marker(),
            doc_preview_chars: default_doc_preview_chars(),
            text_preview_chars: default_text_preview_chars(),
            min_underline_len: default_min_underline_len(),
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            parameter_keywords: default_parameter_keywords(),
            return_keywords: default_return_keywords(),
            min_divergence_len: default_min_divergence_len(),
            skip_whole_document_in_outdated: true,
        }
    }
}

impl ScanConfig {
    /// Load configuration from the project or return defaults
    pub fn load_or_default(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a TOML or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = match extension_of(path).as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?,
            other => anyhow::bail!("Unsupported config file format: {:?}", other),
        };

        Ok(config)
    }

    /// Save configuration as TOML or JSON, chosen by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match extension_of(path).as_str() {
            "json" => serde_json::to_string_pretty(self)
                .context("Failed to serialize configuration")?,
            "toml" => toml::to_string_pretty(self).context("Failed to serialize configuration")?,
            other => anyhow::bail!("Unsupported config file format: {:?}", other),
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.scan_paths, vec!["."]);
        assert!(!config.include_patterns.is_empty());
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.extract.private_marker, '_');
    }

    #[test]
    fn test_default_lists_have_no_duplicates() {
        let config = ScanConfig::default();
        for list in [
            &config.include_patterns,
            &config.exclude_patterns,
            &config.exclude_files,
        ] {
            let unique: HashSet<&String> = list.iter().collect();
            assert_eq!(unique.len(), list.len());
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScanConfig = toml::from_str(
            r#"
max_depth = 3

[matcher]
min_divergence_len = 5
"#,
        )
        .unwrap();

        assert_eq!(config.max_depth, 3);
        assert_eq!(config.matcher.min_divergence_len, 5);
        assert_eq!(config.matcher.parameter_keywords, default_parameter_keywords());
        assert_eq!(config.scan_paths, vec!["."]);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut config = ScanConfig::default();
        config.max_depth = 4;
        config.scan_paths = vec!["src".to_string(), "docs".to_string()];

        let toml_path = dir.path().join(CONFIG_FILE_NAME);
        config.save(&toml_path).unwrap();
        let loaded = ScanConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded.max_depth, 4);
        assert_eq!(loaded.scan_paths, vec!["src", "docs"]);

        let json_path = dir.path().join("config.json");
        config.save(&json_path).unwrap();
        let loaded = ScanConfig::from_file(&json_path).unwrap();
        assert_eq!(loaded.max_depth, 4);
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(ScanConfig::from_file(&path).is_err());
    }
}
