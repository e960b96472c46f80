//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.langtops.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".langtops.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Fetcher settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding source documents and generated reports.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            verbose: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Source fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// PYPL JavaScript data file.
    #[serde(default = "default_pypl_url")]
    pub pypl_url: String,

    /// TIOBE CSV candidates, tried in order.
    #[serde(default = "default_tiobe_urls")]
    pub tiobe_urls: Vec<String>,

    /// Directory URL holding the GitHut metric files.
    #[serde(default = "default_githut_base_url")]
    pub githut_base_url: String,

    /// Languages kept in the GitHut ranking.
    #[serde(default = "default_githut_top_n")]
    pub githut_top_n: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            pypl_url: default_pypl_url(),
            tiobe_urls: default_tiobe_urls(),
            githut_base_url: default_githut_base_url(),
            githut_top_n: default_githut_top_n(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("langtops/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_pypl_url() -> String {
    "https://raw.githubusercontent.com/pypl/pypl.github.io/master/PYPL/All.js".to_string()
}

fn default_tiobe_urls() -> Vec<String> {
    const BASE: &str = "https://raw.githubusercontent.com/toUpperCase78/tiobe-index-ratings/master";
    [
        "Tiobe_Index_All_Ratings_January2026.csv",
        "Tiobe_Index_All_Ratings_December2025.csv",
        "Tiobe_Index_Very_Long_Term_History_2025.csv",
    ]
    .iter()
    .map(|file| format!("{}/{}", BASE, file))
    .collect()
}

fn default_githut_base_url() -> String {
    "https://raw.githubusercontent.com/madnight/githut/master/src/data".to_string()
}

fn default_githut_top_n() -> usize {
    crate::fetch::githut::DEFAULT_TOP_N
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Also write `aggregated.lino`.
    #[serde(default = "default_true")]
    pub write_lino: bool,

    /// Also write `aggregated.md`.
    #[serde(default)]
    pub write_markdown: bool,

    /// Languages shown in the console and Markdown summaries.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            write_lino: true,
            write_markdown: false,
            top_n: default_top_n(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_top_n() -> usize {
    20
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.langtops.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(fetch) = args.fetch_args() {
            if let Some(timeout) = fetch.timeout {
                self.fetch.timeout_seconds = timeout;
            }
        }

        if let Some(aggregate) = args.aggregate_args() {
            if let Some(top) = aggregate.top {
                self.report.top_n = top;
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
