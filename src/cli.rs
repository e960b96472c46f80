//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::SourceId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// langtops - programming language popularity aggregator
///
/// Collects rankings from GitHut, TIOBE, PYPL and the Stack Overflow
/// survey, and merges them into one weighted ranking.
///
/// Examples:
///   langtops run
///   langtops fetch --source pypl,tiobe
///   langtops aggregate --format json,markdown --top 10
///   langtops validate data/aggregated.lino
///   langtops init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .langtops.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory for source documents and generated reports
    #[arg(long, value_name = "DIR", env = "LANGTOPS_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download source rankings into the data directory
    Fetch(FetchArgs),

    /// Merge saved source rankings into the aggregated report
    Aggregate(AggregateArgs),

    /// Fetch every source, then aggregate
    Run {
        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        aggregate: AggregateArgs,
    },

    /// Check a Links Notation file for syntax errors
    Validate {
        /// File to validate (default: <data-dir>/aggregated.lino)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a default .langtops.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Sources to fetch (comma-separated, default: all)
    ///
    /// Example: --source pypl,tiobe
    #[arg(long = "source", value_name = "SOURCES", value_delimiter = ',')]
    pub sources: Vec<SourceId>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct AggregateArgs {
    /// Report formats to write (comma-separated)
    ///
    /// JSON is always written. Default: from config.
    #[arg(long, value_name = "FORMATS", value_delimiter = ',')]
    pub format: Vec<OutputFormat>,

    /// Number of languages shown in summaries
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,
}

/// Output format for the aggregated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Lino,
    Markdown,
}

impl FetchArgs {
    /// Sources to fetch; every source when none were named.
    pub fn effective_sources(&self) -> Vec<SourceId> {
        if self.sources.is_empty() {
            return SourceId::ALL.to_vec();
        }
        let mut sources = self.sources.clone();
        sources.sort();
        sources.dedup();
        sources
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Fetch options of the current command, if any.
    pub fn fetch_args(&self) -> Option<&FetchArgs> {
        match &self.command {
            Command::Fetch(fetch) | Command::Run { fetch, .. } => Some(fetch),
            _ => None,
        }
    }

    /// Aggregate options of the current command, if any.
    pub fn aggregate_args(&self) -> Option<&AggregateArgs> {
        match &self.command {
            Command::Aggregate(aggregate) | Command::Run { aggregate, .. } => Some(aggregate),
            _ => None,
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.fetch_args().and_then(|f| f.timeout) {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(top) = self.aggregate_args().and_then(|a| a.top) {
            if top == 0 {
                return Err("--top must be at least 1".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` key; `--quiet` overrides it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            data_dir: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_parse_run_with_flags() {
        let args = Args::try_parse_from([
            "langtops",
            "run",
            "--source",
            "pypl,stackoverflow",
            "--format",
            "json,markdown",
            "--top",
            "5",
            "-v",
        ])
        .unwrap();

        let fetch = args.fetch_args().unwrap();
        assert_eq!(fetch.sources, vec![SourceId::Pypl, SourceId::StackOverflow]);
        let aggregate = args.aggregate_args().unwrap();
        assert_eq!(
            aggregate.format,
            vec![OutputFormat::Json, OutputFormat::Markdown]
        );
        assert_eq!(aggregate.top, Some(5));
        assert!(args.verbose);
    }

    #[test]
    fn test_parse_validate_with_file() {
        let args = Args::try_parse_from(["langtops", "validate", "out.lino"]).unwrap();
        match &args.command {
            Command::Validate { file } => {
                assert_eq!(file.as_deref(), Some(std::path::Path::new("out.lino")))
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(args.fetch_args().is_none());
        assert!(args.aggregate_args().is_none());
    }

    #[test]
    fn test_unknown_source_rejected() {
        assert!(Args::try_parse_from(["langtops", "fetch", "--source", "redmonk"]).is_err());
    }

    #[test]
    fn test_effective_sources() {
        let all = FetchArgs::default().effective_sources();
        assert_eq!(all, SourceId::ALL.to_vec());

        let fetch = FetchArgs {
            sources: vec![SourceId::Tiobe, SourceId::Githut, SourceId::Tiobe],
            timeout: None,
        };
        assert_eq!(
            fetch.effective_sources(),
            vec![SourceId::Githut, SourceId::Tiobe]
        );
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let args = make_args(Command::Fetch(FetchArgs {
            sources: vec![],
            timeout: Some(0),
        }));
        assert!(args.validate().is_err());

        let args = make_args(Command::Aggregate(AggregateArgs {
            format: vec![],
            top: Some(0),
        }));
        assert!(args.validate().is_err());

        let args = make_args(Command::Aggregate(AggregateArgs::default()));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
