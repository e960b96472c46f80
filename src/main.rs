//! langtops - Programming language popularity aggregator
//!
//! A CLI tool that collects language rankings from several independent
//! sources and merges them into one weighted, reproducible ranking.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (no data, every fetch failed, unreadable file, etc.)
//!   2 - Lino validation failed

mod analysis;
mod cli;
mod config;
mod fetch;
mod models;
mod report;
mod sources;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{AggregateArgs, Args, Command, FetchArgs, OutputFormat};
use config::{Config, CONFIG_FILE};
use fetch::HttpFetcher;
use indicatif::{ProgressBar, ProgressStyle};
use sources::WeightTable;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Config is read before logging so `[general] verbose` can set the level.
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, config.general.verbose);

    info!("langtops v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    log_config_origin(&origin);
    debug!("Effective config: {:?}", config);

    match run(&args, &config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .langtops.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to change the data directory, source URLs and report outputs.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = args.log_level(config_verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the selected command. Returns the process exit code.
async fn run(args: &Args, config: &Config) -> Result<i32> {
    match &args.command {
        Command::Fetch(fetch) => run_fetch(fetch, config, args.quiet).await,
        Command::Aggregate(aggregate) => run_aggregate(aggregate, config),
        Command::Run { fetch, aggregate } => {
            // Sources that fail keep their previous document, if any.
            run_fetch(fetch, config, args.quiet).await?;
            run_aggregate(aggregate, config)
        }
        Command::Validate { file } => run_validate(file.as_deref(), config),
        Command::InitConfig => Ok(0),
    }
}

fn spinner(message: String, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Fetch the selected sources and save each document.
///
/// Returns exit code 1 only when every requested source failed.
async fn run_fetch(args: &FetchArgs, config: &Config, quiet: bool) -> Result<i32> {
    let start_time = Instant::now();
    let ids = args.effective_sources();
    let data_dir = &config.general.data_dir;

    let rule = "=".repeat(60);
    println!("{}\nPROGRAMMING LANGUAGE RANKINGS DATA FETCHER\n{}", rule, rule);
    println!("\n📥 Fetching {} sources", ids.len());
    println!("   Timeout: {}s", config.fetch.timeout_seconds);
    println!("   Data directory: {}", data_dir.display());

    let http = HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?;

    let names: Vec<&str> = ids.iter().map(|id| id.display_name()).collect();
    let pb = spinner(format!("Fetching {}...", names.join(", ")), quiet)?;
    let results = fetch::fetch_all(&ids, &http, &config.fetch).await;
    pb.finish_and_clear();

    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for (id, result) in results {
        match result {
            Ok(document) => match store::save_source(data_dir, id, &document) {
                Ok(path) => {
                    info!("Saved {} to {}", id.display_name(), path.display());
                    succeeded.push((id, document.rankings.len(), path));
                }
                Err(e) => failed.push((id, format!("{:#}", e))),
            },
            Err(e) => failed.push((id, e.to_string())),
        }
    }

    println!("\n{}\nFETCH SUMMARY\n{}", rule, rule);
    println!("\nSuccessful: {}/{}", succeeded.len(), ids.len());
    for (id, count, path) in &succeeded {
        println!(
            "  ✅ {} ({} languages) -> {}",
            id.display_name(),
            count,
            path.display()
        );
    }
    if !failed.is_empty() {
        println!("\nFailed: {}/{}", failed.len(), ids.len());
        for (id, message) in &failed {
            println!("  ❌ {}: {}", id.display_name(), message);
        }
        println!(
            "\nPartial data may still be available in {}",
            data_dir.display()
        );
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    if succeeded.is_empty() {
        warn!("Every source failed to fetch");
        return Ok(1);
    }
    Ok(0)
}

/// Formats to write: JSON always, plus the requested or configured extras.
fn output_formats(args: &AggregateArgs, config: &Config) -> Vec<OutputFormat> {
    let mut formats = vec![OutputFormat::Json];
    if args.format.is_empty() {
        if config.report.write_lino {
            formats.push(OutputFormat::Lino);
        }
        if config.report.write_markdown {
            formats.push(OutputFormat::Markdown);
        }
    } else {
        formats.extend(args.format.iter().copied());
    }
    formats.sort();
    formats.dedup();
    formats
}

/// Aggregate the saved source documents and write the reports.
fn run_aggregate(args: &AggregateArgs, config: &Config) -> Result<i32> {
    let data_dir = &config.general.data_dir;
    let top_n = config.report.top_n;

    println!("\n📊 Aggregating rankings from {}", data_dir.display());
    let sources = store::load_sources(data_dir);
    for (id, document) in &sources {
        println!(
            "   Loaded {}: {} languages",
            id.display_name(),
            document.rankings.len()
        );
    }

    let report = analysis::aggregate(&sources, &WeightTable::standard(), Utc::now())
        .with_context(|| format!("Failed to aggregate sources in {}", data_dir.display()))?;

    println!("\n📝 Writing reports...");
    for format in output_formats(args, config) {
        let (file, content) = match format {
            OutputFormat::Json => (store::AGGREGATED_JSON, report::generate_json_report(&report)?),
            OutputFormat::Lino => (store::AGGREGATED_LINO, report::generate_lino_report(&report)?),
            OutputFormat::Markdown => (
                store::AGGREGATED_MARKDOWN,
                report::generate_markdown_report(&report, top_n),
            ),
        };
        let path = data_dir.join(file);
        store::write_text(&path, &content)?;
        println!("   Saved: {}", path.display());
    }

    print!("{}", report::format_console_summary(&report, top_n));
    Ok(0)
}

/// Validate a lino file. Returns exit code 2 on syntax errors.
fn run_validate(file: Option<&Path>, config: &Config) -> Result<i32> {
    let path: PathBuf = file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.general.data_dir.join(store::AGGREGATED_LINO));

    println!("Validating: {}\n", path.display());
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    println!("File size: {} characters", content.chars().count());
    println!("Lines: {}\n", content.split('\n').count());

    println!("Test 1: Parsing full file...");
    let outcome = match report::validate::validate(&content) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("✗ Full file failed to parse");
            println!("  Error: {}", e);
            match e.column() {
                Some(column) => println!("  Location: line {}, column {}", e.line(), column),
                None => println!("  Location: line {}", e.line()),
            }
            println!("\n  Context:");
            for line in report::error_context(&content, e.line(), 2) {
                println!("  {}", line);
            }
            return Ok(2);
        }
    };
    println!(
        "✓ Full file parses successfully ({} top-level links)",
        outcome.top_level_links
    );

    println!("\nTest 2: Checking individual ranking sections...");
    if outcome.is_valid() {
        println!(
            "✓ All {} ranking sections are well formed",
            outcome.sections_passed
        );
    } else {
        println!(
            "✗ {} of {} ranking sections failed",
            outcome.failures.len(),
            outcome.sections_total()
        );
        for failure in &outcome.failures {
            println!("  - {}: {}", failure.name, failure.error);
            for line in report::error_context(&content, failure.error.line(), 0) {
                println!("      {}", line);
            }
        }
        return Ok(2);
    }

    println!("\n✓ Validation complete - file is valid Links Notation");
    Ok(0)
}

/// Where the effective configuration came from.
#[derive(Debug)]
enum ConfigOrigin {
    File(PathBuf),
    DefaultFile,
    BuiltIn,
    Unreadable(anyhow::Error),
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so the outcome is returned for
/// `log_config_origin` instead of being logged here.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::File(config_path.clone())));
    }

    Ok(match Config::load_default() {
        Ok(Some(config)) => (config, ConfigOrigin::DefaultFile),
        Ok(None) => (Config::default(), ConfigOrigin::BuiltIn),
        Err(e) => (Config::default(), ConfigOrigin::Unreadable(e)),
    })
}

fn log_config_origin(origin: &ConfigOrigin) {
    match origin {
        ConfigOrigin::File(path) => info!("Loaded config from: {}", path.display()),
        ConfigOrigin::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
        ConfigOrigin::BuiltIn => debug!("No config file found, using defaults"),
        ConfigOrigin::Unreadable(e) => warn!("Failed to load config: {:#}", e),
    }
}
