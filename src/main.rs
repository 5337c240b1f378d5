use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use covtree::config::Config;
use covtree::error::CovtreeError;
use covtree::methods::ExtractorRegistry;
use covtree::parsers::Format;
use covtree::{cli, ingest, pipeline};

/// covtree: merge coverage reports into one per-directory, per-method tree.
#[derive(Parser)]
#[command(name = "covtree", version, about)]
struct Cli {
    /// Coverage reports to merge (lcov, cobertura, gocover).
    #[arg(required = true)]
    reports: Vec<PathBuf>,

    /// Override format detection for every report.
    #[arg(long)]
    format: Option<Format>,

    /// Directory to search for source files. May be repeated.
    #[arg(long = "source-dir")]
    source_dirs: Vec<PathBuf>,

    /// Project root (default: nearest ancestor of the working directory
    /// holding a VCS or build marker).
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Print the whole tree as JSON instead of a text summary.
    #[arg(long)]
    json: bool,

    /// Show per-file rows.
    #[arg(long)]
    files: bool,

    /// Sort per-file rows by line rate ascending (worst files first).
    #[arg(long)]
    sort_by_coverage: bool,

    /// Show methods and uncovered lines for one file (tree-relative path).
    #[arg(long)]
    file: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose.
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("covtree=debug")
    } else {
        EnvFilter::new("covtree=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.project_root {
        Some(root) => Config::new(root, cli.source_dirs.clone()),
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            Config::discover(&cwd, cli.source_dirs.clone())
        }
    };
    debug!("Project root: {}", config.project_root.display());

    // One explicit --source-dir applies to every report.
    let source_override = match cli.source_dirs.as_slice() {
        [only] => Some(only.as_path()),
        _ => None,
    };

    let mut reports = Vec::new();
    for path in &cli.reports {
        match ingest::load_report(path, cli.format, source_override) {
            Ok(report) => reports.push(report),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    if reports.is_empty() {
        return Err(CovtreeError::NoInputRecords).context("No report could be loaded");
    }

    let registry = ExtractorRegistry::with_defaults();
    let tree = pipeline::run(&reports, &config, &registry).context("Failed to build coverage tree")?;

    if cli.json {
        println!("{}", cli::cmd_json(&tree)?);
        return Ok(());
    }

    print!("{}", cli::cmd_summary(&tree));
    if cli.files {
        println!();
        print!("{}", cli::cmd_files(&tree, cli.sort_by_coverage));
    }
    if let Some(file) = &cli.file {
        println!();
        print!("{}", cli::cmd_file(&tree, file)?);
    }
    Ok(())
}
