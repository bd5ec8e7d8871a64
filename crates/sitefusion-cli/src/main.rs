//! SiteFusion CLI: validate candidate batches and check configuration
//! documents from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sitefusion_core::config::validate_config_schema;
use sitefusion_core::{Candidate, ProfileRegistry, ValidationConfig};
use sitefusion_runtime::BatchValidator;

#[derive(Parser)]
#[command(name = "sitefusion", version, about = "Multi-evidence fusion and validation for archaeological site candidates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a batch of candidates and emit a JSON report.
    Validate {
        /// Validation configuration (YAML or JSON).
        #[arg(short, long)]
        config: PathBuf,

        /// Candidate batch: a JSON array of candidate objects.
        #[arg(short = 'i', long)]
        candidates: PathBuf,

        /// Known-site profile registry (YAML or JSON). Defaults to the
        /// built-in Amazon-basin profiles.
        #[arg(short, long)]
        profiles: Option<PathBuf>,

        /// Development-curve bin width in years.
        #[arg(long, default_value_t = 100)]
        bin_width: u32,

        /// Write the report here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a configuration document against the embedded schema.
    CheckConfig {
        /// Configuration file (YAML or JSON).
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate {
            config,
            candidates,
            profiles,
            bin_width,
            output,
        } => run_validate(&config, &candidates, profiles.as_deref(), bin_width, output),
        Command::CheckConfig { path } => run_check_config(&path),
    }
}

fn run_validate(
    config_path: &Path,
    candidates_path: &Path,
    profiles_path: Option<&Path>,
    bin_width: u32,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = ValidationConfig::from_file(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let registry = match profiles_path {
        Some(path) => ProfileRegistry::from_file(path)
            .with_context(|| format!("failed to load profiles from {}", path.display()))?,
        None => ProfileRegistry::amazon_defaults().clone(),
    };

    let raw = fs::read_to_string(candidates_path)
        .with_context(|| format!("failed to read {}", candidates_path.display()))?;
    let batch: Vec<Candidate> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse candidates from {}", candidates_path.display()))?;

    let validator = BatchValidator::new(config, registry)?.with_bin_width(bin_width)?;
    let report = validator.validate_batch(&batch);

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "{} candidates: {} verdicted, {} rejected -> {}",
                batch.len(),
                report.summary.verdicted,
                report.summary.rejected,
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn run_check_config(path: &Path) -> Result<()> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    // YAML is a superset of JSON, so one parser covers both extensions.
    let value: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if let Err(errors) = validate_config_schema(&value) {
        for error in &errors {
            eprintln!("error: {error}");
        }
        bail!("{} failed schema validation ({} errors)", path.display(), errors.len());
    }

    // Parse and run semantic checks too (ranges, weight signs, layer
    // bounds) so "ok" means loadable, not just shape-valid.
    ValidationConfig::from_yaml(&raw)
        .with_context(|| format!("{} failed semantic validation", path.display()))?;

    println!("{}: ok", path.display());
    Ok(())
}
