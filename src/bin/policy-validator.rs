//! # Policy Validator
//!
//! Command-line tool for checking interceptor policy documents before a
//! service loads them. Reports each method's policy and whether its values
//! are within bounds.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use interceptor_core::config::{ConfigLoader, PolicyDocument};
use interceptor_core::policy::MethodPolicy;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "policy-validator")]
#[command(about = "Validate interceptor policy documents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every method policy in a document
    Check {
        /// Policy document (TOML, YAML or JSON)
        path: PathBuf,
    },

    /// Print the document after defaults and environment overrides
    Show {
        /// Policy document (TOML, YAML or JSON)
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    match cli.command {
        Commands::Check { path } => check(&path, cli.format),
        Commands::Show { path } => show(&path, cli.format),
    }
}

/// Per-method check that keeps going past the first failure.
fn check(path: &Path, format: OutputFormat) -> Result<()> {
    let document = read_document(path)?;
    let results: Vec<(String, Result<(), String>)> = document
        .methods
        .iter()
        .map(|(name, policy)| (name.clone(), policy.check()))
        .collect();

    match format {
        OutputFormat::Table => {
            println!("{:<32} {:<8} {}", "METHOD", "STATUS", "STAGES / REASON");
            for (name, result) in &results {
                match result {
                    Ok(()) => println!(
                        "{:<32} {:<8} {}",
                        name,
                        "ok",
                        stages(&document.methods[name]).join(", ")
                    ),
                    Err(reason) => println!("{name:<32} {:<8} {reason}", "invalid"),
                }
            }
        }
        OutputFormat::Json => {
            let report: Vec<serde_json::Value> = results
                .iter()
                .map(|(name, result)| {
                    serde_json::json!({
                        "method": name,
                        "valid": result.is_ok(),
                        "reason": result.as_ref().err(),
                        "stages": stages(&document.methods[name]),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    let invalid = results.iter().filter(|(_, result)| result.is_err()).count();
    info!(
        methods = results.len(),
        invalid = invalid,
        "Policy document checked"
    );
    if invalid > 0 {
        bail!("{invalid} of {} method policies are invalid", results.len());
    }
    Ok(())
}

fn show(path: &Path, format: OutputFormat) -> Result<()> {
    let document = read_document(path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&document)?),
        OutputFormat::Table => {
            println!(
                "options: retries={} validation={} timing={}",
                document.options.enable_retries,
                document.options.enable_validation,
                document.options.enable_timing
            );
            for (name, policy) in &document.methods {
                println!("  {name}: {}", stages(policy).join(", "));
            }
        }
    }
    Ok(())
}

/// Reads the raw document without rejecting invalid policies, so `check`
/// can report all of them.
fn read_document(path: &Path) -> Result<PolicyDocument> {
    match ConfigLoader::load_from_file(path) {
        Ok(document) => Ok(document),
        Err(interceptor_core::ConfigurationError::InvalidPolicy { .. }) => {
            let raw = config::Config::builder()
                .add_source(config::File::from(path))
                .build()
                .with_context(|| format!("failed to read {}", path.display()))?;
            raw.try_deserialize()
                .with_context(|| format!("failed to parse {}", path.display()))
        }
        Err(error) => Err(error).with_context(|| format!("failed to load {}", path.display())),
    }
}

fn stages(policy: &MethodPolicy) -> Vec<String> {
    let mut stages = Vec::new();
    if policy.validate {
        stages.push("validate".to_string());
    }
    if let Some(cache) = &policy.cache {
        stages.push(format!("cache({}s)", cache.ttl_seconds));
    }
    if let Some(retry) = &policy.retry {
        stages.push(format!("retry({}x, {}ms)", retry.attempts, retry.delay_ms));
    }
    if let Some(breaker) = &policy.circuit_breaker {
        stages.push(format!(
            "circuit_breaker({}, {}s)",
            breaker.threshold, breaker.break_duration_seconds
        ));
    }
    if let Some(fallback) = &policy.fallback {
        stages.push(format!("fallback({})", fallback.target));
    }
    if policy.audit.is_some() {
        stages.push("audit".to_string());
    }
    if policy.measure_time {
        stages.push("timing".to_string());
    }
    stages
}
