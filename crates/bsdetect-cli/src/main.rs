//! bsdetect CLI: check claims from the command line or a file.
//!
//! Subcommands: `check` (claims as arguments), `batch` (one claim per line).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bsdetect_core::ClaimResult;
use bsdetect_runtime::search::EXA_API_KEY_ENV;
use bsdetect_runtime::{
    ClaimVerifier, ExaSearchProvider, LlmUsage, MockSearchProvider, ProviderRegistry,
    RuntimeConfig, SearchProvider,
};

#[derive(Parser, Debug)]
#[command(name = "bsdetect")]
#[command(about = "Route claims to expert LLM prompts and report BS or LEGITIMATE")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log node transitions and LLM calls (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify one or more claims given as arguments
    Check {
        #[arg(required = true, value_name = "CLAIM")]
        claims: Vec<String>,

        #[command(flatten)]
        opts: RunOpts,
    },

    /// Verify every non-empty line of a file, sharing one memory session
    Batch {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        opts: RunOpts,
    },
}

#[derive(Args, Debug)]
struct RunOpts {
    /// YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// LLM provider name (default: first registered)
    #[arg(long, value_name = "NAME")]
    provider: Option<String>,

    /// Override retry.max_retries
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Do not share context between claims
    #[arg(long)]
    no_memory: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    results: Vec<&'a ClaimResult>,
    usage: LlmUsage,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (claims, opts) = match cli.command {
        Command::Check { claims, opts } => (claims, opts),
        Command::Batch { file, opts } => (read_claims(&file)?, opts),
    };

    let verifier = build_verifier(&opts)?;
    let runs = verifier.verify_batch(&claims[..]).await;

    if opts.json {
        let report = Report {
            results: runs.iter().map(|run| &run.result).collect(),
            usage: verifier.session_usage(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for run in &runs {
            println!("{}\n", run.result);
        }
        let usage = verifier.session_usage();
        println!(
            "{} claim(s), {} LLM call(s), {} tokens, ~${:.4}",
            runs.len(),
            usage.llm_calls,
            usage.total_tokens,
            usage.estimated_cost
        );
    }

    if !runs.is_empty() && runs.iter().all(|run| run.result.is_error()) {
        bail!("no claim could be verified");
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "bsdetect_runtime=debug,bsdetect_core=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_claims(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read claims from {}", path.display()))?;
    let claims: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect();

    if claims.is_empty() {
        bail!("{} contains no claims", path.display());
    }
    Ok(claims)
}

fn build_verifier(opts: &RunOpts) -> Result<ClaimVerifier> {
    let mut config = RuntimeConfig::load(opts.config.as_deref()).context("Failed to load config")?;
    if let Some(max_retries) = opts.max_retries {
        config.retry.max_retries = max_retries;
    }
    if opts.no_memory {
        config.memory.enabled = false;
    }

    let registry = ProviderRegistry::with_defaults();
    let name = match opts.provider.as_deref().or_else(|| registry.default_type()) {
        Some(name) => name.to_string(),
        None => bail!("no LLM provider compiled into this build"),
    };
    let provider = registry
        .create(&name, &serde_json::json!({}))
        .with_context(|| format!("Failed to create provider '{}'", name))?;

    let search: Arc<dyn SearchProvider> = if std::env::var(EXA_API_KEY_ENV).is_ok() {
        Arc::new(ExaSearchProvider::from_env().context("Failed to configure Exa search")?)
    } else {
        tracing::info!("{} not set, using offline mock search", EXA_API_KEY_ENV);
        Arc::new(MockSearchProvider::new())
    };

    let verifier = ClaimVerifier::builder()
        .provider(provider)
        .search(search)
        .config(config)
        .build()?;
    Ok(verifier)
}
