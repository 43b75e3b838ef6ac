//! Webgen CLI - deployment preparation

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use webgen::admin::{self, DiscoveryReport};
use webgen::error::{FixSuggestion, Result};
use webgen::prepare::MissingValue;
use webgen::teardown;
use webgen::template::{validate_token, Binding};
use webgen::{create_provider, CloudProvider, Lookup, PrepareOutcome, Preparer, WebgenConfig};

#[derive(Parser)]
#[command(name = "webgen")]
#[command(about = "Webgen - endpoint discovery and placeholder substitution for the Mysfits deployment")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Project root holding web/, webgen/ and lambda_recommendations/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Cloud provider (aws, mock)
    #[arg(short, long, global = true, default_value = "aws")]
    provider: String,

    /// Fixture file for the mock provider
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite deployment files for one mode
    Prepare {
        /// replace_web_endpoints_and_cognito_ids, replace_clickprocessingapi_endpoint,
        /// replace_email or replace_recommendationsapi_endpoint
        mode: String,
    },

    /// Show every endpoint and id the tooling can discover
    Endpoints {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Substitute placeholders in any file (--set bindings apply before --missing)
    Render {
        /// Template file
        source: PathBuf,

        /// Output file (rewrites the source in place if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace TOKEN with VALUE
        #[arg(short, long = "set", value_name = "TOKEN=VALUE")]
        set: Vec<String>,

        /// Replace TOKEN with NOT_FOUND
        #[arg(long, value_name = "TOKEN")]
        missing: Vec<String>,
    },

    /// Readiness checks, printed as true/false
    Check {
        #[command(subcommand)]
        check: CheckKind,
    },

    /// Force a new deployment of the container service
    Redeploy,

    /// Delete the deployment's tables, user pool, image repository and model
    /// resources (lists them unless --yes is given)
    Clean {
        /// Delete instead of listing
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CheckKind {
    /// true if no in-service inference endpoint exists
    InferenceEndpoint,

    /// true if the image repository is empty or missing
    EcrEmpty,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries results. RUST_LOG overrides INFO.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Prepare { mode } => prepare(&cli.global, &mode).await,
        Commands::Endpoints { json } => endpoints(&cli.global, json).await,
        Commands::Render {
            source,
            output,
            set,
            missing,
        } => render(&source, output.as_deref(), &set, &missing),
        Commands::Check { check } => run_check(&cli.global, check).await,
        Commands::Redeploy => redeploy(&cli.global).await,
        Commands::Clean { yes } => clean(&cli.global, yes).await,
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

/// Build the configuration once and the provider it selects
async fn connect(global: &GlobalArgs) -> Result<(WebgenConfig, Box<dyn CloudProvider>)> {
    let config = WebgenConfig::from_env(&global.root)?.with_fixture(global.fixture.clone());
    let provider = create_provider(&global.provider, &config).await?;
    Ok((config, provider))
}

async fn prepare(global: &GlobalArgs, mode: &str) -> Result<i32> {
    let (config, provider) = connect(global).await?;

    match Preparer::new(provider.as_ref(), &config).run(mode).await? {
        PrepareOutcome::Completed(report) => {
            for missing in &report.missing {
                println!("{} {}", "!".yellow(), missing);
            }
            for file in &report.files {
                println!(
                    "{} Rewrote {} ({} replacements)",
                    "✓".green(),
                    file.target.display(),
                    file.total()
                );
            }
            Ok(0)
        }
        PrepareOutcome::PrimaryApiMissing { api_name } => {
            println!("{} {}", "✗".red(), MissingValue::Api(api_name));
            Ok(1)
        }
        PrepareOutcome::UnknownMode { .. } => Ok(0),
    }
}

async fn endpoints(global: &GlobalArgs, json: bool) -> Result<i32> {
    let (config, provider) = connect(global).await?;
    let report = admin::discover_all(provider.as_ref(), &config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_discovery(&report);
    }
    Ok(0)
}

fn print_discovery(report: &DiscoveryReport) {
    println!("{} Region: {}", "→".cyan(), report.region.cyan().bold());

    for (name, lookup) in &report.apis {
        let value = match lookup {
            Lookup::Found(endpoint) => endpoint.as_str().to_string(),
            Lookup::NotFound => webgen::SENTINEL.to_string(),
        };
        print_row(name, lookup.is_found(), &value);
    }
    for (label, lookup) in [
        ("User pool", &report.user_pool),
        ("User pool client", &report.user_pool_client),
        ("Model endpoint", &report.model_endpoint),
    ] {
        let value = lookup
            .as_ref()
            .into_option()
            .map_or(webgen::SENTINEL, String::as_str);
        print_row(label, lookup.is_found(), value);
    }

    let missing = report.missing_count();
    if missing > 0 {
        println!("\n{} {} value(s) not found", "!".yellow(), missing);
    }
}

fn print_row(label: &str, found: bool, value: &str) {
    let mark = if found { "✓".green() } else { "✗".red() };
    println!("  {} {:<22} {}", mark, label, value);
}

fn render(
    source: &Path,
    output: Option<&Path>,
    set: &[String],
    missing: &[String],
) -> Result<i32> {
    let mut bindings = set
        .iter()
        .map(|raw| Binding::parse_assignment(raw))
        .collect::<Result<Vec<_>>>()?;
    for token in missing {
        validate_token(token)?;
        bindings.push(Binding::missing(token.as_str()));
    }

    let report = admin::render(&bindings, source, output)?;
    println!(
        "{} Rendered {} ({} replacements)",
        "✓".green(),
        report.target.display(),
        report.total()
    );
    Ok(0)
}

async fn run_check(global: &GlobalArgs, check: CheckKind) -> Result<i32> {
    let (config, provider) = connect(global).await?;

    let answer = match check {
        CheckKind::InferenceEndpoint => {
            admin::inference_endpoint_absent(provider.as_ref(), &config).await?
        }
        CheckKind::EcrEmpty => admin::repository_empty(provider.as_ref(), &config).await?,
    };

    println!("{}", answer);
    Ok(0)
}

async fn redeploy(global: &GlobalArgs) -> Result<i32> {
    let (config, provider) = connect(global).await?;
    admin::redeploy_service(provider.as_ref(), &config).await?;

    println!(
        "{} Forced new deployment of {} on {}",
        "✓".green(),
        config.names.service,
        config.names.cluster
    );
    Ok(0)
}

async fn clean(global: &GlobalArgs, yes: bool) -> Result<i32> {
    let (config, provider) = connect(global).await?;
    let targets = teardown::plan(provider.as_ref(), &config).await?;

    if targets.is_empty() {
        println!("{} Nothing to delete in {}", "✓".green(), config.region);
        return Ok(0);
    }

    if !yes {
        println!("{} Would delete in {}:", "→".cyan(), config.region.cyan().bold());
        for target in &targets {
            println!("  - {}", target);
        }
        println!("\nRe-run with --yes to delete");
        return Ok(0);
    }

    let report = teardown::execute(provider.as_ref(), &targets).await?;
    for target in &report.deleted {
        println!("{} Deleted {}", "✓".green(), target);
    }
    for target in &report.already_gone {
        println!("{} {} was already gone", "-".dimmed(), target);
    }
    Ok(0)
}
