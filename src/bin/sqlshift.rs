//! sqlshift — CLI for the SQL translation service.
//!
//! # Usage
//!
//! ```bash
//! # Provision a workspace and store the API key
//! sqlshift setup --org-token <TOKEN>
//!
//! # Translate SQL files and write the diff report
//! sqlshift translate queries/*.sql --output report.html
//!
//! # Re-render the most recent translation
//! sqlshift last
//!
//! # List configured data sources
//! sqlshift sources
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use sqlshift::prelude::*;

#[derive(Parser)]
#[command(name = "sqlshift")]
#[command(version)]
#[command(about = "Translate SQL between dialects via the translation service", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlshift setup --org-token tok_...
    sqlshift translate queries/*.sql --source snowflake --target databricks
    sqlshift last --output last-report.html
    sqlshift sources")]
struct Cli {
    /// Service host URL
    #[arg(long, env = "SQLSHIFT_HOST")]
    host: Option<String>,

    /// API key for authentication
    #[arg(long, env = "SQLSHIFT_API_KEY")]
    api_key: Option<String>,

    /// Organization token (used to provision an API key when none is set)
    #[arg(long, env = "SQLSHIFT_ORG_TOKEN")]
    org_token: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a workspace from an org token and store the API key
    Setup,
    /// Translate SQL files end to end and render the diff report
    Translate(TranslateArgs),
    /// Re-render the report for the most recent translation
    Last(LastArgs),
    /// List configured data sources
    Sources,
}

#[derive(clap::Args)]
struct TranslateArgs {
    /// SQL files to translate, one query per file
    files: Vec<PathBuf>,

    /// Source dialect (defaults to the first non-target data source)
    #[arg(long)]
    source: Option<String>,

    /// Target dialect
    #[arg(long)]
    target: Option<String>,

    /// Report output path
    #[arg(short, long, default_value = "report.html")]
    output: PathBuf,

    /// Print the raw job result as JSON instead of writing HTML
    #[arg(long)]
    json: bool,

    /// Seconds between status checks
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Consecutive transient failures tolerated before giving up
    #[arg(long, default_value_t = 5)]
    max_errors: u32,
}

#[derive(clap::Args)]
struct LastArgs {
    /// Report output path
    #[arg(short, long, default_value = "report.html")]
    output: PathBuf,

    /// Print the raw job result as JSON instead of writing HTML
    #[arg(long)]
    json: bool,

    /// Label for the source column
    #[arg(long, default_value = "source")]
    source: String,

    /// Label for the target column
    #[arg(long, default_value = "target")]
    target: String,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Setup => cmd_setup(cli),
        Commands::Translate(args) => cmd_translate(cli, args),
        Commands::Last(args) => cmd_last(cli, args),
        Commands::Sources => cmd_sources(cli),
    }
}

fn cmd_setup(cli: &Cli) -> Result<()> {
    let mut config = Config::load()?;
    let token = cli
        .org_token
        .clone()
        .or_else(|| config.org_token.clone())
        .context("no organization token. Pass --org-token or set SQLSHIFT_ORG_TOKEN")?;
    let host = resolve_host(cli, &config);

    let (client, org_id) = Client::provision(&host, &token)?;
    println!(
        "{} Organization created with id {}",
        "✓".green(),
        org_id.to_string().cyan()
    );

    config.host = Some(host);
    config.api_key = Some(client.api_key().to_string());
    config.org_token = Some(token);
    config.save()?;
    println!(
        "{} Credentials saved to {}",
        "✓".green(),
        Config::path()?.display().to_string().cyan()
    );
    Ok(())
}

fn cmd_translate(cli: &Cli, args: &TranslateArgs) -> Result<()> {
    let queries = read_queries(&args.files)?;
    let client = connect(cli)?;

    let (source_ds, target_ds) =
        client.select_data_sources(args.source.as_deref(), args.target.as_deref())?;
    let project_name = format!(
        "{} to {} Translation",
        title_case(&source_ds.kind),
        title_case(&target_ds.kind)
    );

    let project = client.create_project(source_ds.id, target_ds.id, &project_name)?;
    println!(
        "{} Project created with id {}",
        "✓".green(),
        project.id.to_string().cyan()
    );

    client.upload_queries(project.id, &queries)?;
    println!("{} Queries uploaded", "✓".green());

    let job = client.start_translation(project.id)?;
    println!(
        "{} Started translation with id {}",
        "✓".green(),
        job.task_id.to_string().cyan()
    );

    if let Err(e) = State::remember(job) {
        log::warn!("could not persist last job reference: {e}");
    }

    let options = PollOptions {
        interval: Duration::from_secs(args.poll_interval),
        max_consecutive_errors: args.max_errors,
    };
    let result = client.wait_for_completion(&job, &options, &mut TermProgress)?;

    emit(&result, &source_ds.kind, &target_ds.kind, &args.output, args.json)
}

fn cmd_last(cli: &Cli, args: &LastArgs) -> Result<()> {
    let state = State::load()?;
    let job = state
        .last_job
        .context("no previous translation found. Run `sqlshift translate` first")?;

    println!("Fetching results for {}...", job.to_string().cyan());

    let client = connect(cli)?;
    let record = client.fetch_job(&job)?;
    let result = JobResult {
        status: record.status,
        models: record.translated_models,
        polling_errors: Vec::new(),
    };

    emit(&result, &args.source, &args.target, &args.output, args.json)
}

fn cmd_sources(cli: &Cli) -> Result<()> {
    let client = connect(cli)?;
    let sources = client.data_sources()?;

    if sources.is_empty() {
        println!("{}", "(no data sources configured)".dimmed());
        return Ok(());
    }

    for ds in &sources {
        println!(
            "{:>6}  {:<16} {}",
            ds.id.to_string().cyan(),
            ds.kind,
            ds.name.as_deref().unwrap_or("").dimmed()
        );
    }
    Ok(())
}

/// Spinner and incremental status lines for a terminal wait.
struct TermProgress;

impl Progress for TermProgress {
    fn tick(&mut self, frame: &str) {
        print!(
            "\r{} Waiting for translation results...",
            frame.cyan()
        );
        let _ = io::stdout().flush();
    }

    fn transient(&mut self, error: &PollError, consecutive: u32) {
        println!(
            "\r{} {} error while polling ({} in a row): {}",
            "⚠".yellow(),
            error.kind,
            consecutive,
            error.message.dimmed()
        );
    }

    fn finished(&mut self, result: &JobResult) {
        let total = result.models.len();
        let valid = result
            .models
            .iter()
            .filter(|m| m.outcome == TranslationOutcome::Valid)
            .count();

        println!(
            "\r{} Translation completed with status: {}",
            "✓".green(),
            result.status.to_string().cyan()
        );
        if total > 0 {
            println!(
                "{} Validated {} out of {} translations",
                "✓".green(),
                valid.to_string().green(),
                total
            );
        }
        if !result.polling_errors.is_empty() {
            println!(
                "{} {} transient error(s) during polling; details are in the report",
                "⚠".yellow(),
                result.polling_errors.len()
            );
        }
    }
}

/// Build a connected client from flags, environment, and the config
/// file. Flags beat the file; a missing API key with a present org
/// token auto-provisions one and saves it.
fn connect(cli: &Cli) -> Result<Client> {
    let mut config = Config::load()?;
    let host = resolve_host(cli, &config);

    if let Some(api_key) = cli.api_key.clone().or_else(|| config.api_key.clone()) {
        return Ok(Client::new(&host, &api_key)?);
    }

    if let Some(token) = cli.org_token.clone().or_else(|| config.org_token.clone()) {
        let (client, org_id) = Client::provision(&host, &token)?;
        println!(
            "{} Organization created with id {}",
            "✓".green(),
            org_id.to_string().cyan()
        );
        config.host = Some(host);
        config.api_key = Some(client.api_key().to_string());
        config.save()?;
        return Ok(client);
    }

    bail!("API key is not set. Run `sqlshift setup --org-token <TOKEN>` or set SQLSHIFT_API_KEY")
}

fn resolve_host(cli: &Cli, config: &Config) -> String {
    cli.host
        .clone()
        .unwrap_or_else(|| config.host_or_default().to_string())
}

fn read_queries(files: &[PathBuf]) -> Result<Vec<String>> {
    if files.is_empty() {
        bail!("no SQL files given. Pass one or more files, one query per file");
    }
    files
        .iter()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect()
}

fn emit(
    result: &JobResult,
    source_label: &str,
    target_label: &str,
    output: &PathBuf,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let report = render_report(result, source_label, target_label);
    report.write_to(output)?;
    println!(
        "{} Report written to {}",
        "✓".green(),
        output.display().to_string().cyan()
    );
    Ok(())
}
