mod api;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use kol_matcher::config::MatchConfig;
use kol_matcher::report::render_summary;
use kol_matcher::{format_float, format_number, match_candidates_with_config, MatchReport};

use crate::api::BatchRequest;

#[derive(Parser)]
#[command(name = "kol-matcher", about = "Rank influencers against a brand profile")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score and rank a batch of enriched candidates.
    Rank(RankArgs),
    /// Write the default configuration as TOML.
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct RankArgs {
    /// JSON batch: { "brand": {...}, "candidates": [...], "count"?: N }
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    count: Option<usize>,
    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write a markdown summary.
    #[arg(long)]
    summary: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/matcher.toml")]
    path: PathBuf,
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Rank(args) => run_rank(args).await,
        Command::InitConfig(args) => run_init_config(args),
    }
}

async fn run_rank(args: RankArgs) -> Result<(), String> {
    let (config, config_path) = MatchConfig::load(args.config)?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        tracing::info!(path = %path.display(), "loaded configuration");
    }

    let payload = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|err| format!("failed to read {}: {}", args.input.display(), err))?;
    let batch = BatchRequest::parse(&payload)?;
    let count = batch.resolve_count(args.count, config.ranking.default_count);

    let report = match_candidates_with_config(&batch.brand, &batch.candidates, count, &config)
        .map_err(|err| err.to_string())?;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("failed to serialize report: {}", err))?;

    match args.output.as_ref() {
        Some(path) => {
            write_file(path, &json).await?;
            print_results(&report);
            println!("Results saved to {}", path.display());
        }
        None => println!("{}", json),
    }

    if let Some(path) = args.summary.as_ref() {
        write_file(path, &render_summary(&batch.brand, &report)).await?;
        tracing::info!(path = %path.display(), "summary report written");
    }

    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    if args.path.exists() && !args.force {
        return Err(format!(
            "{} already exists; pass --force to overwrite",
            args.path.display()
        ));
    }
    MatchConfig::default().write(&args.path)?;
    println!("Wrote default configuration to {}", args.path.display());
    Ok(())
}

fn print_results(report: &MatchReport) {
    let metadata = &report.metadata;
    println!(
        "Found {} matching KOLs ({} considered, {} skipped).",
        report.results.len(),
        metadata.candidates_considered,
        metadata.candidates_skipped
    );
    for result in &report.results {
        println!(
            "{:>3}. @{} | score {}/100 | AI {} | similarity {} | engagement {} | followers {}",
            result.rank,
            result.candidate_id,
            format_float(result.match_score, 1),
            format_float(result.ai_relevance_score, 2),
            format_float(result.similarity_score, 2),
            format_float(result.engagement_score, 2),
            format_number(result.follower_count as f64)
        );
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
        }
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
