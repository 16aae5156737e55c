use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use htmlgen_client::HtmlGenClient;
use veridom_batch::{load_items, run_batch, write_rows};
use veridom_common::{ChatMessage, Config};
use veridom_judge::Orchestrator;

#[derive(Parser)]
#[command(name = "veridom", about = "HTML document quality evaluator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single HTML document
    Eval {
        /// Path to the document under test
        #[arg(long)]
        file: PathBuf,

        /// The request the document was generated from, for fidelity judging
        #[arg(long)]
        prompt: Option<String>,

        /// Print the full verdict as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Generate documents for a batch of prompts and evaluate each one
    Batch {
        /// JSON array of {"prompt": ...} items
        #[arg(long)]
        input: PathBuf,

        /// Where to write the result rows
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Veridom starting...");

    let config = Config::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval { file, prompt, json } => cmd_eval(&config, &file, prompt, json).await,
        Commands::Batch { input, output } => cmd_batch(&config, &input, &output).await,
    }
}

async fn cmd_eval(config: &Config, file: &Path, prompt: Option<String>, json: bool) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut history = Vec::new();
    if let Some(prompt) = prompt {
        history.push(ChatMessage::user(prompt));
    }
    history.push(ChatMessage::assistant(html));

    let orchestrator = Orchestrator::from_config(config);
    let evaluation = orchestrator.evaluate(&history).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation.verdict)?);
    } else {
        print!("{}", evaluation.verdict);
        println!();
        println!("{}", evaluation.verdict.rationale);
    }
    Ok(())
}

async fn cmd_batch(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let items = load_items(input)?;

    let (Some(base_url), Some(token)) = (&config.gen_base_url, &config.gen_token) else {
        anyhow::bail!("GEN_BASE_URL and GEN_TOKEN are required for batch runs");
    };
    let source = HtmlGenClient::new(
        base_url,
        token,
        &config.gen_user_id,
        &config.gen_agent_id,
        config.gen_timeout_secs,
    );
    let orchestrator = Orchestrator::from_config(config);

    let rows = run_batch(&source, &orchestrator, items, config.batch_concurrency).await;

    let failed = rows.iter().filter(|row| row.error.is_some()).count();
    write_rows(output, &rows)?;
    info!(
        rows = rows.len(),
        failed,
        output = %output.display(),
        "Batch run complete"
    );
    Ok(())
}
