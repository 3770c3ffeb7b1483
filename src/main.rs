use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod dimensions;
mod error;
mod evaluator;
mod export;
mod llm;
mod models;
mod parse;
mod runner;
mod search;
mod site;

use config::Config;
use evaluator::Evaluator;
use export::SummaryRow;
use llm::OpenAiClient;
use search::SerpApiSearcher;

#[derive(Parser)]
#[command(name = "startup-scorecard")]
#[command(about = "Score startups across seven qualitative dimensions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every company in a batch file
    Evaluate {
        /// JSON list of {"data": {...}} company wrappers
        #[arg(default_value = "companies.json")]
        input: PathBuf,
        #[arg(long, default_value = "logs")]
        logs_dir: PathBuf,
        /// Defaults to <input stem>_evaluation_summary.csv
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Build a static HTML site from saved evaluation logs
    Site {
        #[arg(long, default_value = "logs")]
        logs_dir: PathBuf,
        #[arg(long, default_value = "site")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("startup_scorecard=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            input,
            logs_dir,
            summary,
        } => {
            let config = Config::from_env()?;
            let generator = OpenAiClient::new(&config.openai_api_key, &config.model)?
                .with_base_url(&config.openai_base_url);
            let searcher = SerpApiSearcher::new(&config.serpapi_api_key)?
                .with_base_url(&config.serpapi_base_url);
            let evaluator = Evaluator::new(&generator, &searcher, config.score_range);

            let companies = export::load_companies(&input)?;
            info!(count = companies.len(), input = %input.display(), "Loaded companies");

            let rows = evaluate_batch(&companies, &evaluator, &logs_dir).await;

            let summary = summary.unwrap_or_else(|| export::summary_path(&input));
            export::write_summary(&summary, &rows)?;
            println!(
                "\nProcessing complete. Summary CSV generated: '{}'",
                summary.display()
            );
            println!("Processed {} companies.", rows.len());
        }
        Commands::Site { logs_dir, out } => {
            let written = site::generate_site(&logs_dir, &out)?;
            println!(
                "Site written to {} ({} pages).",
                out.display(),
                written.len()
            );
        }
    }

    Ok(())
}

/// One summary row per company. Validation and log-write failures are logged
/// and never stop the batch.
async fn evaluate_batch(
    companies: &[Value],
    evaluator: &Evaluator<'_>,
    logs_dir: &Path,
) -> Vec<SummaryRow> {
    let mut rows = Vec::with_capacity(companies.len());
    for company in companies {
        match runner::run_evaluation(company, evaluator).await {
            Ok(report) => {
                match runner::save_report(&report, logs_dir) {
                    Ok(path) => println!(
                        "Saved evaluation log for '{}' to '{}'",
                        report.metadata.company_name,
                        path.display()
                    ),
                    Err(e) => error!(
                        company = %report.metadata.company_name,
                        error = %e,
                        "Failed to save evaluation log"
                    ),
                }
                rows.push(SummaryRow::from_report(company, &report));
            }
            Err(e) => {
                error!(error = %e, "Error running evaluation");
                rows.push(SummaryRow::failed(company));
            }
        }
    }
    rows
}
