//! Command-line front end for the factsheet builder.
//!
//! ```bash
//! factsheet generate portfolio.csv -o factsheet.pdf
//! factsheet preview portfolio.csv -o preview.html
//! factsheet schema > factsheet-config.schema.json
//! GEMINI_API_KEY=... factsheet explain   # requires the `gemini` feature
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use factsheet_builder::{FactsheetConfig, FactsheetGenerator, RawTable, SUGGESTED_FILENAME};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "factsheet")]
#[command(about = "Build a three-page investment factsheet from a portfolio CSV")]
struct Cli {
    /// JSON file overriding the title, column names and defaults
    #[arg(long, global = true, env = "FACTSHEET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the factsheet PDF
    Generate {
        /// Portfolio CSV with a header row
        csv: PathBuf,

        #[arg(short, long, default_value = SUGGESTED_FILENAME)]
        output: PathBuf,
    },

    /// Write an HTML preview of the uploaded table and charts
    Preview {
        csv: PathBuf,

        #[arg(short, long, default_value = "preview.html")]
        output: PathBuf,
    },

    /// Ask Gemini for a walkthrough of the factsheet sections
    #[cfg(feature = "gemini")]
    Explain {
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Overrides the configured model
        #[arg(long)]
        model: Option<String>,

        /// Overrides the configured timeout
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() {
    env_logger::init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate { csv, output } => {
            let table = read_table(&csv)?;
            let factsheet = FactsheetGenerator::new(config)
                .generate(&table)
                .context("Failed to generate factsheet")?;
            fs::write(&output, &factsheet.pdf)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "Wrote {} pages ({} bytes) to {}",
                factsheet.document.page_count(),
                factsheet.pdf.len(),
                output.display()
            );
            println!("{}", output.display());
        }
        Commands::Preview { csv, output } => {
            let table = read_table(&csv)?;
            let html = FactsheetGenerator::new(config)
                .preview(&table)
                .context("Failed to render preview")?;
            fs::write(&output, html)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{}", output.display());
        }
        #[cfg(feature = "gemini")]
        Commands::Explain {
            api_key,
            model,
            timeout_secs,
        } => {
            let text = explain(&config, api_key, model, timeout_secs)?;
            println!("{}", text);
        }
        Commands::Schema => {
            println!("{}", FactsheetConfig::schema_as_json()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<FactsheetConfig> {
    match path {
        Some(path) => FactsheetConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(FactsheetConfig::default()),
    }
}

fn read_table(path: &Path) -> Result<RawTable> {
    RawTable::from_csv_path(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(feature = "gemini")]
fn explain(
    config: &FactsheetConfig,
    api_key: String,
    model: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<String> {
    use factsheet_builder::llm::{Explainer, GeminiClient};
    use std::time::Duration;

    let explainer = Explainer::new(GeminiClient::new(api_key))
        .with_model(model.unwrap_or_else(|| config.explanation_model.clone()))
        .with_timeout(Duration::from_secs(
            timeout_secs.unwrap_or(config.explanation_timeout_secs),
        ));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(explainer.explain())
        .context("Explanation request failed")
}
