//! Statsheet CLI - Fetch statistics and export them as Excel workbooks
//!
//! # Main Commands
//!
//! ```bash
//! statsheet run                          # Run every job in ./jobs
//! statsheet job jobs/population.json     # Run a single job
//! ```
//!
//! # Offline Commands
//!
//! ```bash
//! statsheet reshape response.json -o out.xlsx --item-path response.body.items.item
//! statsheet resolve response.json response.body.totalCount
//! ```

use clap::{Parser, Subcommand};
use serde_json::Value;
use statsheet::{
    reshape_document, resolve, run_all, run_job_file, write_workbook, HttpFetcher, Settings,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "statsheet")]
#[command(about = "Fetch statistical tables and export them as Excel workbooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every *.json job in the jobs directory
    Run {
        /// Jobs directory (default: $STATSHEET_JOBS_DIR or ./jobs)
        #[arg(long)]
        jobs_dir: Option<PathBuf>,

        /// Output root (default: $STATSHEET_OUTPUT_DIR or ./output)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Run a single job file
    Job {
        /// Job JSON file
        file: PathBuf,

        /// Output root (default: $STATSHEET_OUTPUT_DIR or ./output)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Reshape a saved provider response into a workbook (no network)
    Reshape {
        /// Response JSON file
        input: PathBuf,

        /// Dotted path to the item list
        #[arg(long)]
        item_path: Option<String>,

        /// Pivot spec JSON file (default pivot if omitted)
        #[arg(long)]
        pivot: Option<PathBuf>,

        /// Output xlsx file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the value at a dotted path of a JSON document
    Resolve {
        /// JSON document
        input: PathBuf,

        /// Dotted path, e.g. response.body.items.item.0
        path: String,
    },
}

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            jobs_dir,
            output_dir,
        } => cmd_run(settings, jobs_dir, output_dir).await,

        Commands::Job { file, output_dir } => cmd_job(settings, &file, output_dir).await,

        Commands::Reshape {
            input,
            item_path,
            pivot,
            output,
        } => cmd_reshape(&input, item_path.as_deref(), pivot.as_deref(), &output),

        Commands::Resolve { input, path } => cmd_resolve(&input, &path),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_run(
    mut settings: Settings,
    jobs_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = jobs_dir {
        settings = settings.with_jobs_dir(dir);
    }
    if let Some(dir) = output_dir {
        settings = settings.with_output_root(dir);
    }

    let report = run_all(&settings).await?;

    for (name, path) in &report.succeeded {
        eprintln!("✅ {} -> {}", name, path.display());
    }
    for (name, warning) in &report.warnings {
        eprintln!("⚠️  {} -> {}", name, warning);
    }
    for (name, message) in &report.failed {
        eprintln!("❌ {} -> {}", name, message);
    }

    if report.has_failures() {
        return Err(format!("{} of {} job(s) failed", report.failed.len(), report.total()).into());
    }
    Ok(())
}

async fn cmd_job(
    mut settings: Settings,
    file: &Path,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = output_dir {
        settings = settings.with_output_root(dir);
    }

    let fetcher = HttpFetcher::from_settings(&settings)?;
    let out = run_job_file(file, &settings, &fetcher).await?;
    eprintln!("✅ Saved: {}", out.display());
    Ok(())
}

fn cmd_reshape(
    input: &Path,
    item_path: Option<&str>,
    pivot: Option<&Path>,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reshaping: {}", input.display());

    let doc = read_json(input)?;
    let pivot_cfg = pivot.map(read_json).transpose()?;

    let bundle = reshape_document(&doc, item_path, pivot_cfg.as_ref())?;
    eprintln!("   Sheets: {}", bundle.names().join(", "));

    write_workbook(&bundle, output)?;
    eprintln!("✅ Saved: {}", output.display());
    Ok(())
}

fn cmd_resolve(input: &Path, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let doc = read_json(input)?;
    println!("{}", serde_json::to_string_pretty(resolve(&doc, path))?);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
