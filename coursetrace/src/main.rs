//! coursetrace - course activity reports from the command line
//!
//! Generates the built-in reports for one user in one course and renders
//! them as a terminal table or CSV. All report semantics live in
//! coursetrace-core; this binary is plumbing.

mod ingest;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use coursetrace_core::{
    ActivityStore, Config, EnglishLabels, Report, ReportGenerator, ReportScope,
};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "coursetrace")]
#[command(about = "Course activity reports with dedication analytics")]
#[command(version)]
struct Cli {
    /// Activity store path (defaults to the XDG data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available reports
    Reports,

    /// Generate a report for one user in one course
    Generate {
        /// Report name (see `coursetrace reports`)
        report: String,

        /// User id the report is scoped to
        #[arg(short, long)]
        user: i64,

        /// Course id the report is scoped to
        #[arg(short, long)]
        course: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load raw records from a JSON dump into the store
    Ingest {
        /// JSON file shaped as { "<table>": [ { column: value, ... }, ... ] }
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard = coursetrace_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    // Open the activity store
    let store_path = cli.db.clone().unwrap_or_else(|| config.store_path());
    let store = ActivityStore::open(&store_path).context("failed to open activity store")?;
    store.migrate().context("failed to run store migrations")?;

    match cli.command {
        Command::Reports => {
            println!("Available reports:");
            for report in Report::all() {
                println!("  {:<26} {}", report.as_str(), report.describe());
            }
            Ok(())
        }

        Command::Generate {
            report,
            user,
            course,
            format,
            output,
        } => {
            let report = Report::from_str(&report)
                .with_context(|| format!("unknown report `{}`; try `coursetrace reports`", report))?;

            let labels = EnglishLabels::with_overrides(config.labels.clone());
            let mut generator = ReportGenerator::new(&store, &labels, &config);

            let table = match generator.generate(report, ReportScope::new(user, course)) {
                Ok(table) => table,
                // A definition wiring bug is not a data condition; make the
                // distinction visible at the exit.
                Err(e) if e.is_configuration() => {
                    anyhow::bail!("report definition error in `{}`: {}", report, e)
                }
                Err(e) => return Err(e).context("failed to generate report"),
            };

            if table.is_empty() {
                tracing::info!(report = %report, user, course, "Report is empty");
            }

            match (format, output) {
                (OutputFormat::Table, None) => println!("{}", render::render_table(&table)),
                (OutputFormat::Table, Some(path)) => {
                    std::fs::write(&path, format!("{}\n", render::render_table(&table)))
                        .with_context(|| format!("failed to write {:?}", path))?;
                }
                (OutputFormat::Csv, None) => {
                    render::write_csv(&table, std::io::stdout().lock())?;
                }
                (OutputFormat::Csv, Some(path)) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {:?}", path))?;
                    render::write_csv(&table, file)?;
                }
            }
            Ok(())
        }

        Command::Ingest { file } => {
            let inserted = ingest::ingest_file(&store, &file)
                .with_context(|| format!("failed to ingest {:?}", file))?;
            println!("Inserted {} rows into {:?}", inserted, store_path);
            Ok(())
        }
    }
}
