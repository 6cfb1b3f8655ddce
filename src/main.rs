//! # PayPulse CLI (`paypulse`)
//!
//! Loads monthly payroll spreadsheets into a per-variant SQLite ledger and
//! produces labor-cost reports.
//!
//! ## Usage
//!
//! ```bash
//! paypulse --config ./config/paypulse.toml [--variant general|direct] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `paypulse init` | Create both ledger databases and their tables |
//! | `paypulse load <path>` | Load a `.xlsx`/`.csv` file, replacing the periods it contains |
//! | `paypulse report` | Write the multi-sheet `.xlsx` report |
//! | `paypulse show <view>` | Print one analysis (departments, trend, overtime, ...) |
//! | `paypulse stats` | Show stored periods and record counts |
//!
//! ## Examples
//!
//! ```bash
//! # Validate a file without writing anything
//! paypulse load ./payroll_2025_01.xlsx --dry-run
//!
//! # Load into the direct labor ledger
//! paypulse --variant direct load ./direct_2025_01.xlsx
//!
//! # Report on a specific month
//! paypulse report --period 2025-01 --output ./reports/jan.xlsx
//!
//! # Overtime buckets as JSON
//! paypulse --variant direct show buckets --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use paypulse::config::{self, Config};
use paypulse::manager::LaborCostManager;
use paypulse::models::{Period, Variant};
use paypulse::show::{ShowOptions, View};
use paypulse::{export, ingest, show, stats};

/// PayPulse: a labor-cost ledger for monthly payroll spreadsheets.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "paypulse",
    about = "PayPulse — load monthly payroll spreadsheets and report labor costs",
    version,
    long_about = "PayPulse ingests monthly payroll spreadsheets into a SQLite ledger \
    (replacing each month on reload) and derives department, position, trend, overtime \
    and efficiency analytics, exported as multi-sheet .xlsx reports."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/paypulse.toml")]
    config: PathBuf,

    /// Which ledger to operate on: `general` (net payroll) or `direct`
    /// (direct labor cost).
    #[arg(long, global = true, default_value = "general")]
    variant: Variant,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create both ledger databases and their tables.
    ///
    /// Idempotent: existing tables and data are left untouched.
    Init,

    /// Load a payroll spreadsheet.
    ///
    /// Every period (year, month) present in the file replaces whatever was
    /// stored for that period before. The file is fully validated first;
    /// on any error nothing is written.
    Load {
        /// Path to a `.xlsx` or `.csv` file.
        path: PathBuf,

        /// Validate and summarize without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the multi-sheet `.xlsx` report.
    Report {
        /// Output path (defaults to `[report]` in the config).
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Period to report on, as YYYY-MM (defaults to the latest stored).
        #[arg(long)]
        period: Option<Period>,
    },

    /// Print one analysis to stdout.
    Show {
        #[arg(value_enum)]
        view: View,

        /// Period to analyze, as YYYY-MM (defaults to the latest stored).
        #[arg(long)]
        period: Option<Period>,

        /// Number of stored months for trend views.
        #[arg(long)]
        months: Option<usize>,

        /// Emit JSON instead of a text table.
        #[arg(long)]
        json: bool,
    },

    /// Show stored periods and record counts for both ledgers.
    Stats,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_init(cfg: &Config) -> anyhow::Result<()> {
    for variant in Variant::all() {
        let manager = LaborCostManager::open(cfg, variant).await?;
        manager.close().await;
        println!(
            "Initialized {} ledger at {}",
            variant,
            cfg.db.path_for(variant).display()
        );
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(&cli.config)?;
    let variant = cli.variant;

    match cli.command {
        Commands::Init => run_init(&cfg).await?,
        Commands::Load { path, dry_run } => {
            ingest::run_load(&cfg, variant, &path, dry_run).await?;
        }
        Commands::Report { output, period } => {
            export::run_report(&cfg, variant, output.as_deref(), period).await?;
        }
        Commands::Show {
            view,
            period,
            months,
            json,
        } => {
            let opts = ShowOptions {
                view,
                period,
                months,
                json,
            };
            show::run_show(&cfg, variant, &opts).await?;
        }
        Commands::Stats => stats::run_stats(&cfg).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
