use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use rental_data::{FiscalScheduleLoader, TransactionLoader};
use rental_db_sqlite::SqliteRepository;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Load fiscal schedules and rental transactions from CSV files into the
/// database.
///
/// Fiscal schedules take two files joined on `tax_year`:
/// - brackets: tax_year, lower_bound, upper_bound (empty for open-ended), rate
/// - parameters: tax_year, social_levy_rate, salary_abattement_rate, micro_foncier_rate
///
/// Transactions: user_id, property_id, date (YYYY-MM-DD), kind
/// (rent | deductible_charge | other_charge), amount, label
#[derive(Parser, Debug)]
#[command(name = "rental-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV file with the bracket schedule
    #[arg(short, long, requires = "parameters")]
    brackets: Option<PathBuf>,

    /// CSV file with the flat fiscal parameters
    #[arg(short, long, requires = "brackets")]
    parameters: Option<PathBuf>,

    /// CSV file with rental transactions to append
    #[arg(short, long)]
    transactions: Option<PathBuf>,

    /// SQLite database URL (e.g., sqlite:rental.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:rental.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open: {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.brackets.is_none() && args.transactions.is_none() && !args.migrate && args.seeds.is_none() {
        bail!("nothing to do: pass --brackets/--parameters, --transactions, --migrate or --seeds");
    }

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        info!("running migrations");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
    }

    if let Some(seeds_dir) = &args.seeds {
        info!(seeds = %seeds_dir.display(), "running seeds");
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
    }

    if let (Some(brackets_path), Some(parameters_path)) = (&args.brackets, &args.parameters) {
        let brackets = FiscalScheduleLoader::parse_brackets(open(brackets_path)?)
            .with_context(|| format!("Failed to parse CSV: {}", brackets_path.display()))?;
        let parameters = FiscalScheduleLoader::parse_parameters(open(parameters_path)?)
            .with_context(|| format!("Failed to parse CSV: {}", parameters_path.display()))?;

        let configs = FiscalScheduleLoader::build(&brackets, &parameters)
            .context("Fiscal schedule rejected")?;
        let years = FiscalScheduleLoader::load(&repo, &configs)
            .await
            .context("Failed to load fiscal schedules into database")?;
        info!(years, "fiscal schedules loaded");
    }

    if let Some(path) = &args.transactions {
        let records = TransactionLoader::parse(open(path)?)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let inserted = TransactionLoader::load(&repo, &records)
            .await
            .context("Failed to load transactions into database")?;
        info!(inserted, "transactions loaded");
    }

    Ok(())
}
