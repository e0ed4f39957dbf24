mod commands;

use crate::commands::{compare, elections, import, regions};
use clap::{Parser, Subcommand};
use seat_compare::database::ingestion::{ImportOptions, MIN_ELECTION_YEAR};
use seat_compare::database::VotesDatabase;
use seat_compare::elections::PrMethod;
use seat_compare::session::AnalysisOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Opts {
    /// SQLite database holding one table per election
    #[clap(long, global = true, default_value = "elections.db")]
    database: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import election results from a spreadsheet workbook
    Import {
        /// Workbook with one sheet per election
        workbook: PathBuf,
        /// Earliest election year to import
        #[clap(long, default_value_t = MIN_ELECTION_YEAR)]
        min_year: u32,
        /// Re-import elections that are already in the database
        #[clap(long)]
        force: bool,
    },
    /// List imported elections, oldest first
    Elections,
    /// List the regions recorded for an election
    Regions {
        election: String,
    },
    /// Compare seats won under first-past-the-post and proportional representation
    Compare {
        /// Election to analyse (e.g. "2019", "1974F"); defaults to the most recent
        election: Option<String>,
        /// Move this many elections later (or earlier, if negative)
        #[clap(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
        /// How PR seats are allocated
        #[clap(long, value_enum, default_value = "by-region")]
        pr_method: PrMethod,
        /// Count the "Other" column under PR
        #[clap(long)]
        include_other: bool,
        /// Largest coalition to consider
        #[clap(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..))]
        max_coalition_size: u8,
        /// Print the comparison as JSON
        #[clap(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    let succeeded = match run(&opts.database, opts.command).await {
        Ok(succeeded) => succeeded,
        Err(e) => {
            eprintln!("❌ {}", e);
            false
        }
    };
    if !succeeded {
        std::process::exit(1);
    }
}

async fn run(database: &Path, command: Command) -> commands::CommandResult<bool> {
    match command {
        Command::Import {
            workbook,
            min_year,
            force,
        } => {
            import(database, &workbook, ImportOptions { min_year, force }).await?;
            Ok(true)
        }
        Command::Elections => {
            elections(&open(database).await?).await?;
            Ok(true)
        }
        Command::Regions { election } => {
            regions(&open(database).await?, &election).await?;
            Ok(true)
        }
        Command::Compare {
            election,
            offset,
            pr_method,
            include_other,
            max_coalition_size,
            json,
        } => {
            let options = AnalysisOptions {
                pr_method,
                ignore_other: !include_other,
                maximum_coalition_size: usize::from(max_coalition_size),
            };
            compare(
                &open(database).await?,
                election.as_deref(),
                offset,
                options,
                json,
            )
            .await
        }
    }
}

/// Open an existing database; analysis never creates one.
async fn open(database: &Path) -> commands::CommandResult<VotesDatabase> {
    if !database.exists() {
        return Err(format!(
            "Database does not exist: {} (run `import` first)",
            database.display()
        )
        .into());
    }
    Ok(VotesDatabase::open(database, false).await?)
}
