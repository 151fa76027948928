use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::{LedgerService, Screen};
use crate::config::Config;
use crate::domain::{Cents, EntryKind, Expense, Income, Record, Summary, format_cents};
use crate::logging::init_tracing;

/// Financas - Income and expense tracker
#[derive(Parser)]
#[command(name = "financas")]
#[command(about = "Record income and expenses and keep a running balance")]
#[command(version)]
pub struct Cli {
    /// Database file path (defaults to $FINANCAS_DB or the platform data directory)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Show total income, total expenses and balance
    Summary {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Refresh every N seconds until interrupted
        #[arg(long, value_name = "SECONDS")]
        watch: Option<u64>,
    },

    /// Income entries
    #[command(subcommand)]
    Income(EntryCommands),

    /// Expense entries
    #[command(subcommand)]
    Expense(EntryCommands),
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Record a new entry
    Add {
        /// What the entry is called (e.g. "Salary", "Rent")
        name: String,

        /// Free-form category (e.g. "Job", "Housing")
        #[arg(short, long)]
        category: String,

        /// Amount (e.g. "50.00" or "50"); unreadable amounts are stored as 0
        #[arg(short, long, default_value = "")]
        amount: String,

        /// Date of the entry (ISO 8601 format: YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List entries, newest first
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        let config = Config::resolve(self.database);
        let service = LedgerService::open(&config).await?;

        let outcome = match self.command {
            Commands::Init => {
                println!(
                    "Database initialized: {}",
                    service.database_path().display()
                );
                Ok(())
            }
            Commands::Summary { format, watch } => {
                run_summary_command(&service, format, watch).await
            }
            Commands::Income(cmd) => run_entry_command::<Income>(&service, cmd).await,
            Commands::Expense(cmd) => run_entry_command::<Expense>(&service, cmd).await,
        };

        service.close().await;
        outcome
    }
}

async fn run_summary_command(
    service: &LedgerService,
    format: OutputFormat,
    watch: Option<u64>,
) -> Result<()> {
    let mut screen = Screen::new();
    screen.begin_load();
    screen.finish(service.compute_summary().await);
    print_summary(&screen, format)?;

    let Some(seconds) = watch else {
        return Ok(());
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(seconds.max(1)));
    // The first tick fires immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if !screen.begin_refresh() {
                    continue;
                }
                tokio::select! {
                    result = service.compute_summary() => {
                        screen.finish(result);
                        print_summary(&screen, format)?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        screen.cancel_refresh();
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_summary(screen: &Screen<Summary>, format: OutputFormat) -> Result<()> {
    let summary = loaded(screen)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Table => {
            println!("Financial Summary");
            println!("{}", "-".repeat(30));
            println!("{:<16} {:>13}", "Balance", format_cents(summary.balance));
            println!(
                "{:<16} {:>13}",
                "Total income",
                format_cents(summary.total_income)
            );
            println!(
                "{:<16} {:>13}",
                "Total expenses",
                format_cents(summary.total_expense)
            );
            if summary.is_negative() {
                println!("\nYou are spending more than you earn.");
            }
        }
    }
    Ok(())
}

async fn run_entry_command<K: EntryKind>(
    service: &LedgerService,
    cmd: EntryCommands,
) -> Result<()> {
    match cmd {
        EntryCommands::Add {
            name,
            category,
            amount,
            date,
        } => {
            let recorded_at = date
                .map(|d| parse_date(&d))
                .transpose()
                .context("Invalid date")?;

            let record = service
                .insert::<K>(&name, &category, &amount, recorded_at)
                .await?;

            println!(
                "Recorded {} #{}: {} ({}) {}",
                record.label(),
                record.id,
                record.name,
                record.category,
                format_cents(record.amount_cents)
            );
        }

        EntryCommands::List { format } => {
            let mut screen = Screen::new();
            screen.begin_load();
            screen.finish(service.list::<K>().await);
            print_entries(loaded(&screen)?, format)?;
        }
    }
    Ok(())
}

fn print_entries<K: EntryKind>(records: &[Record<K>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No {} entries found.", K::LABEL);
                return Ok(());
            }

            println!(
                "{:<6} {:<12} {:<24} {:<16} {:>12}",
                "ID", "DATE", "NAME", "CATEGORY", "AMOUNT"
            );
            println!("{}", "-".repeat(74));
            for record in records {
                println!(
                    "{:<6} {:<12} {:<24} {:<16} {:>12}",
                    record.id,
                    record.recorded_at.format("%Y-%m-%d"),
                    truncate(&record.name, 24),
                    truncate(&record.category, 16),
                    format_cents(record.amount_cents)
                );
            }

            let total = total_cents(records);
            println!("{}", "-".repeat(74));
            println!("{:<60} {:>12}", "TOTAL", format_cents(total));
        }
    }
    Ok(())
}

fn total_cents<K: EntryKind>(records: &[Record<K>]) -> Cents {
    records
        .iter()
        .fold(0, |total: Cents, r| total.saturating_add(r.amount_cents))
}

/// The loaded data of a screen, or its error if loading failed.
fn loaded<T>(screen: &Screen<T>) -> Result<&T> {
    if let Some(error) = screen.error() {
        if screen.is_failed() {
            bail!("{}", error);
        }
        eprintln!("warning: {}", error);
    }
    screen
        .data()
        .ok_or_else(|| anyhow::anyhow!("Nothing loaded yet"))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    // Parse YYYY-MM-DD format
    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .context("Date must be in YYYY-MM-DD format")?;

    // Convert to UTC datetime at midnight
    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;

    Ok(DateTime::from_naive_utc_and_offset(naive_datetime, Utc))
}
