use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{Cents, EntryId, EntryKind, Expense, Income, NewEntry, Record};

use super::MIGRATION_001_INITIAL;

const ENTRY_COLUMNS: &str = "id, name, category, amount, recorded_at";

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Repository for persisting and querying income and expense entries.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the SQLite database file at `path`.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(path: &Path, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run on every start.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize the database (connect + migrate).
    pub async fn init(path: &Path, max_connections: u32) -> Result<Self> {
        let repo = Self::connect(path, max_connections).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Entry operations
    // ========================

    /// Insert a new entry and read it back within the same transaction.
    ///
    /// The returned record carries the id and timestamp as stored. If any step
    /// fails the transaction is dropped and rolled back.
    pub async fn insert_entry<K: EntryKind>(&self, entry: &NewEntry) -> Result<Record<K>> {
        let recorded_at = entry.recorded_at.unwrap_or_else(Utc::now);

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let insert = format!(
            "INSERT INTO {} (name, category, amount, recorded_at) VALUES (?, ?, ?, ?)",
            K::TABLE
        );
        let id = sqlx::query(&insert)
            .bind(&entry.name)
            .bind(&entry.category)
            .bind(entry.amount_cents)
            .bind(format_timestamp(recorded_at))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save {}", K::LABEL))?
            .last_insert_rowid();

        let select = format!("SELECT {} FROM {} WHERE id = ?", ENTRY_COLUMNS, K::TABLE);
        let row = sqlx::query(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .with_context(|| format!("Failed to read back {}", K::LABEL))?
            .ok_or_else(|| anyhow!("{} {} missing right after insert", K::LABEL, id))?;
        let record = Self::row_to_record(&row)?;

        tx.commit()
            .await
            .with_context(|| format!("Failed to commit {}", K::LABEL))?;

        debug!(table = K::TABLE, id, amount = record.amount_cents, "entry saved");
        Ok(record)
    }

    /// Get an entry by ID.
    pub async fn get_entry<K: EntryKind>(&self, id: EntryId) -> Result<Option<Record<K>>> {
        let query = format!("SELECT {} FROM {} WHERE id = ?", ENTRY_COLUMNS, K::TABLE);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch {}", K::LABEL))?;

        row.as_ref().map(Self::row_to_record::<K>).transpose()
    }

    /// List all entries of a kind, newest first.
    /// Entries sharing a timestamp come out in reverse insertion order.
    pub async fn list_entries<K: EntryKind>(&self) -> Result<Vec<Record<K>>> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY recorded_at DESC, id DESC",
            ENTRY_COLUMNS,
            K::TABLE
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {} entries", K::LABEL))?;

        rows.iter().map(Self::row_to_record::<K>).collect()
    }

    /// Count entries of a kind.
    pub async fn count_entries<K: EntryKind>(&self) -> Result<i64> {
        let query = format!("SELECT COUNT(*) as count FROM {}", K::TABLE);
        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {} entries", K::LABEL))?;

        row.try_get("count").context("Invalid count")
    }

    /// Sum the amounts of every entry of a kind using SQL aggregation.
    pub async fn sum_entries<K: EntryKind>(&self) -> Result<Cents> {
        let query = format!("SELECT COALESCE(SUM(amount), 0) as total FROM {}", K::TABLE);
        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to sum {} entries", K::LABEL))?;

        row.try_get("total").context("Invalid total")
    }

    /// Total income and total expense, read in a single statement so both
    /// come from the same snapshot.
    pub async fn totals(&self) -> Result<(Cents, Cents)> {
        let query = format!(
            r#"
            SELECT
                (SELECT COALESCE(SUM(amount), 0) FROM {}) as total_income,
                (SELECT COALESCE(SUM(amount), 0) FROM {}) as total_expense
            "#,
            Income::TABLE,
            Expense::TABLE
        );
        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .context("Failed to compute totals")?;

        Ok((
            row.try_get("total_income").context("Invalid income total")?,
            row.try_get("total_expense").context("Invalid expense total")?,
        ))
    }

    fn row_to_record<K: EntryKind>(row: &SqliteRow) -> Result<Record<K>> {
        let recorded_at_str: String = row
            .try_get("recorded_at")
            .context("Missing recorded_at")?;

        Ok(Record::from_parts(
            row.try_get("id").context("Missing id")?,
            row.try_get("name").context("Missing name")?,
            row.try_get("category").context("Missing category")?,
            row.try_get("amount").context("Missing amount")?,
            DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        ))
    }
}

/// Fixed-width UTC form, so ordering the text column orders by time.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
