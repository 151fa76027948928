use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{
    Cents, EntryId, EntryKind, Expense, ExpenseRecord, Income, IncomeRecord, NewEntry, Record,
    Summary,
};
use crate::storage::Repository;

use super::LedgerError;

/// Handle to an opened ledger.
///
/// The only way to get one is a successful [`LedgerService::init`], so holding
/// a `LedgerService` means the schema exists. Cloning is cheap and every clone
/// shares the same connection pool; create it once at startup and hand clones
/// to each consumer.
#[derive(Debug, Clone)]
pub struct LedgerService {
    repo: Repository,
    database_path: PathBuf,
}

impl LedgerService {
    /// Open (creating if needed) the ledger described by `config`.
    pub async fn open(config: &Config) -> Result<Self, LedgerError> {
        Self::init_with(&config.database_path, config.max_connections).await
    }

    /// Open (creating if needed) the ledger at the given path with default settings.
    pub async fn init(database_path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        Self::init_with(database_path.as_ref(), Config::DEFAULT_MAX_CONNECTIONS).await
    }

    async fn init_with(database_path: &Path, max_connections: u32) -> Result<Self, LedgerError> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))
                    .map_err(LedgerError::StorageInit)?;
            }
        }

        let repo = Repository::init(database_path, max_connections)
            .await
            .map_err(LedgerError::StorageInit)?;

        info!(path = %database_path.display(), "ledger ready");
        Ok(Self {
            repo,
            database_path: database_path.to_path_buf(),
        })
    }

    /// Location of the backing database file.
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Close the underlying connections. Clones become unusable afterwards.
    pub async fn close(&self) {
        self.repo.close().await;
    }

    // ========================
    // Writes
    // ========================

    /// Record a new income entry from raw form input.
    pub async fn insert_income(
        &self,
        name: &str,
        category: &str,
        amount: &str,
    ) -> Result<IncomeRecord, LedgerError> {
        self.insert::<Income>(name, category, amount, None).await
    }

    /// Record a new expense entry from raw form input.
    pub async fn insert_expense(
        &self,
        name: &str,
        category: &str,
        amount: &str,
    ) -> Result<ExpenseRecord, LedgerError> {
        self.insert::<Expense>(name, category, amount, None).await
    }

    /// Validate raw form input and record it as an entry of kind `K`.
    /// Without `recorded_at` the entry is stamped with the current time.
    pub async fn insert<K: EntryKind>(
        &self,
        name: &str,
        category: &str,
        amount: &str,
        recorded_at: Option<DateTime<Utc>>,
    ) -> Result<Record<K>, LedgerError> {
        let mut entry = NewEntry::parse(name, category, amount).map_err(|err| {
            warn!(table = K::TABLE, error = %err, "rejected entry");
            LedgerError::from(err)
        })?;
        if let Some(at) = recorded_at {
            entry = entry.with_recorded_at(at);
        }
        self.record(entry).await
    }

    /// Persist an already validated entry and return it as stored.
    pub async fn record<K: EntryKind>(&self, entry: NewEntry) -> Result<Record<K>, LedgerError> {
        self.repo
            .insert_entry::<K>(&entry)
            .await
            .map_err(LedgerError::Write)
    }

    // ========================
    // Reads
    // ========================

    /// All income entries, newest first.
    pub async fn list_incomes(&self) -> Result<Vec<IncomeRecord>, LedgerError> {
        self.list::<Income>().await
    }

    /// All expense entries, newest first.
    pub async fn list_expenses(&self) -> Result<Vec<ExpenseRecord>, LedgerError> {
        self.list::<Expense>().await
    }

    /// All entries of a kind, newest first.
    pub async fn list<K: EntryKind>(&self) -> Result<Vec<Record<K>>, LedgerError> {
        let records = self
            .repo
            .list_entries::<K>()
            .await
            .map_err(LedgerError::Read)?;
        debug!(table = K::TABLE, count = records.len(), "listed entries");
        Ok(records)
    }

    /// Look up one entry by id.
    pub async fn get<K: EntryKind>(&self, id: EntryId) -> Result<Option<Record<K>>, LedgerError> {
        self.repo
            .get_entry::<K>(id)
            .await
            .map_err(LedgerError::Read)
    }

    /// Number of stored entries of a kind.
    pub async fn count<K: EntryKind>(&self) -> Result<i64, LedgerError> {
        self.repo
            .count_entries::<K>()
            .await
            .map_err(LedgerError::Read)
    }

    pub async fn sum_incomes(&self) -> Result<Cents, LedgerError> {
        self.repo
            .sum_entries::<Income>()
            .await
            .map_err(LedgerError::Read)
    }

    pub async fn sum_expenses(&self) -> Result<Cents, LedgerError> {
        self.repo
            .sum_entries::<Expense>()
            .await
            .map_err(LedgerError::Read)
    }

    // ========================
    // Aggregation
    // ========================

    /// Total income, total expense and balance of the ledger as it is now.
    ///
    /// Nothing is cached: every call asks the database.
    pub async fn compute_summary(&self) -> Result<Summary, LedgerError> {
        let (total_income, total_expense) = self.repo.totals().await.map_err(LedgerError::Read)?;
        let summary = Summary::from_totals(total_income, total_expense);
        debug!(
            total_income,
            total_expense,
            balance = summary.balance,
            "computed summary"
        );
        Ok(summary)
    }
}
