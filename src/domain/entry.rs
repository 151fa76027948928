use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, parse_amount};

pub type EntryId = i64;

/// Marker for one kind of ledger entry. Each kind lives in its own table.
pub trait EntryKind: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Table holding entries of this kind.
    const TABLE: &'static str;
    /// Human-readable singular name.
    const LABEL: &'static str;
}

/// Money coming in: salary, freelance work, gifts...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Income;

/// Money going out: rent, groceries, bills...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expense;

impl EntryKind for Income {
    const TABLE: &'static str = "income";
    const LABEL: &'static str = "income";
}

impl EntryKind for Expense {
    const TABLE: &'static str = "expense";
    const LABEL: &'static str = "expense";
}

/// A stored ledger entry. `id` and `recorded_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Record<K: EntryKind> {
    pub id: EntryId,
    pub name: String,
    pub category: String,
    pub amount_cents: Cents,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip)]
    kind: PhantomData<K>,
}

pub type IncomeRecord = Record<Income>;
pub type ExpenseRecord = Record<Expense>;

impl<K: EntryKind> Record<K> {
    /// Rebuild a record from stored values. Only the storage layer should call this.
    pub fn from_parts(
        id: EntryId,
        name: String,
        category: String,
        amount_cents: Cents,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            category,
            amount_cents,
            recorded_at,
            kind: PhantomData,
        }
    }

    pub fn label(&self) -> &'static str {
        K::LABEL
    }
}

/// Validated input for a new entry, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub name: String,
    pub category: String,
    pub amount_cents: Cents,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl NewEntry {
    /// Validate raw user input.
    ///
    /// Name and category are trimmed and must not be blank. The amount is
    /// parsed with [`parse_amount`], so unparsable text becomes 0.
    pub fn parse(name: &str, category: &str, amount: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let category = category.trim();
        if category.is_empty() {
            return Err(ValidationError::EmptyCategory);
        }

        let amount_cents = parse_amount(amount)?;

        Ok(Self {
            name: name.to_string(),
            category: category.to_string(),
            amount_cents,
            recorded_at: None,
        })
    }

    /// Back-date the entry instead of stamping it with the insertion time.
    pub fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,

    #[error("category is required")]
    EmptyCategory,

    #[error("amount cannot be negative: {0}")]
    NegativeAmount(String),

    #[error("amount is too large: {0}")]
    AmountOutOfRange(String),
}
