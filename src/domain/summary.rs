use serde::{Deserialize, Serialize};

use super::Cents;

/// Running totals shown on the summary screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_income: Cents,
    pub total_expense: Cents,
    pub balance: Cents,
}

impl Summary {
    pub fn from_totals(total_income: Cents, total_expense: Cents) -> Self {
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.balance < 0
    }
}
