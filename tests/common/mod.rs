// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use financas::application::LedgerService;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(&db_path).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: a month of typical entries
pub struct StandardEntries;

impl StandardEntries {
    /// Two incomes (1500.00) and three expenses (620.50)
    pub async fn create(service: &LedgerService) -> Result<()> {
        service.insert_income("Salary", "Job", "1200").await?;
        service.insert_income("Website", "Freelance", "300.00").await?;
        service.insert_expense("Rent", "Housing", "400").await?;
        service.insert_expense("Groceries", "Food", "180.25").await?;
        service.insert_expense("Bus pass", "Transport", "40.25").await?;
        Ok(())
    }
}
