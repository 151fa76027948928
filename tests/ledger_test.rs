mod common;

use std::collections::HashSet;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use common::{StandardEntries, parse_date, test_service};
use financas::LedgerError;
use financas::application::LedgerService;
use financas::domain::{Expense, Income, NewEntry, ValidationError};
use tempfile::TempDir;

#[tokio::test]
async fn test_insert_income_returns_stored_record() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let before = Utc::now();
    let record = service.insert_income("Salary", "Job", "1000").await?;

    assert!(record.id > 0);
    assert_eq!(record.name, "Salary");
    assert_eq!(record.category, "Job");
    assert_eq!(record.amount_cents, 100000);
    // Stored with millisecond precision
    assert!(record.recorded_at >= before - chrono::Duration::milliseconds(1));
    assert!(record.recorded_at <= Utc::now());

    let fetched = service.get::<Income>(record.id).await?;
    assert_eq!(fetched, Some(record));

    Ok(())
}

#[tokio::test]
async fn test_insert_expense_is_symmetric() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let record = service.insert_expense("Rent", "Housing", "400.50").await?;
    assert_eq!(record.amount_cents, 40050);
    assert_eq!(record.label(), "expense");

    let expenses = service.list_expenses().await?;
    assert_eq!(expenses, vec![record]);

    Ok(())
}

#[tokio::test]
async fn test_incomes_and_expenses_are_kept_apart() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardEntries::create(&service).await?;

    assert_eq!(service.list_incomes().await?.len(), 2);
    assert_eq!(service.list_expenses().await?.len(), 3);
    assert_eq!(service.count::<Income>().await?, 2);
    assert_eq!(service.count::<Expense>().await?, 3);

    // Ids are per table, so an income id does not resolve to an expense
    let salary = &service.list_incomes().await?[1];
    assert_eq!(salary.name, "Salary");
    let expense_with_same_id = service.get::<Expense>(salary.id).await?;
    assert_ne!(
        expense_with_same_id.map(|e| e.name),
        Some("Salary".to_string())
    );

    Ok(())
}

#[tokio::test]
async fn test_sum_equals_inserted_amounts() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let amounts = ["10.10", "20.20", "0.01", "999.99", "0.1", "0.2"];
    for (i, amount) in amounts.iter().enumerate() {
        service
            .insert_income(&format!("Income {}", i), "Misc", amount)
            .await?;
    }

    // 1010 + 2020 + 1 + 99999 + 10 + 20
    assert_eq!(service.sum_incomes().await?, 103060);
    assert_eq!(service.list_incomes().await?.len(), amounts.len());
    assert_eq!(service.sum_expenses().await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_list_is_newest_first() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for (name, date) in [
        ("January", "2024-01-15"),
        ("March", "2024-03-15"),
        ("February", "2024-02-15"),
    ] {
        service
            .insert::<Income>(name, "Job", "100", Some(parse_date(date)))
            .await?;
    }
    service.insert_income("Today", "Job", "100").await?;

    let names: Vec<String> = service
        .list_incomes()
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Today", "March", "February", "January"]);

    let incomes = service.list_incomes().await?;
    assert!(
        incomes
            .windows(2)
            .all(|pair| pair[0].recorded_at >= pair[1].recorded_at)
    );

    Ok(())
}

#[tokio::test]
async fn test_same_timestamp_entries_get_distinct_ids() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let at = parse_date("2024-05-01");
    let first = service
        .record::<Income>(NewEntry::parse("Bonus", "Job", "50")?.with_recorded_at(at))
        .await?;
    let second = service
        .record::<Income>(NewEntry::parse("Bonus", "Job", "50")?.with_recorded_at(at))
        .await?;

    assert_ne!(first.id, second.id);
    assert!(second.id > first.id);
    assert_eq!(first.recorded_at, second.recorded_at);

    let incomes = service.list_incomes().await?;
    assert_eq!(incomes.len(), 2);
    // Ties are broken by id, newest first, and stay that way
    assert_eq!(incomes[0].id, second.id);
    assert_eq!(incomes[1].id, first.id);
    assert_eq!(service.list_incomes().await?, incomes);

    Ok(())
}

#[tokio::test]
async fn test_empty_name_or_category_is_rejected_without_a_row() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.insert_income("Salary", "Job", "1000").await?;

    let err = service.insert_income("", "Job", "10").await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::EmptyName)
    ));

    let err = service.insert_income("Gift", "  ", "10").await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::EmptyCategory)
    ));

    let err = service.insert_expense("", "", "10").await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert!(!err.is_retryable());

    assert_eq!(service.list_incomes().await?.len(), 1);
    assert!(service.list_expenses().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unparsable_amount_is_stored_as_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let record = service.insert_income("Mystery", "Misc", "abc").await?;
    assert_eq!(record.amount_cents, 0);

    let record = service.insert_expense("Coffee", "Food", "").await?;
    assert_eq!(record.amount_cents, 0);

    let record = service.insert_expense("Rice", "Food", "12.5kg").await?;
    assert_eq!(record.amount_cents, 1250);

    assert_eq!(service.sum_incomes().await?, 0);
    assert_eq!(service.sum_expenses().await?, 1250);

    Ok(())
}

#[tokio::test]
async fn test_negative_amount_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.insert_expense("Refund", "Misc", "-25").await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::NegativeAmount(_))
    ));
    assert!(service.list_expenses().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_fresh_store_is_empty() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(service.list_incomes().await?.is_empty());
    assert!(service.list_expenses().await?.is_empty());
    assert_eq!(service.sum_incomes().await?, 0);
    assert_eq!(service.sum_expenses().await?, 0);
    assert_eq!(service.get::<Income>(1).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_initialize_twice_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("ledger.db");

    let first = LedgerService::init(&db_path).await?;
    first.insert_income("Salary", "Job", "1000").await?;

    // A second handle on the same file, while the first is still open
    let second = LedgerService::init(&db_path).await?;
    assert_eq!(second.list_incomes().await?.len(), 1);
    first.close().await;
    second.close().await;

    // And again after a restart
    let third = LedgerService::init(&db_path).await?;
    assert_eq!(third.sum_incomes().await?, 100000);

    Ok(())
}

#[tokio::test]
async fn test_ids_are_never_reused_across_restarts() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("ledger.db");

    let service = LedgerService::init(&db_path).await?;
    let first = service.insert_expense("Rent", "Housing", "400").await?;
    service.close().await;

    let service = LedgerService::init(&db_path).await?;
    let second = service.insert_expense("Rent", "Housing", "400").await?;
    assert!(second.id > first.id);

    Ok(())
}

#[tokio::test]
async fn test_init_creates_missing_directories() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("nested").join("dir").join("ledger.db");

    let service = LedgerService::init(&db_path).await?;
    assert!(db_path.exists());
    assert_eq!(service.database_path(), db_path.as_path());

    Ok(())
}

#[tokio::test]
async fn test_init_fails_on_inaccessible_location() -> Result<()> {
    let temp_dir = TempDir::new()?;
    // A regular file where a directory is expected
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"")?;
    let db_path = blocker.join("ledger.db");

    let err = LedgerService::init(&db_path).await.unwrap_err();
    assert!(matches!(err, LedgerError::StorageInit(_)));
    assert!(!err.is_retryable());

    Ok(())
}

#[tokio::test]
async fn test_concurrent_inserts_get_unique_ids() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut handles = Vec::new();
    for i in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                service
                    .insert_income(&format!("Income {}", i), "Misc", "10")
                    .await
                    .map(|r| r.id)
            } else {
                service
                    .insert_expense(&format!("Expense {}", i), "Misc", "5")
                    .await
                    .map(|r| r.id)
            }
        }));
    }

    let mut income_ids = HashSet::new();
    for (i, handle) in handles.into_iter().enumerate() {
        let id = handle.await??;
        if i % 2 == 0 {
            assert!(income_ids.insert(id), "duplicate income id {}", id);
        }
    }

    assert_eq!(income_ids.len(), 10);
    assert_eq!(service.list_incomes().await?.len(), 10);
    assert_eq!(service.list_expenses().await?.len(), 10);
    assert_eq!(service.sum_incomes().await?, 10000);
    assert_eq!(service.sum_expenses().await?, 5000);

    Ok(())
}

#[tokio::test]
async fn test_insert_on_closed_store_is_a_write_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("ledger.db");

    let service = LedgerService::init(&db_path).await?;
    service.insert_income("Salary", "Job", "1000").await?;
    service.close().await;

    let err = service.insert_income("Bonus", "Job", "50").await.unwrap_err();
    assert!(matches!(err, LedgerError::Write(_)));
    assert!(err.is_retryable());

    let reopened = LedgerService::init(&db_path).await?;
    assert_eq!(reopened.list_incomes().await?.len(), 1);
    assert_eq!(reopened.count::<Income>().await?, 1);
    assert_eq!(reopened.sum_incomes().await?, 100000);

    Ok(())
}

#[tokio::test]
async fn test_failed_read_back_leaves_no_record() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.insert_expense("Rent", "Housing", "400").await?;

    // Five-digit years are written but cannot be read back as RFC 3339
    let far_future = NaiveDate::from_ymd_opt(10000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();
    let err = service
        .insert::<Expense>("Time machine", "Leisure", "10", Some(far_future))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Write(_)));

    assert_eq!(service.list_expenses().await?.len(), 1);
    assert_eq!(service.count::<Expense>().await?, 1);
    assert_eq!(service.sum_expenses().await?, 40000);

    Ok(())
}
