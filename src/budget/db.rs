//! Database operations for budgets.

use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Type};
use rust_decimal::Decimal;

use crate::{
    Error,
    budget::{
        Budget, BudgetFilter, BudgetId, BudgetUpdate, CategoryBudgets, DEFAULT_OWNER_SCOPE,
        NewBudget,
    },
    db::decimal_from_column,
    pagination::PageRequest,
    timestamp::{self, timestamp_from_column},
};

const BUDGET_COLUMNS: &str = "id, month, year, total_budget, category_budgets, is_active, \
    owner_scope, created_at, updated_at";

/// Initialize the budget table.
///
/// At most one budget may exist for a month and year within an owner scope.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL CHECK (year >= 2020),
            total_budget TEXT NOT NULL,
            category_budgets TEXT NOT NULL DEFAULT '{}',
            is_active INTEGER NOT NULL DEFAULT 1,
            owner_scope TEXT NOT NULL DEFAULT 'default',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_budget_month_year_owner
            ON budget(month, year, owner_scope);",
    )?;

    Ok(())
}

/// Save a new, active budget.
///
/// # Errors
/// Returns [Error::DuplicateBudget] with the existing budget if there is already a budget for the
/// same month, year and owner scope.
pub fn create_budget(new_budget: NewBudget, connection: &Connection) -> Result<Budget, Error> {
    let now = timestamp::now();
    let category_budgets_json = category_budgets_to_json(&new_budget.category_budgets)?;

    let insert_result = connection.execute(
        "INSERT INTO budget (month, year, total_budget, category_budgets, is_active, \
        owner_scope, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?6);",
        (
            new_budget.month,
            new_budget.year,
            new_budget.total_budget.to_string(),
            category_budgets_json,
            &new_budget.owner_scope,
            now.unix_timestamp(),
        ),
    );

    match insert_result {
        Ok(_) => {}
        // Code 2067 occurs when a UNIQUE constraint failed.
        Err(rusqlite::Error::SqliteFailure(error, Some(_))) if error.extended_code == 2067 => {
            let existing = find_budget(
                new_budget.month,
                new_budget.year,
                &new_budget.owner_scope,
                connection,
            )?
            .ok_or(Error::NotFound)?;

            return Err(Error::DuplicateBudget(Box::new(existing)));
        }
        Err(error) => return Err(error.into()),
    }

    Ok(Budget {
        id: connection.last_insert_rowid(),
        month: new_budget.month,
        year: new_budget.year,
        total_budget: new_budget.total_budget,
        category_budgets: new_budget.category_budgets,
        is_active: true,
        owner_scope: new_budget.owner_scope,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve a budget by ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no budget with the ID.
pub fn get_budget(budget_id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = :id;"
        ))?
        .query_row(&[(":id", &budget_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve the budget for a month and year in `owner_scope`, whether it is active or not.
pub fn find_budget(
    month: u8,
    year: i32,
    owner_scope: &str,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget \
            WHERE month = ?1 AND year = ?2 AND owner_scope = ?3;"
        ))?
        .query_row((month, year, owner_scope), map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Retrieve the active budget for a month and year, if there is one.
pub fn find_active_budget(
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    Ok(find_budget(month, year, DEFAULT_OWNER_SCOPE, connection)?
        .filter(|budget| budget.is_active))
}

/// Retrieve one page of the budgets matching `filter`, most recent month first, along with the
/// total number of matching budgets.
pub fn list_budgets(
    filter: BudgetFilter,
    page: PageRequest,
    connection: &Connection,
) -> Result<(Vec<Budget>, u64), Error> {
    let mut conditions = Vec::new();
    let mut params: Vec<i64> = Vec::new();

    if let Some(year) = filter.year {
        params.push(year.into());
        conditions.push(format!("year = ?{}", params.len()));
    }

    if let Some(month) = filter.month {
        params.push(month.into());
        conditions.push(format!("month = ?{}", params.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let total: i64 = connection
        .prepare(&format!("SELECT COUNT(*) FROM budget{where_clause};"))?
        .query_row(params_from_iter(params.iter()), |row| row.get(0))?;

    let limit_index = params.len() + 1;
    params.push(page.limit as i64);
    params.push(page.offset());

    let budgets = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget{where_clause} \
            ORDER BY year DESC, month DESC, id DESC LIMIT ?{limit_index} OFFSET ?{};",
            limit_index + 1
        ))?
        .query_map(params_from_iter(params.iter()), map_row)?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok((budgets, total as u64))
}

/// Apply a partial update to a budget and return the updated budget.
///
/// # Errors
/// Returns [Error::NotFound] if there is no budget with the ID.
pub fn update_budget(
    budget_id: BudgetId,
    update: BudgetUpdate,
    connection: &Connection,
) -> Result<Budget, Error> {
    let mut budget = get_budget(budget_id, connection)?;
    update.apply(&mut budget);
    budget.updated_at = timestamp::now();

    let rows_affected = connection.execute(
        "UPDATE budget SET total_budget = ?1, category_budgets = ?2, is_active = ?3, \
        updated_at = ?4 WHERE id = ?5",
        (
            budget.total_budget.to_string(),
            category_budgets_to_json(&budget.category_budgets)?,
            budget.is_active,
            budget.updated_at.unix_timestamp(),
            budget_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(budget)
}

/// Delete a budget by ID and return the deleted budget.
///
/// # Errors
/// Returns [Error::NotFound] if there is no budget with the ID.
pub fn delete_budget(budget_id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    let budget = get_budget(budget_id, connection)?;

    let rows_affected = connection.execute("DELETE FROM budget WHERE id = ?1", [budget_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(budget)
}

/// Amounts are written as strings so the JSON column keeps full decimal precision.
fn category_budgets_to_json(category_budgets: &CategoryBudgets) -> Result<String, Error> {
    let as_text: std::collections::BTreeMap<&str, String> = category_budgets
        .iter()
        .map(|(category, amount)| (category.as_str(), amount.to_string()))
        .collect();

    serde_json::to_string(&as_text).map_err(|error| Error::JsonColumn(error.to_string()))
}

fn category_budgets_from_column(
    row: &Row,
    index: usize,
) -> Result<CategoryBudgets, rusqlite::Error> {
    let text: String = row.get(index)?;
    let conversion_error = |error: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, error)
    };

    let as_text: std::collections::BTreeMap<String, String> =
        serde_json::from_str(&text).map_err(|error| conversion_error(Box::new(error)))?;

    as_text
        .into_iter()
        .map(|(category, amount)| {
            Decimal::from_str(&amount)
                .map(|amount| (category, amount))
                .map_err(|error| conversion_error(Box::new(error)))
        })
        .collect()
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        month: row.get(1)?,
        year: row.get(2)?,
        total_budget: decimal_from_column(row, 3)?,
        category_budgets: category_budgets_from_column(row, 4)?,
        is_active: row.get(5)?,
        owner_scope: row.get(6)?,
        created_at: timestamp_from_column(row, 7)?,
        updated_at: timestamp_from_column(row, 8)?,
    })
}

#[cfg(test)]
mod budget_query_tests {
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        budget::{
            BudgetFilter, BudgetUpdate, CategoryBudgets, NewBudget, create_budget, delete_budget,
            find_active_budget, get_budget, list_budgets, update_budget,
        },
        pagination::PageRequest,
        test_utils::get_test_db_connection,
    };

    fn new_budget(month: i64, year: i64) -> NewBudget {
        NewBudget::new(
            month,
            year,
            dec!(2000),
            CategoryBudgets::from([
                ("Seeds".to_owned(), dec!(800.25)),
                ("Labor".to_owned(), dec!(0)),
            ]),
        )
        .unwrap()
    }

    #[test]
    fn create_budget_succeeds() {
        let connection = get_test_db_connection();

        let budget = create_budget(new_budget(3, 2024), &connection).unwrap();

        assert!(budget.id > 0);
        assert!(budget.is_active);
        assert_eq!(get_budget(budget.id, &connection), Ok(budget));
    }

    #[test]
    fn category_budgets_keep_full_precision() {
        let connection = get_test_db_connection();
        let budget = create_budget(new_budget(3, 2024), &connection).unwrap();

        let stored = get_budget(budget.id, &connection).unwrap();

        assert_eq!(stored.category_budgets.get("Seeds"), Some(&dec!(800.25)));
        assert_eq!(stored.category_budgets.get("Labor"), Some(&dec!(0)));
    }

    #[test]
    fn second_budget_for_same_month_is_a_conflict() {
        let connection = get_test_db_connection();
        let first = create_budget(new_budget(3, 2024), &connection).unwrap();

        let second = create_budget(new_budget(3, 2024), &connection);

        assert_eq!(second, Err(Error::DuplicateBudget(Box::new(first))));
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM budget", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn same_month_in_another_year_is_allowed() {
        let connection = get_test_db_connection();
        create_budget(new_budget(3, 2024), &connection).unwrap();

        assert!(create_budget(new_budget(3, 2025), &connection).is_ok());
    }

    #[test]
    fn find_active_budget_ignores_inactive_budgets() {
        let connection = get_test_db_connection();
        let budget = create_budget(new_budget(3, 2024), &connection).unwrap();
        assert_eq!(
            find_active_budget(3, 2024, &connection),
            Ok(Some(budget.clone()))
        );

        update_budget(
            budget.id,
            BudgetUpdate {
                is_active: Some(false),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(find_active_budget(3, 2024, &connection), Ok(None));
    }

    #[test]
    fn find_active_budget_returns_none_for_other_months() {
        let connection = get_test_db_connection();
        create_budget(new_budget(3, 2024), &connection).unwrap();

        assert_eq!(find_active_budget(4, 2024, &connection), Ok(None));
    }

    #[test]
    fn list_budgets_orders_most_recent_first() {
        let connection = get_test_db_connection();
        for (month, year) in [(12, 2023), (2, 2024), (1, 2024), (11, 2023)] {
            create_budget(new_budget(month, year), &connection).unwrap();
        }

        let (budgets, total) = list_budgets(
            BudgetFilter::default(),
            PageRequest { page: 1, limit: 10 },
            &connection,
        )
        .unwrap();

        let months: Vec<_> = budgets
            .iter()
            .map(|budget| (budget.month, budget.year))
            .collect();
        assert_eq!(total, 4);
        assert_eq!(months, [(2, 2024), (1, 2024), (12, 2023), (11, 2023)]);
    }

    #[test]
    fn list_budgets_filters_by_year_and_month() {
        let connection = get_test_db_connection();
        for (month, year) in [(3, 2023), (3, 2024), (4, 2024)] {
            create_budget(new_budget(month, year), &connection).unwrap();
        }

        let (by_year, by_year_total) = list_budgets(
            BudgetFilter {
                year: Some(2024),
                month: None,
            },
            PageRequest { page: 1, limit: 1 },
            &connection,
        )
        .unwrap();
        let (_, by_month_total) = list_budgets(
            BudgetFilter {
                year: None,
                month: Some(3),
            },
            PageRequest { page: 1, limit: 10 },
            &connection,
        )
        .unwrap();

        assert_eq!(by_year_total, 2);
        assert_eq!(by_year.len(), 1);
        assert_eq!(by_year[0].month, 4);
        assert_eq!(by_month_total, 2);
    }

    #[test]
    fn update_budget_replaces_category_budgets() {
        let connection = get_test_db_connection();
        let budget = create_budget(new_budget(3, 2024), &connection).unwrap();

        let updated = update_budget(
            budget.id,
            BudgetUpdate {
                total_budget: Some(dec!(2500)),
                category_budgets: Some(CategoryBudgets::from([(
                    "Equipment".to_owned(),
                    dec!(1000),
                )])),
                is_active: None,
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.total_budget, dec!(2500));
        assert_eq!(updated.category_budgets.len(), 1);
        assert!(updated.is_active);
        assert_eq!(get_budget(budget.id, &connection), Ok(updated));
    }

    #[test]
    fn update_missing_budget_is_not_found() {
        let connection = get_test_db_connection();

        let got = update_budget(
            42,
            BudgetUpdate {
                is_active: Some(true),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(got, Err(Error::NotFound));
    }

    #[test]
    fn delete_budget_returns_deleted_budget() {
        let connection = get_test_db_connection();
        let budget = create_budget(new_budget(3, 2024), &connection).unwrap();

        assert_eq!(delete_budget(budget.id, &connection), Ok(budget.clone()));
        assert_eq!(get_budget(budget.id, &connection), Err(Error::NotFound));
        assert_eq!(delete_budget(budget.id, &connection), Err(Error::NotFound));
    }
}
