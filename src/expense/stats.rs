//! Endpoint for the spending statistics of a month.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    budget::{Budget, CategoryBudgets, find_active_budget, validate_year},
    db,
    expense::get_expenses_in_month,
    extract::QueryParams,
    month::{MonthRange, month_from_number},
    spending::{compare_months, round_percentage, summarize},
    timestamp,
    timezone::{LocalTimezone, local_timezone_or_error},
};

/// The state needed for the spending statistics.
#[derive(Debug, Clone)]
pub struct ExpenseStatsState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// The database connection for reading expenses and budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseStatsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Selects the month to report on. Missing parts default to the current month and year.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseStatsQuery {
    pub month: Option<i64>,
    pub year: Option<i64>,
}

impl ExpenseStatsQuery {
    fn month_range(&self, timezone: LocalTimezone) -> Result<MonthRange, Error> {
        let current = MonthRange::containing(timestamp::now(), timezone)?;

        if self.month.is_none() && self.year.is_none() {
            return Ok(current);
        }

        let month = match self.month {
            Some(month) => month_from_number(month)?,
            None => current.month(),
        };
        let year = match self.year {
            Some(year) => validate_year(year)?,
            None => current.year(),
        };

        MonthRange::new(year, month, timezone)
    }
}

/// The budget part of the spending statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStats {
    pub total_budget: Decimal,
    pub remaining: Decimal,
    /// Rounded to two decimal places.
    pub percentage: Decimal,
    pub is_over_budget: bool,
    pub category_budgets: CategoryBudgets,
}

/// Identifies the month that statistics were computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthYear {
    pub month: u8,
    pub year: i32,
}

/// The spending for a month compared against the previous month and the month's budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseStats {
    pub total_this_month: Decimal,
    pub total_last_month: Decimal,
    /// Percentage change from last month, rounded to two decimal places.
    pub month_over_month_change: Decimal,
    pub category_stats: BTreeMap<String, Decimal>,
    pub transaction_count: usize,
    pub budget: Option<BudgetStats>,
    pub month_year: MonthYear,
}

/// Compute the statistics for `month` from its expenses, the previous month's expenses and the
/// month's active budget.
fn compute_stats(month: MonthRange, connection: &Connection) -> Result<ExpenseStats, Error> {
    let month_number = u8::from(month.month());
    let budget: Option<Budget> = find_active_budget(month_number, month.year(), connection)?;

    let this_month = summarize(
        month,
        &get_expenses_in_month(month, connection)?,
        budget.as_ref(),
    )?;

    let previous_month = month.previous()?;
    let last_month = summarize(
        previous_month,
        &get_expenses_in_month(previous_month, connection)?,
        None,
    )?;

    let budget_stats = budget.zip(this_month.utilization()).map(|(budget, utilization)| {
        BudgetStats {
            total_budget: budget.total_budget,
            remaining: utilization.remaining,
            percentage: round_percentage(utilization.percentage),
            is_over_budget: utilization.is_over_budget,
            category_budgets: budget.category_budgets,
        }
    });

    Ok(ExpenseStats {
        total_this_month: this_month.total_spent,
        total_last_month: last_month.total_spent,
        month_over_month_change: round_percentage(compare_months(
            this_month.total_spent,
            last_month.total_spent,
        )?),
        category_stats: this_month.category_spending,
        transaction_count: this_month.expense_count,
        budget: budget_stats,
        month_year: MonthYear {
            month: month_number,
            year: month.year(),
        },
    })
}

/// A route handler for the spending statistics of the current month, or the month given in the
/// query string.
pub async fn get_expense_stats_endpoint(
    State(state): State<ExpenseStatsState>,
    QueryParams(query): QueryParams<ExpenseStatsQuery>,
) -> Result<impl IntoResponse, Error> {
    let timezone = local_timezone_or_error(&state.local_timezone)?;
    let month = query.month_range(timezone)?;

    let connection = db::lock(&state.db_connection)?;
    let stats = compute_stats(month, &connection)?;

    Ok(Json(stats))
}

#[cfg(test)]
mod expense_stats_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::{Month, macros::datetime};

    use crate::{
        Error,
        budget::{CategoryBudgets, NewBudget, create_budget},
        expense::{NewExpense, create_expense},
        extract::QueryParams,
        internal_server_error::InternalErrorDetail,
        month::MonthRange,
        timezone::LocalTimezone,
        test_utils::{assert_json_error, assert_status_ok, get_test_db_connection, parse_json_body},
    };

    use super::{
        ExpenseStatsQuery, ExpenseStatsState, MonthYear, compute_stats, get_expense_stats_endpoint,
    };

    fn add_expense(
        amount: rust_decimal::Decimal,
        category: &str,
        date: time::OffsetDateTime,
        connection: &Connection,
    ) {
        create_expense(NewExpense::new(amount, category, date, "").unwrap(), connection).unwrap();
    }

    fn march_2024() -> MonthRange {
        MonthRange::new(2024, Month::March, LocalTimezone::UTC).unwrap()
    }

    #[test]
    fn over_budget_month_with_previous_month() {
        let connection = get_test_db_connection();
        add_expense(dec!(1500), "Seeds", datetime!(2024-03-15 00:00 UTC), &connection);
        add_expense(dec!(850), "Equipment", datetime!(2024-03-14 00:00 UTC), &connection);
        add_expense(dec!(1000), "Labor", datetime!(2024-02-10 00:00 UTC), &connection);
        add_expense(dec!(99), "Labor", datetime!(2024-04-01 00:00 UTC), &connection);
        create_budget(
            NewBudget::new(
                3,
                2024,
                dec!(2000),
                CategoryBudgets::from([("Seeds".to_owned(), dec!(1200))]),
            )
            .unwrap(),
            &connection,
        )
        .unwrap();

        let stats = compute_stats(march_2024(), &connection).unwrap();

        assert_eq!(stats.total_this_month, dec!(2350));
        assert_eq!(stats.total_last_month, dec!(1000));
        assert_eq!(stats.month_over_month_change, dec!(135));
        assert_eq!(stats.transaction_count, 2);
        assert_eq!(stats.category_stats["Seeds"], dec!(1500));
        assert_eq!(stats.month_year, MonthYear { month: 3, year: 2024 });

        let budget = stats.budget.unwrap();
        assert_eq!(budget.total_budget, dec!(2000));
        assert_eq!(budget.remaining, dec!(-350));
        assert_eq!(budget.percentage, dec!(117.5));
        assert!(budget.is_over_budget);
        assert_eq!(budget.category_budgets["Seeds"], dec!(1200));
    }

    #[test]
    fn no_previous_spending_is_no_change() {
        let connection = get_test_db_connection();
        add_expense(dec!(500), "Seeds", datetime!(2024-03-02 00:00 UTC), &connection);

        let stats = compute_stats(march_2024(), &connection).unwrap();

        assert_eq!(stats.total_last_month, dec!(0));
        assert_eq!(stats.month_over_month_change, dec!(0));
        assert_eq!(stats.budget, None);
    }

    #[test]
    fn percentages_are_rounded_to_two_places() {
        let connection = get_test_db_connection();
        add_expense(dec!(100), "Seeds", datetime!(2024-03-02 00:00 UTC), &connection);
        add_expense(dec!(300), "Seeds", datetime!(2024-02-02 00:00 UTC), &connection);
        create_budget(
            NewBudget::new(3, 2024, dec!(300), CategoryBudgets::new()).unwrap(),
            &connection,
        )
        .unwrap();

        let stats = compute_stats(march_2024(), &connection).unwrap();

        assert_eq!(stats.month_over_month_change, dec!(-66.67));
        assert_eq!(stats.budget.unwrap().percentage, dec!(33.33));
    }

    #[tokio::test]
    async fn endpoint_uses_requested_month() {
        let connection = get_test_db_connection();
        add_expense(dec!(42), "Utilities", datetime!(2023-11-30 23:59:59 UTC), &connection);
        let state = ExpenseStatsState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let query = ExpenseStatsQuery {
            month: Some(11),
            year: Some(2023),
        };

        let response = get_expense_stats_endpoint(State(state), QueryParams(query))
            .await
            .into_response();

        assert_status_ok(&response);
        let body = parse_json_body(response).await;
        assert_eq!(body["totalThisMonth"], 42.0);
        assert_eq!(body["transactionCount"], 1);
        assert_eq!(body["budget"], serde_json::Value::Null);
        assert_eq!(body["monthYear"]["month"], 11);
        assert_eq!(body["monthYear"]["year"], 2023);
    }

    #[tokio::test]
    async fn endpoint_rejects_invalid_month() {
        let state = ExpenseStatsState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
        };
        let query = ExpenseStatsQuery {
            month: Some(13),
            year: None,
        };

        let response = get_expense_stats_endpoint(State(state), QueryParams(query))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json_error(response, &Error::InvalidMonth(13).to_string()).await;
    }

    #[tokio::test]
    async fn totals_too_large_to_add_up_do_not_break_the_database_lock() {
        let connection = get_test_db_connection();
        for day in [10, 11] {
            connection
                .execute(
                    "INSERT INTO expense (amount, category, date, created_at, updated_at) \
                    VALUES (?1, 'Seeds', ?2, ?2, ?2);",
                    (
                        rust_decimal::Decimal::MAX.to_string(),
                        datetime!(2024-03-01 00:00 UTC).unix_timestamp() + day * 86_400,
                    ),
                )
                .unwrap();
        }
        let state = ExpenseStatsState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        for _ in 0..2 {
            let query = ExpenseStatsQuery {
                month: Some(3),
                year: Some(2024),
            };

            let response = get_expense_stats_endpoint(State(state.clone()), QueryParams(query))
                .await
                .into_response();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                response.extensions().get::<InternalErrorDetail>(),
                Some(&InternalErrorDetail(Error::AmountOverflow.to_string()))
            );
        }
        assert!(!state.db_connection.is_poisoned());
    }
}
