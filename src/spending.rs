//! Spending summaries for a calendar month.
//!
//! Summaries are computed from the stored expenses and budget each time they are requested and
//! are never saved.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{Error, budget::Budget, expense::Expense, month::MonthRange};

/// How much of a budget has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetUtilization {
    /// The budget minus the amount spent, negative when over budget.
    pub remaining: Decimal,
    /// The amount spent as a percentage of the budget.
    pub percentage: Decimal,
    /// Whether more than the budget has been spent.
    pub is_over_budget: bool,
}

impl BudgetUtilization {
    /// Compare `total_spent` against `total_budget`.
    ///
    /// A zero budget is 100% used once anything is spent and 0% used otherwise.
    ///
    /// # Errors
    /// Returns [Error::AmountOverflow] if the result cannot be represented.
    pub fn new(total_spent: Decimal, total_budget: Decimal) -> Result<Self, Error> {
        let percentage = if !total_budget.is_zero() {
            total_spent
                .checked_div(total_budget)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or(Error::AmountOverflow)?
        } else if total_spent > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Ok(Self {
            remaining: total_budget
                .checked_sub(total_spent)
                .ok_or(Error::AmountOverflow)?,
            percentage,
            is_over_budget: total_spent > total_budget,
        })
    }
}

/// The spending for a month, optionally compared against the month's budget.
///
/// The budget fields are `None` when there is no budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    /// The sum of all expense amounts in the month.
    pub total_spent: Decimal,
    /// The sum of expense amounts per category. Categories without expenses are left out.
    pub category_spending: BTreeMap<String, Decimal>,
    /// The number of expenses in the month.
    #[serde(skip)]
    pub expense_count: usize,
    /// See [BudgetUtilization::remaining].
    pub remaining: Option<Decimal>,
    /// See [BudgetUtilization::percentage].
    pub percentage: Option<Decimal>,
    /// See [BudgetUtilization::is_over_budget].
    pub is_over_budget: Option<bool>,
}

impl SpendingSummary {
    /// The budget fields of the summary, if it was compared against a budget.
    pub fn utilization(&self) -> Option<BudgetUtilization> {
        Some(BudgetUtilization {
            remaining: self.remaining?,
            percentage: self.percentage?,
            is_over_budget: self.is_over_budget?,
        })
    }
}

/// Summarize the expenses that fall within `month`, including both of its boundaries.
///
/// Expenses outside of `month` are ignored.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the totals cannot be represented.
pub fn summarize(
    month: MonthRange,
    expenses: &[Expense],
    budget: Option<&Budget>,
) -> Result<SpendingSummary, Error> {
    let mut total_spent = Decimal::ZERO;
    let mut category_spending = BTreeMap::new();
    let mut expense_count = 0;

    for expense in expenses.iter().filter(|expense| month.contains(expense.date)) {
        total_spent = checked_add(total_spent, expense.amount)?;

        let category_total = category_spending
            .entry(expense.category.to_string())
            .or_insert(Decimal::ZERO);
        *category_total = checked_add(*category_total, expense.amount)?;

        expense_count += 1;
    }

    let utilization = budget
        .map(|budget| BudgetUtilization::new(total_spent, budget.total_budget))
        .transpose()?;

    Ok(SpendingSummary {
        total_spent,
        category_spending,
        expense_count,
        remaining: utilization.map(|utilization| utilization.remaining),
        percentage: utilization.map(|utilization| utilization.percentage),
        is_over_budget: utilization.map(|utilization| utilization.is_over_budget),
    })
}

fn checked_add(total: Decimal, amount: Decimal) -> Result<Decimal, Error> {
    total.checked_add(amount).ok_or(Error::AmountOverflow)
}

/// The percentage change from the `previous` month's spending to the `current` month's.
///
/// Returns zero when nothing was spent in the previous month.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the change cannot be represented.
pub fn compare_months(current: Decimal, previous: Decimal) -> Result<Decimal, Error> {
    if previous <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    current
        .checked_sub(previous)
        .and_then(|change| change.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(Error::AmountOverflow)
}

/// Round a percentage to two decimal places for display.
pub fn round_percentage(percentage: Decimal) -> Decimal {
    percentage.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
