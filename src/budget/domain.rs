//! Core budget domain types and validation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    expense::MAX_AMOUNT,
    month::month_from_number,
};

/// Database identifier for a budget.
pub type BudgetId = DatabaseId;

/// The owner scope given to every budget until budgets can belong to different farms.
pub const DEFAULT_OWNER_SCOPE: &str = "default";

/// The earliest year a budget can be set for.
pub const MIN_BUDGET_YEAR: i64 = 2020;

/// The latest year a budget can be set for.
pub const MAX_BUDGET_YEAR: i64 = 9999;

/// Allocated amounts keyed by expense category.
pub type CategoryBudgets = BTreeMap<String, Decimal>;

/// How much may be spent in a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The calendar month, 1 for January to 12 for December.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
    /// The total amount that may be spent in the month.
    pub total_budget: Decimal,
    /// How the total is split across categories. May be empty and does not need to add up to the
    /// total.
    pub category_budgets: CategoryBudgets,
    /// Only active budgets are used for the current month.
    pub is_active: bool,
    /// Who the budget belongs to, currently always [DEFAULT_OWNER_SCOPE].
    pub owner_scope: String,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the budget was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A validated budget that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// The calendar month, 1 to 12.
    pub month: u8,
    /// The calendar year, 2020 or later.
    pub year: i32,
    /// The total amount that may be spent, greater than zero.
    pub total_budget: Decimal,
    /// The per-category allocations.
    pub category_budgets: CategoryBudgets,
    /// Who the budget belongs to.
    pub owner_scope: String,
}

impl NewBudget {
    /// Validate the fields for a new budget in the default owner scope.
    ///
    /// # Errors
    /// Returns the error for the first invalid field: [Error::InvalidMonth],
    /// [Error::InvalidYear], [Error::InvalidTotalBudget], [Error::InvalidCategoryBudget] or
    /// [Error::DuplicateCategoryBudget].
    pub fn new(
        month: i64,
        year: i64,
        total_budget: Decimal,
        category_budgets: CategoryBudgets,
    ) -> Result<Self, Error> {
        Ok(Self {
            month: u8::from(month_from_number(month)?),
            year: validate_year(year)?,
            total_budget: validate_total_budget(total_budget)?,
            category_budgets: validate_category_budgets(category_budgets)?,
            owner_scope: DEFAULT_OWNER_SCOPE.to_owned(),
        })
    }
}

/// Check that a budget year is supported.
pub fn validate_year(year: i64) -> Result<i32, Error> {
    if (MIN_BUDGET_YEAR..=MAX_BUDGET_YEAR).contains(&year) {
        // The bounds above fit in an i32.
        Ok(year as i32)
    } else {
        Err(Error::InvalidYear(year))
    }
}

/// Check that a total budget is greater than zero and at most [MAX_AMOUNT].
pub fn validate_total_budget(total_budget: Decimal) -> Result<Decimal, Error> {
    if total_budget <= Decimal::ZERO {
        Err(Error::InvalidTotalBudget)
    } else if total_budget > MAX_AMOUNT {
        Err(Error::AmountTooLarge)
    } else {
        Ok(total_budget)
    }
}

/// Trim the category names and check that each allocation is valid.
///
/// # Errors
/// Returns [Error::InvalidCategoryBudget] for a blank name or a negative amount,
/// [Error::AmountTooLarge] for an amount above [MAX_AMOUNT], or
/// [Error::DuplicateCategoryBudget] if two names are the same once trimmed.
pub fn validate_category_budgets(
    category_budgets: CategoryBudgets,
) -> Result<CategoryBudgets, Error> {
    let mut validated = CategoryBudgets::new();

    for (category, amount) in category_budgets {
        let trimmed = category.trim();

        if trimmed.is_empty() || amount < Decimal::ZERO {
            return Err(Error::InvalidCategoryBudget(category));
        }

        if amount > MAX_AMOUNT {
            return Err(Error::AmountTooLarge);
        }

        if validated.insert(trimmed.to_owned(), amount).is_some() {
            return Err(Error::DuplicateCategoryBudget(trimmed.to_owned()));
        }
    }

    Ok(validated)
}

/// The JSON body for creating a budget.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BudgetForm {
    pub month: i64,
    pub year: i64,
    pub total_budget: Decimal,
    #[serde(default)]
    pub category_budgets: Option<CategoryBudgets>,
}

impl BudgetForm {
    /// Validate the form.
    pub fn into_new_budget(self) -> Result<NewBudget, Error> {
        NewBudget::new(
            self.month,
            self.year,
            self.total_budget,
            self.category_budgets.unwrap_or_default(),
        )
    }
}

/// The JSON body for a partial update of a budget.
///
/// The month and year of a budget cannot be changed, delete it and create a new one instead.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BudgetUpdateForm {
    #[serde(default)]
    pub total_budget: Option<Decimal>,
    #[serde(default)]
    pub category_budgets: Option<CategoryBudgets>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A validated partial update of a budget. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetUpdate {
    pub total_budget: Option<Decimal>,
    pub category_budgets: Option<CategoryBudgets>,
    pub is_active: Option<bool>,
}

impl BudgetUpdate {
    /// Whether the update leaves every field unchanged.
    pub fn is_empty(&self) -> bool {
        self.total_budget.is_none() && self.category_budgets.is_none() && self.is_active.is_none()
    }

    /// Apply the update to `budget` in place.
    pub fn apply(self, budget: &mut Budget) {
        if let Some(total_budget) = self.total_budget {
            budget.total_budget = total_budget;
        }

        if let Some(category_budgets) = self.category_budgets {
            budget.category_budgets = category_budgets;
        }

        if let Some(is_active) = self.is_active {
            budget.is_active = is_active;
        }
    }
}

impl TryFrom<BudgetUpdateForm> for BudgetUpdate {
    type Error = Error;

    fn try_from(form: BudgetUpdateForm) -> Result<Self, Self::Error> {
        let update = BudgetUpdate {
            total_budget: form.total_budget.map(validate_total_budget).transpose()?,
            category_budgets: form
                .category_budgets
                .map(validate_category_budgets)
                .transpose()?,
            is_active: form.is_active,
        };

        if update.is_empty() {
            Err(Error::EmptyUpdate)
        } else {
            Ok(update)
        }
    }
}

/// The criteria for listing budgets. `None` fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetFilter {
    pub year: Option<i32>,
    pub month: Option<u8>,
}
