//! Core expense domain types.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::DatabaseId};

/// Database identifier for an expense.
pub type ExpenseId = DatabaseId;

/// A validated, non-empty expense category, e.g. "Seeds & Fertilizers".
///
/// Categories are free-form. The front-end suggests a fixed set, but the API accepts any
/// non-empty label.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Create a category, removing any surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategory] if `name` is empty or only
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategory)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category without validation.
    ///
    /// The caller should ensure that the string is trimmed and not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::new(s)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The largest amount of money accepted for an expense or budget, one trillion.
///
/// Sums of this many expenses stay far inside the range of [Decimal].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Check that an expense amount is greater than zero and at most [MAX_AMOUNT].
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        Err(Error::InvalidAmount)
    } else if amount > MAX_AMOUNT {
        Err(Error::AmountTooLarge)
    } else {
        Ok(amount)
    }
}

/// Money spent on the farm.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// How much was spent, always greater than zero.
    pub amount: Decimal,
    /// What the money was spent on.
    pub category: Category,
    /// When the money was spent.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Free-form notes, empty if none were given.
    pub description: String,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the expense was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A validated expense that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// How much was spent.
    pub amount: Decimal,
    /// What the money was spent on.
    pub category: Category,
    /// When the money was spent.
    pub date: OffsetDateTime,
    /// Free-form notes.
    pub description: String,
}

impl NewExpense {
    /// Validate the fields for a new expense.
    ///
    /// The description is trimmed of surrounding whitespace.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `amount` is not positive or [Error::EmptyCategory] if
    /// `category` is blank.
    pub fn new(
        amount: Decimal,
        category: &str,
        date: OffsetDateTime,
        description: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            amount: validate_amount(amount)?,
            category: Category::new(category)?,
            date,
            description: description.trim().to_owned(),
        })
    }
}

/// The JSON body for creating an expense.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpenseForm {
    pub amount: Decimal,
    pub category: String,
    /// An RFC 3339 timestamp or `YYYY-MM-DD` date, defaults to now.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The JSON body for a partial update of an expense.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpenseUpdateForm {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A validated partial update of an expense. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub amount: Option<Decimal>,
    pub category: Option<Category>,
    pub date: Option<OffsetDateTime>,
    pub description: Option<String>,
}

impl ExpenseUpdate {
    /// Whether the update leaves every field unchanged.
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.description.is_none()
    }

    /// Apply the update to `expense` in place.
    pub fn apply(self, expense: &mut Expense) {
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }

        if let Some(category) = self.category {
            expense.category = category;
        }

        if let Some(date) = self.date {
            expense.date = date;
        }

        if let Some(description) = self.description {
            expense.description = description;
        }
    }
}

/// The criteria for listing expenses. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Case-insensitive text that must appear in the category or the description.
    pub search: Option<String>,
    /// Case-insensitive text that must appear in the category.
    pub category: Option<String>,
    /// The earliest date to include.
    pub start: Option<OffsetDateTime>,
    /// The latest date to include.
    pub end: Option<OffsetDateTime>,
}
