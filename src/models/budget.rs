//! Monthly category budget model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BudgetId, Category};
use crate::error::ValidationError;

/// A monthly spending limit for one category.
///
/// The limit applies to every calendar month. Several budgets for the same
/// category are allowed; each is tracked independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Document identifier.
    pub id: BudgetId,
    /// Category the limit applies to.
    pub category: Category,
    /// Monthly limit (> 0).
    pub limit: Decimal,
    /// Server timestamp of creation.
    pub created_at: DateTime<Utc>,
}

/// Fields submitted when creating a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    /// Category the limit applies to.
    pub category: Category,
    /// Monthly limit.
    pub limit: Decimal,
}

impl NewBudget {
    /// Creates a new-budget request.
    #[inline]
    #[must_use]
    pub const fn new(category: Category, limit: Decimal) -> Self {
        Self { category, limit }
    }

    /// Rejects a non-positive limit.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveLimit`] if `limit <= 0`.
    #[inline]
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.limit <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveLimit(self.limit));
        }
        Ok(self)
    }
}

/// Partial update of a budget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPatch {
    /// New category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// New monthly limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
}

impl BudgetPatch {
    /// Creates an empty patch.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new category.
    #[inline]
    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the new limit.
    #[inline]
    #[must_use]
    pub const fn limit(mut self, limit: Decimal) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rejects a non-positive limit if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveLimit`] for a limit `<= 0`.
    #[inline]
    pub fn validate(self) -> Result<Self, ValidationError> {
        match self.limit {
            Some(limit) if limit <= Decimal::ZERO => Err(ValidationError::NonPositiveLimit(limit)),
            Some(_) | None => Ok(self),
        }
    }

    /// Applies the patch to a budget in place.
    #[inline]
    pub fn apply_to(&self, budget: &mut Budget) {
        if let Some(category) = self.category {
            budget.category = category;
        }
        if let Some(limit) = self.limit {
            budget.limit = limit;
        }
    }
}
