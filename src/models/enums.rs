//! Enumeration types for constrained document values.

use serde::{Deserialize, Serialize};

/// Kind of a money account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
    /// Bank current account.
    Bank,
    /// Physical cash.
    Cash,
    /// Savings account.
    Savings,
    /// Credit card or credit line.
    Credit,
}

impl AccountType {
    /// Returns the wire name of the account type.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Cash => "cash",
            Self::Savings => "savings",
            Self::Credit => "credit",
        }
    }

    /// Returns the display glyph for the account type.
    #[inline]
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Bank => "🏦",
            Self::Cash => "💵",
            Self::Savings => "🏧",
            Self::Credit => "💳",
        }
    }
}

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    /// Money leaving an account.
    Expense,
    /// Money arriving in an account.
    Income,
    /// Money moving between two of the user's accounts.
    Transfer,
}

impl TransactionType {
    /// Returns the wire name of the transaction type.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
        }
    }
}

/// Spending or earning category of a transaction or budget.
///
/// Unknown category names decode to [`Category::Other`] instead of failing,
/// so documents written by newer clients stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Groceries and eating out.
    Food,
    /// Fuel, fares, and vehicle costs.
    Transport,
    /// General shopping.
    Shopping,
    /// Leisure and entertainment.
    Entertainment,
    /// Utility and recurring bills.
    Bills,
    /// Medical and health costs.
    Health,
    /// Courses, books, tuition.
    Education,
    /// Salary income.
    Salary,
    /// Freelance income.
    Freelance,
    /// Investment income.
    Investment,
    /// Reserved for transfers between accounts.
    Transfer,
    /// Fallback for anything else.
    #[serde(other)]
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 12] = [
        Self::Food,
        Self::Transport,
        Self::Shopping,
        Self::Entertainment,
        Self::Bills,
        Self::Health,
        Self::Education,
        Self::Salary,
        Self::Freelance,
        Self::Investment,
        Self::Transfer,
        Self::Other,
    ];

    /// Parses a category name, falling back to [`Category::Other`].
    #[inline]
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(Self::Other)
    }

    /// Returns the wire name of the category.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
            Self::Bills => "bills",
            Self::Health => "health",
            Self::Education => "education",
            Self::Salary => "salary",
            Self::Freelance => "freelance",
            Self::Investment => "investment",
            Self::Transfer => "transfer",
            Self::Other => "other",
        }
    }

    /// Returns the capitalized display label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::Bills => "Bills",
            Self::Health => "Health",
            Self::Education => "Education",
            Self::Salary => "Salary",
            Self::Freelance => "Freelance",
            Self::Investment => "Investment",
            Self::Transfer => "Transfer",
            Self::Other => "Other",
        }
    }

    /// Returns the display glyph for the category.
    #[inline]
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Food => "🍔",
            Self::Transport => "🚗",
            Self::Shopping => "🛍️",
            Self::Entertainment => "🎬",
            Self::Bills => "📄",
            Self::Health => "💊",
            Self::Education => "📚",
            Self::Salary => "💰",
            Self::Freelance => "💼",
            Self::Investment => "📈",
            Self::Transfer => "🔄",
            Self::Other => "📦",
        }
    }
}

impl From<&str> for Category {
    #[inline]
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl core::fmt::Display for Category {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_wire_names() {
        let variants = [
            (AccountType::Bank, r#""bank""#),
            (AccountType::Cash, r#""cash""#),
            (AccountType::Savings, r#""savings""#),
            (AccountType::Credit, r#""credit""#),
        ];
        for (variant, expected_json) in variants {
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, expected_json);
            assert_eq!(json.trim_matches('"'), variant.as_str());
        }
    }

    #[test]
    fn invalid_account_type_fails() {
        let result = serde_json::from_str::<AccountType>(r#""brokerage""#);
        assert!(result.is_err());
    }

    #[test]
    fn transaction_type_wire_names() {
        let deserialized: TransactionType = serde_json::from_str(r#""transfer""#).unwrap();
        assert_eq!(deserialized, TransactionType::Transfer);
        assert_eq!(TransactionType::Expense.as_str(), "expense");
    }

    #[test]
    fn unknown_category_decodes_to_other() {
        let category: Category = serde_json::from_str(r#""gardening""#).unwrap();
        assert_eq!(category, Category::Other);
        assert_eq!(Category::parse("Gardening"), Category::Other);
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(Category::parse(" FOOD "), Category::Food);
        assert_eq!(Category::from("salary"), Category::Salary);
    }

    #[test]
    fn every_category_roundtrips_through_its_name() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), category);
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }

    #[test]
    fn fallback_glyphs() {
        assert_eq!(Category::Other.glyph(), "📦");
        assert_eq!(Category::parse("unknown").glyph(), "📦");
        assert_eq!(AccountType::Bank.glyph(), "🏦");
    }
}
