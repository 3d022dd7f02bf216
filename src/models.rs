//! Data models for ledger documents.
//!
//! Strongly-typed representations of accounts, transactions, and budgets,
//! newtype ID wrappers, enumeration types, and calendar month arithmetic.

mod account;
mod budget;
mod enums;
mod ids;
mod month;
mod transaction;
mod user;

pub use account::{Account, AccountPatch, NewAccount};
pub use budget::{Budget, BudgetPatch, NewBudget};
pub use chrono::NaiveDate;
pub use enums::{AccountType, Category, TransactionType};
pub use ids::{AccountId, BudgetId, TransactionId, UserId};
pub use month::YearMonth;
pub use rust_decimal::Decimal;
pub use transaction::{Transaction, TransactionDraft, TransactionFields};
pub use user::User;
