//! Document store abstraction for the per-user ledger collections.
//!
//! This module defines the async [`DocumentStore`] trait the ledger writes
//! through, the [`Subscription`] handle returned by snapshot listeners, and
//! an in-memory backend for tests and demos.

mod memory;

use alloc::sync::Arc;
use core::future::Future;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    Account, AccountId, AccountPatch, Budget, BudgetId, BudgetPatch, NewAccount, NewBudget,
    Transaction, TransactionFields, TransactionId, UserId,
};

pub use memory::InMemoryDocumentStore;

/// Per-user collections kept in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    /// Money accounts.
    Accounts,
    /// Ledger transactions.
    Transactions,
    /// Category budgets.
    Budgets,
}

impl Collection {
    /// Returns the collection's path segment.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Transactions => "transactions",
            Self::Budgets => "budgets",
        }
    }
}

impl core::fmt::Display for Collection {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback receiving every snapshot of a subscribed collection, or the
/// error that ended delivery.
pub type SnapshotListener<T> = Arc<dyn Fn(Result<Vec<T>>) + Send + Sync>;

/// Handle to an active listener registration.
///
/// Cancelling (explicitly or by dropping the handle) unregisters the
/// listener; no snapshot is delivered to it after `cancel` returns.
pub struct Subscription {
    /// What the handle listens to, for diagnostics.
    label: String,
    /// Unregisters the listener. `None` once cancelled.
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps an unregister callback in a handle.
    #[inline]
    #[must_use]
    pub fn new<L, F>(label: L, cancel: F) -> Self
    where
        L: Into<String>,
        F: FnOnce() + Send + 'static,
    {
        Self {
            label: label.into(),
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Returns the diagnostic label.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` until the handle has been cancelled.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Unregisters the listener now.
    #[inline]
    pub fn cancel(mut self) {
        self.cancel_in_place();
    }

    /// Runs the unregister callback at most once.
    fn cancel_in_place(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            tracing::trace!(label = %self.label, "cancelling subscription");
            cancel();
        }
    }
}

impl Drop for Subscription {
    #[inline]
    fn drop(&mut self) {
        self.cancel_in_place();
    }
}

impl core::fmt::Debug for Subscription {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Async document store holding each user's `accounts`, `transactions`, and
/// `budgets` collections.
///
/// All methods take `&self`; implementations use interior mutability.
/// Missing documents are reported as [`crate::error::BudgetError::NotFound`].
/// Subscriptions deliver the current snapshot right after registration and
/// again after every committed change to the collection.
pub trait DocumentStore: core::fmt::Debug + Send + Sync {
    // Accounts

    /// Creates an account whose balance starts at `account.opening_balance`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn add_account(
        &self,
        user: &UserId,
        account: NewAccount,
    ) -> impl Future<Output = Result<AccountId>> + Send;

    /// Updates an account's descriptive fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is missing or the write fails.
    fn update_account(
        &self,
        user: &UserId,
        id: &AccountId,
        patch: AccountPatch,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Atomically adds `delta` to an account's balance.
    ///
    /// Concurrent increments never lose each other's effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is missing, the new balance is not
    /// representable, or the write fails. A rejected increment leaves the
    /// balance unchanged.
    fn increment_account_balance(
        &self,
        user: &UserId,
        id: &AccountId,
        delta: Decimal,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Deletes an account. Transactions referencing it are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is missing or the write fails.
    fn delete_account(
        &self,
        user: &UserId,
        id: &AccountId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetches one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_account(
        &self,
        user: &UserId,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<Account>>> + Send;

    /// Lists all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn accounts(&self, user: &UserId) -> impl Future<Output = Result<Vec<Account>>> + Send;

    /// Registers a listener for the user's accounts.
    fn subscribe_accounts(&self, user: &UserId, listener: SnapshotListener<Account>) -> Subscription;

    // Transactions

    /// Writes a new transaction record and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn add_transaction(
        &self,
        user: &UserId,
        fields: TransactionFields,
    ) -> impl Future<Output = Result<TransactionId>> + Send;

    /// Replaces a transaction's fields, keeping its id and creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is missing or the write fails.
    fn update_transaction(
        &self,
        user: &UserId,
        id: &TransactionId,
        fields: TransactionFields,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Deletes a transaction record.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is missing or the write fails.
    fn delete_transaction(
        &self,
        user: &UserId,
        id: &TransactionId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetches one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_transaction(
        &self,
        user: &UserId,
        id: &TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>>> + Send;

    /// Lists all transactions, newest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn transactions(&self, user: &UserId) -> impl Future<Output = Result<Vec<Transaction>>> + Send;

    /// Registers a listener for the user's transactions, newest date first.
    fn subscribe_transactions(
        &self,
        user: &UserId,
        listener: SnapshotListener<Transaction>,
    ) -> Subscription;

    // Budgets

    /// Creates a budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn add_budget(
        &self,
        user: &UserId,
        budget: NewBudget,
    ) -> impl Future<Output = Result<BudgetId>> + Send;

    /// Updates a budget's category or limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the budget is missing or the write fails.
    fn update_budget(
        &self,
        user: &UserId,
        id: &BudgetId,
        patch: BudgetPatch,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Deletes a budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the budget is missing or the write fails.
    fn delete_budget(
        &self,
        user: &UserId,
        id: &BudgetId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetches one budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get_budget(
        &self,
        user: &UserId,
        id: &BudgetId,
    ) -> impl Future<Output = Result<Option<Budget>>> + Send;

    /// Lists all budgets.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn budgets(&self, user: &UserId) -> impl Future<Output = Result<Vec<Budget>>> + Send;

    /// Registers a listener for the user's budgets.
    fn subscribe_budgets(&self, user: &UserId, listener: SnapshotListener<Budget>) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn subscription_cancels_once_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = Subscription::new("test", move || {
            let _previous = counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(subscription.is_active());
        drop(subscription);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_cancel_does_not_run_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = Subscription::new("test", move || {
            let _previous = counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn collection_names() {
        assert_eq!(Collection::Transactions.to_string(), "transactions");
        let json = serde_json::to_string(&Collection::Budgets).unwrap();
        assert_eq!(json, r#""budgets""#);
    }

    #[test]
    fn subscription_debug_shows_label() {
        let subscription = Subscription::new("accounts/u1", || {});
        let rendered = format!("{subscription:?}");
        assert!(rendered.contains("accounts/u1"));
        assert!(rendered.contains("active: true"));
    }
}
