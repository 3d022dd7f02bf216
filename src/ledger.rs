//! Session-scoped mirror of the signed-in user's collections.
//!
//! [`LedgerStore`] holds the latest snapshot of accounts, transactions, and
//! budgets delivered by the document store's listeners. It never writes
//! through: mutations go to the store, and the cache changes only when the
//! store notifies it.
//!
//! Each [`LedgerStore::attach`] starts a new epoch. Listeners remember the
//! epoch they were registered in, and a snapshot arriving for an older epoch
//! is dropped, so nothing can repopulate the cache after
//! [`LedgerStore::detach`].

use alloc::sync::Arc;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{BudgetError, Result};
use crate::models::{Account, AccountId, Budget, BudgetId, Transaction, TransactionId, User};
use crate::store::{Collection, DocumentStore, SnapshotListener, Subscription};

/// Latest failure reported by one collection's listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFault {
    /// Collection whose listener failed.
    pub collection: Collection,
    /// Error message reported by the store.
    pub message: String,
}

/// Point-in-time copy of the whole cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Signed-in user the cache belongs to.
    pub user: Option<User>,
    /// Cached accounts.
    pub accounts: Vec<Account>,
    /// Cached transactions, newest date first.
    pub transactions: Vec<Transaction>,
    /// Cached budgets.
    pub budgets: Vec<Budget>,
}

/// Cached collections for the signed-in user.
#[derive(Debug, Default)]
pub struct LedgerStore {
    /// Cache contents, shared with listener callbacks.
    state: Arc<Mutex<LedgerState>>,
    /// Active listener handles, cancelled on detach.
    subscriptions: Mutex<Vec<Subscription>>,
}

/// Mutable cache contents.
#[derive(Debug, Default)]
struct LedgerState {
    /// Incremented on every attach and detach.
    epoch: u64,
    /// User the cache is attached to.
    user: Option<User>,
    /// Latest accounts snapshot.
    accounts: Vec<Account>,
    /// Latest transactions snapshot.
    transactions: Vec<Transaction>,
    /// Latest budgets snapshot.
    budgets: Vec<Budget>,
    /// Latest fault per collection.
    faults: Vec<SubscriptionFault>,
}

impl LedgerState {
    /// Replaces the fault recorded for `collection`.
    fn record_fault(&mut self, collection: Collection, message: String) {
        self.faults.retain(|fault| fault.collection != collection);
        self.faults.push(SubscriptionFault {
            collection,
            message,
        });
    }

    /// Clears the recorded fault once a collection delivers again.
    fn clear_fault(&mut self, collection: Collection) {
        self.faults.retain(|fault| fault.collection != collection);
    }
}

impl LedgerStore {
    /// Creates an empty, detached cache.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the cache to `user` and subscribes to their three collections.
    ///
    /// Any previous binding is detached first. The store delivers the
    /// current snapshots during registration, so the cache is populated
    /// when this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if an internal lock is poisoned.
    #[tracing::instrument(skip_all, fields(uid = %user.uid))]
    pub fn attach<S>(&self, store: &S, user: User) -> Result<()>
    where
        S: DocumentStore + ?Sized,
    {
        self.detach()?;
        let epoch = self.with_state(|state| {
            state.epoch += 1;
            state.user = Some(user.clone());
            state.epoch
        })?;
        tracing::debug!(epoch, "attaching ledger");

        let accounts = store.subscribe_accounts(
            &user.uid,
            self.listener(epoch, Collection::Accounts, |state, docs| state.accounts = docs),
        );
        let transactions = store.subscribe_transactions(
            &user.uid,
            self.listener(epoch, Collection::Transactions, |state, docs| {
                state.transactions = docs;
            }),
        );
        let budgets = store.subscribe_budgets(
            &user.uid,
            self.listener(epoch, Collection::Budgets, |state, docs| state.budgets = docs),
        );

        self.subscriptions
            .lock()
            .map_err(|err| lock_error(&err))?
            .extend([accounts, transactions, budgets]);
        Ok(())
    }

    /// Cancels every subscription, then clears the cache.
    ///
    /// Detaching an already detached cache is a no-op apart from bumping
    /// the epoch.
    ///
    /// # Errors
    ///
    /// Returns an error if an internal lock is poisoned.
    #[inline]
    pub fn detach(&self) -> Result<()> {
        let subscriptions =
            core::mem::take(&mut *self.subscriptions.lock().map_err(|err| lock_error(&err))?);
        let cancelled = subscriptions.len();
        for subscription in subscriptions {
            subscription.cancel();
        }
        self.with_state(|state| {
            state.epoch += 1;
            state.user = None;
            state.accounts.clear();
            state.transactions.clear();
            state.budgets.clear();
            state.faults.clear();
        })?;
        if cancelled > 0 {
            tracing::debug!(cancelled, "detached ledger");
        }
        Ok(())
    }

    /// Returns `true` while bound to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn is_attached(&self) -> Result<bool> {
        self.with_state(|state| state.user.is_some())
    }

    /// User the cache is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn user(&self) -> Result<Option<User>> {
        self.with_state(|state| state.user.clone())
    }

    /// User the cache is bound to, or [`BudgetError::NotSignedIn`].
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::NotSignedIn`] when detached, or an error if
    /// the cache lock is poisoned.
    #[inline]
    pub fn require_user(&self) -> Result<User> {
        self.user()?.ok_or(BudgetError::NotSignedIn)
    }

    /// Cached accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn accounts(&self) -> Result<Vec<Account>> {
        self.with_state(|state| state.accounts.clone())
    }

    /// One cached account.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn account(&self, id: &AccountId) -> Result<Option<Account>> {
        self.with_state(|state| state.accounts.iter().find(|account| account.id == *id).cloned())
    }

    /// Cached transactions, newest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        self.with_state(|state| state.transactions.clone())
    }

    /// One cached transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn transaction(&self, id: &TransactionId) -> Result<Option<Transaction>> {
        self.with_state(|state| state.transactions.iter().find(|tx| tx.id == *id).cloned())
    }

    /// Cached budgets.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn budgets(&self) -> Result<Vec<Budget>> {
        self.with_state(|state| state.budgets.clone())
    }

    /// One cached budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn budget(&self, id: &BudgetId) -> Result<Option<Budget>> {
        self.with_state(|state| state.budgets.iter().find(|budget| budget.id == *id).cloned())
    }

    /// Latest unresolved listener failure per collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn faults(&self) -> Result<Vec<SubscriptionFault>> {
        self.with_state(|state| state.faults.clone())
    }

    /// Copies the whole cache under one lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lock is poisoned.
    #[inline]
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        self.with_state(|state| LedgerSnapshot {
            user: state.user.clone(),
            accounts: state.accounts.clone(),
            transactions: state.transactions.clone(),
            budgets: state.budgets.clone(),
        })
    }

    /// Acquires the cache lock and applies a closure.
    fn with_state<R>(&self, f: impl FnOnce(&mut LedgerState) -> R) -> Result<R> {
        let mut state = self.state.lock().map_err(|err| lock_error(&err))?;
        Ok(f(&mut state))
    }

    /// Builds a listener that applies snapshots registered in `epoch`.
    fn listener<T, F>(&self, epoch: u64, collection: Collection, apply: F) -> SnapshotListener<T>
    where
        T: 'static,
        F: Fn(&mut LedgerState, Vec<T>) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(&self.state);
        Arc::new(move |snapshot: Result<Vec<T>>| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.epoch != epoch {
                tracing::warn!(
                    %collection,
                    epoch,
                    current = state.epoch,
                    "ignoring snapshot from a cancelled subscription"
                );
                return;
            }
            match snapshot {
                Ok(docs) => {
                    tracing::debug!(%collection, documents = docs.len(), "snapshot refreshed");
                    state.clear_fault(collection);
                    apply(&mut state, docs);
                }
                Err(err) => {
                    tracing::error!(%collection, error = %err, "subscription failed");
                    state.record_fault(collection, err.to_string());
                }
            }
        })
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &PoisonError<T>) -> BudgetError {
    BudgetError::Poisoned(err.to_string())
}
