//! In-memory document store for tests and demos.
//!
//! Provides [`InMemoryDocumentStore`], a thread-safe implementation of
//! [`super::DocumentStore`] that mimics a real-time document database:
//! server-assigned ids and timestamps, field-level balance increments, and
//! snapshot listeners notified after every committed write.

use alloc::sync::{Arc, Weak};
use core::future::{self, Future};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use super::{Collection, SnapshotListener, Subscription};
use crate::error::{BudgetError, Result};
use crate::models::{
    Account, AccountId, AccountPatch, Budget, BudgetId, BudgetPatch, NewAccount, NewBudget,
    Transaction, TransactionFields, TransactionId, UserId,
};

/// Thread-safe in-memory document store.
///
/// Cloning the store yields another handle to the same data, so a test can
/// keep a handle for fault injection while the tracker owns another.
///
/// # Notifications
///
/// Listeners are called synchronously on the writing thread, after the
/// write is committed and in commit order. Listeners may read from the
/// store but must not write to it.
///
/// # Fault injection
///
/// [`InMemoryDocumentStore::set_write_failure`] makes every write to a
/// collection fail, [`InMemoryDocumentStore::hold_notifications`] defers
/// snapshot delivery until [`InMemoryDocumentStore::release_notifications`],
/// and [`InMemoryDocumentStore::fail_subscriptions`] pushes an error to a
/// collection's listeners.
///
/// # Example
///
/// ```rust
/// use nova_budget::store::InMemoryDocumentStore;
///
/// let store = InMemoryDocumentStore::new();
/// let handle = store.clone();
/// // hand `store` to a tracker, keep `handle` for inspection
/// # drop(handle);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    /// State shared between clones and subscription handles.
    shared: Arc<Shared>,
}

/// Shared locks.
#[derive(Debug, Default)]
struct Shared {
    /// Documents, listeners, and fault switches.
    state: Mutex<Inner>,
    /// Serializes commit + delivery so listeners see snapshots in order.
    delivery: Mutex<()>,
}

/// Inner mutable state.
#[derive(Default)]
struct Inner {
    /// Documents per user.
    users: HashMap<UserId, UserData>,
    /// Registered listeners per user.
    listeners: HashMap<UserId, UserListeners>,
    /// Next listener registration id.
    next_listener: u64,
    /// Collections whose writes currently fail.
    failing: HashSet<Collection>,
    /// Whether notifications are being deferred.
    held: bool,
    /// Deferred notifications, in commit order.
    pending: Vec<(UserId, Collection)>,
}

impl core::fmt::Debug for Inner {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Inner")
            .field("users", &self.users.len())
            .field("failing", &self.failing)
            .field("held", &self.held)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// One user's collections.
#[derive(Debug, Default)]
struct UserData {
    /// Stored accounts, in creation order.
    accounts: Vec<Account>,
    /// Stored transactions, in creation order.
    transactions: Vec<Transaction>,
    /// Stored budgets, in creation order.
    budgets: Vec<Budget>,
}

/// Registered listener with its registration id.
type Registered<T> = (u64, SnapshotListener<T>);

/// One user's listeners.
#[derive(Default)]
struct UserListeners {
    /// Account listeners.
    accounts: Vec<Registered<Account>>,
    /// Transaction listeners.
    transactions: Vec<Registered<Transaction>>,
    /// Budget listeners.
    budgets: Vec<Registered<Budget>>,
}

/// Per-collection access to documents and listeners.
trait StoredDocument: Clone + Send + Sync + 'static {
    /// Collection the document type lives in.
    const COLLECTION: Collection;

    /// Document key.
    fn key(&self) -> &str;

    /// Borrows the user's documents of this type.
    fn docs(data: &UserData) -> &Vec<Self>;

    /// Mutably borrows the user's documents of this type.
    fn docs_mut(data: &mut UserData) -> &mut Vec<Self>;

    /// Borrows the user's listeners for this collection.
    fn listeners(listeners: &UserListeners) -> &Vec<Registered<Self>>;

    /// Mutably borrows the user's listeners for this collection.
    fn listeners_mut(listeners: &mut UserListeners) -> &mut Vec<Registered<Self>>;

    /// Builds the snapshot delivered to listeners and returned by queries.
    fn snapshot(docs: &[Self]) -> Vec<Self> {
        docs.to_vec()
    }
}

impl StoredDocument for Account {
    const COLLECTION: Collection = Collection::Accounts;

    fn key(&self) -> &str {
        self.id.as_inner()
    }

    fn docs(data: &UserData) -> &Vec<Self> {
        &data.accounts
    }

    fn docs_mut(data: &mut UserData) -> &mut Vec<Self> {
        &mut data.accounts
    }

    fn listeners(listeners: &UserListeners) -> &Vec<Registered<Self>> {
        &listeners.accounts
    }

    fn listeners_mut(listeners: &mut UserListeners) -> &mut Vec<Registered<Self>> {
        &mut listeners.accounts
    }
}

impl StoredDocument for Transaction {
    const COLLECTION: Collection = Collection::Transactions;

    fn key(&self) -> &str {
        self.id.as_inner()
    }

    fn docs(data: &UserData) -> &Vec<Self> {
        &data.transactions
    }

    fn docs_mut(data: &mut UserData) -> &mut Vec<Self> {
        &mut data.transactions
    }

    fn listeners(listeners: &UserListeners) -> &Vec<Registered<Self>> {
        &listeners.transactions
    }

    fn listeners_mut(listeners: &mut UserListeners) -> &mut Vec<Registered<Self>> {
        &mut listeners.transactions
    }

    /// Newest booking date first; same-day entries newest-created first.
    fn snapshot(docs: &[Self]) -> Vec<Self> {
        let mut ordered = docs.to_vec();
        ordered.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        ordered
    }
}

impl StoredDocument for Budget {
    const COLLECTION: Collection = Collection::Budgets;

    fn key(&self) -> &str {
        self.id.as_inner()
    }

    fn docs(data: &UserData) -> &Vec<Self> {
        &data.budgets
    }

    fn docs_mut(data: &mut UserData) -> &mut Vec<Self> {
        &mut data.budgets
    }

    fn listeners(listeners: &UserListeners) -> &Vec<Registered<Self>> {
        &listeners.budgets
    }

    fn listeners_mut(listeners: &mut UserListeners) -> &mut Vec<Registered<Self>> {
        &mut listeners.budgets
    }
}

/// Listeners to call and the snapshot to hand them.
type Delivery<T> = (Vec<SnapshotListener<T>>, Vec<T>);

impl InMemoryDocumentStore {
    /// Creates a new empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write to `collection` fail (or succeed again).
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    #[inline]
    pub fn set_write_failure(&self, collection: Collection, failing: bool) -> Result<()> {
        self.with_state(|inner| {
            if failing {
                let _inserted = inner.failing.insert(collection);
            } else {
                let _removed = inner.failing.remove(&collection);
            }
        })
    }

    /// Defers snapshot delivery until [`Self::release_notifications`].
    ///
    /// Writes still commit immediately; only listeners lag behind, which
    /// mimics a slow real-time channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    #[inline]
    pub fn hold_notifications(&self) -> Result<()> {
        self.with_state(|inner| inner.held = true)
    }

    /// Stops deferring and delivers one fresh snapshot per collection that
    /// changed while notifications were held.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned.
    #[inline]
    pub fn release_notifications(&self) -> Result<()> {
        let pending = self.with_state(|inner| {
            inner.held = false;
            core::mem::take(&mut inner.pending)
        })?;
        let mut seen = HashSet::with_capacity(pending.len());
        for (user, collection) in pending {
            if !seen.insert((user.clone(), collection)) {
                continue;
            }
            match collection {
                Collection::Accounts => self.notify::<Account>(&user)?,
                Collection::Transactions => self.notify::<Transaction>(&user)?,
                Collection::Budgets => self.notify::<Budget>(&user)?,
            }
        }
        Ok(())
    }

    /// Pushes a subscription error to every listener of `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned.
    #[inline]
    pub fn fail_subscriptions(&self, user: &UserId, collection: Collection, message: &str) -> Result<()> {
        match collection {
            Collection::Accounts => self.fail::<Account>(user, message),
            Collection::Transactions => self.fail::<Transaction>(user, message),
            Collection::Budgets => self.fail::<Budget>(user, message),
        }
    }

    /// Number of listeners currently registered for a user's collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    #[inline]
    pub fn listener_count(&self, user: &UserId, collection: Collection) -> Result<usize> {
        self.with_state(|inner| {
            inner.listeners.get(user).map_or(0, |listeners| match collection {
                Collection::Accounts => listeners.accounts.len(),
                Collection::Transactions => listeners.transactions.len(),
                Collection::Budgets => listeners.budgets.len(),
            })
        })
    }

    /// Acquires the state lock and applies a closure.
    fn with_state<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> Result<R> {
        let mut inner = self.shared.state.lock().map_err(|err| lock_error(&err))?;
        Ok(f(&mut inner))
    }

    /// Reads a user's documents of one type.
    fn read<D: StoredDocument, R>(&self, user: &UserId, f: impl FnOnce(&[D]) -> R) -> Result<R> {
        self.with_state(|inner| match inner.users.get(user) {
            Some(data) => f(D::docs(data)),
            None => f(&[]),
        })
    }

    /// Reads one document by key.
    fn read_one<D: StoredDocument>(&self, user: &UserId, key: &str) -> Result<Option<D>> {
        self.read(user, |docs: &[D]| docs.iter().find(|doc| doc.key() == key).cloned())
    }

    /// Commits a write to a user's collection and notifies its listeners.
    fn write<D: StoredDocument, R>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Vec<D>) -> Result<R>,
    ) -> Result<R> {
        let _delivery = self.shared.delivery.lock().map_err(|err| lock_error(&err))?;
        let (result, delivery) = {
            let mut inner = self.shared.state.lock().map_err(|err| lock_error(&err))?;
            if inner.failing.contains(&D::COLLECTION) {
                tracing::debug!(collection = %D::COLLECTION, "rejecting write (injected failure)");
                return Err(BudgetError::Store(
                    format!("writes to {} are unavailable", D::COLLECTION).into(),
                ));
            }
            let data = inner.users.entry(user.clone()).or_default();
            let result = f(D::docs_mut(data))?;
            if inner.held {
                inner.pending.push((user.clone(), D::COLLECTION));
                (result, None)
            } else {
                (result, Some(prepare::<D>(&inner, user)))
            }
        };
        if let Some((listeners, snapshot)) = delivery {
            deliver(listeners, &snapshot);
        }
        Ok(result)
    }

    /// Delivers the current snapshot of a collection to its listeners.
    fn notify<D: StoredDocument>(&self, user: &UserId) -> Result<()> {
        let _delivery = self.shared.delivery.lock().map_err(|err| lock_error(&err))?;
        let (listeners, snapshot) = self.with_state(|inner| prepare::<D>(inner, user))?;
        deliver(listeners, &snapshot);
        Ok(())
    }

    /// Delivers a subscription error to a collection's listeners.
    fn fail<D: StoredDocument>(&self, user: &UserId, message: &str) -> Result<()> {
        let _delivery = self.shared.delivery.lock().map_err(|err| lock_error(&err))?;
        let (listeners, _snapshot) = self.with_state(|inner| prepare::<D>(inner, user))?;
        tracing::debug!(collection = %D::COLLECTION, listeners = listeners.len(), "injecting subscription error");
        for listener in listeners {
            listener(Err(BudgetError::Subscription {
                collection: D::COLLECTION,
                message: message.to_owned(),
            }));
        }
        Ok(())
    }

    /// Registers a listener and hands it the current snapshot.
    fn subscribe<D: StoredDocument>(&self, user: &UserId, listener: SnapshotListener<D>) -> Subscription {
        let label = format!("{user}/{}", D::COLLECTION);
        let registered = self
            .shared
            .delivery
            .lock()
            .map_err(|err| lock_error(&err))
            .and_then(|delivery| {
                let (id, snapshot) = self.with_state(|inner| {
                    let id = inner.next_listener;
                    inner.next_listener += 1;
                    let listeners = inner.listeners.entry(user.clone()).or_default();
                    D::listeners_mut(listeners).push((id, Arc::clone(&listener)));
                    let snapshot = inner
                        .users
                        .get(user)
                        .map(|data| D::snapshot(D::docs(data)))
                        .unwrap_or_default();
                    (id, snapshot)
                })?;
                listener(Ok(snapshot));
                drop(delivery);
                Ok(id)
            });

        let id = match registered {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(label = %label, error = %err, "failed to register listener");
                listener(Err(err));
                return Subscription::new(label, || {});
            }
        };
        tracing::debug!(label = %label, id, "listener registered");

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let owner = user.clone();
        Subscription::new(label, move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut inner = shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(listeners) = inner.listeners.get_mut(&owner) {
                D::listeners_mut(listeners).retain(|registered| registered.0 != id);
            }
        })
    }
}

/// Collects listeners and the snapshot for one collection.
fn prepare<D: StoredDocument>(inner: &Inner, user: &UserId) -> Delivery<D> {
    let listeners = inner
        .listeners
        .get(user)
        .map(|listeners| {
            D::listeners(listeners)
                .iter()
                .map(|registered| Arc::clone(&registered.1))
                .collect()
        })
        .unwrap_or_default();
    let snapshot = inner
        .users
        .get(user)
        .map(|data| D::snapshot(D::docs(data)))
        .unwrap_or_default();
    (listeners, snapshot)
}

/// Calls every listener with its own copy of the snapshot.
fn deliver<D: StoredDocument>(listeners: Vec<SnapshotListener<D>>, snapshot: &[D]) {
    tracing::trace!(
        collection = %D::COLLECTION,
        listeners = listeners.len(),
        documents = snapshot.len(),
        "delivering snapshot"
    );
    for listener in listeners {
        listener(Ok(snapshot.to_vec()));
    }
}

/// Finds a document by key or reports it missing.
fn find_mut<'docs, D: StoredDocument>(docs: &'docs mut [D], key: &str) -> Result<&'docs mut D> {
    docs.iter_mut()
        .find(|doc| doc.key() == key)
        .ok_or_else(|| not_found::<D>(key))
}

/// Removes a document by key or reports it missing.
fn remove<D: StoredDocument>(docs: &mut Vec<D>, key: &str) -> Result<()> {
    let position = docs
        .iter()
        .position(|doc| doc.key() == key)
        .ok_or_else(|| not_found::<D>(key))?;
    let _removed = docs.remove(position);
    Ok(())
}

/// Builds the not-found error for a collection.
fn not_found<D: StoredDocument>(key: &str) -> BudgetError {
    BudgetError::NotFound {
        collection: D::COLLECTION,
        id: key.to_owned(),
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &PoisonError<T>) -> BudgetError {
    BudgetError::Poisoned(err.to_string())
}

impl super::DocumentStore for InMemoryDocumentStore {
    #[inline]
    fn add_account(
        &self,
        user: &UserId,
        account: NewAccount,
    ) -> impl Future<Output = Result<AccountId>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Account>| {
            let id = AccountId::generate();
            docs.push(Account {
                id: id.clone(),
                name: account.name,
                kind: account.kind,
                balance: account.opening_balance,
                created_at: Utc::now(),
            });
            Ok(id)
        }))
    }

    #[inline]
    fn update_account(
        &self,
        user: &UserId,
        id: &AccountId,
        patch: AccountPatch,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Account>| {
            patch.apply_to(find_mut(docs, id.as_inner())?);
            Ok(())
        }))
    }

    #[inline]
    fn increment_account_balance(
        &self,
        user: &UserId,
        id: &AccountId,
        delta: Decimal,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Account>| {
            let account = find_mut(docs, id.as_inner())?;
            account.balance = account.balance.checked_add(delta).ok_or_else(|| {
                BudgetError::Store(format!("balance of account {id} would overflow").into())
            })?;
            Ok(())
        }))
    }

    #[inline]
    fn delete_account(
        &self,
        user: &UserId,
        id: &AccountId,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Account>| remove(docs, id.as_inner())))
    }

    #[inline]
    fn get_account(
        &self,
        user: &UserId,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<Account>>> + Send {
        future::ready(self.read_one(user, id.as_inner()))
    }

    #[inline]
    fn accounts(&self, user: &UserId) -> impl Future<Output = Result<Vec<Account>>> + Send {
        future::ready(self.read(user, Account::snapshot))
    }

    #[inline]
    fn subscribe_accounts(&self, user: &UserId, listener: SnapshotListener<Account>) -> Subscription {
        self.subscribe(user, listener)
    }

    #[inline]
    fn add_transaction(
        &self,
        user: &UserId,
        fields: TransactionFields,
    ) -> impl Future<Output = Result<TransactionId>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Transaction>| {
            let id = TransactionId::generate();
            docs.push(Transaction::from_fields(id.clone(), fields, Utc::now()));
            Ok(id)
        }))
    }

    #[inline]
    fn update_transaction(
        &self,
        user: &UserId,
        id: &TransactionId,
        fields: TransactionFields,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Transaction>| {
            let stored = find_mut(docs, id.as_inner())?;
            *stored = Transaction::from_fields(stored.id.clone(), fields, stored.created_at);
            Ok(())
        }))
    }

    #[inline]
    fn delete_transaction(
        &self,
        user: &UserId,
        id: &TransactionId,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Transaction>| {
            remove(docs, id.as_inner())
        }))
    }

    #[inline]
    fn get_transaction(
        &self,
        user: &UserId,
        id: &TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>>> + Send {
        future::ready(self.read_one(user, id.as_inner()))
    }

    #[inline]
    fn transactions(&self, user: &UserId) -> impl Future<Output = Result<Vec<Transaction>>> + Send {
        future::ready(self.read(user, Transaction::snapshot))
    }

    #[inline]
    fn subscribe_transactions(
        &self,
        user: &UserId,
        listener: SnapshotListener<Transaction>,
    ) -> Subscription {
        self.subscribe(user, listener)
    }

    #[inline]
    fn add_budget(
        &self,
        user: &UserId,
        budget: NewBudget,
    ) -> impl Future<Output = Result<BudgetId>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Budget>| {
            let id = BudgetId::generate();
            docs.push(Budget {
                id: id.clone(),
                category: budget.category,
                limit: budget.limit,
                created_at: Utc::now(),
            });
            Ok(id)
        }))
    }

    #[inline]
    fn update_budget(
        &self,
        user: &UserId,
        id: &BudgetId,
        patch: BudgetPatch,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Budget>| {
            patch.apply_to(find_mut(docs, id.as_inner())?);
            Ok(())
        }))
    }

    #[inline]
    fn delete_budget(
        &self,
        user: &UserId,
        id: &BudgetId,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write(user, |docs: &mut Vec<Budget>| remove(docs, id.as_inner())))
    }

    #[inline]
    fn get_budget(
        &self,
        user: &UserId,
        id: &BudgetId,
    ) -> impl Future<Output = Result<Option<Budget>>> + Send {
        future::ready(self.read_one(user, id.as_inner()))
    }

    #[inline]
    fn budgets(&self, user: &UserId) -> impl Future<Output = Result<Vec<Budget>>> + Send {
        future::ready(self.read(user, Budget::snapshot))
    }

    #[inline]
    fn subscribe_budgets(&self, user: &UserId, listener: SnapshotListener<Budget>) -> Subscription {
        self.subscribe(user, listener)
    }
}
