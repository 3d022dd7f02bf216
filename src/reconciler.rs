//! Balance reconciliation around transaction writes.
//!
//! Account balances are never written directly. Every transaction maps to
//! one or two signed [`BalanceDelta`]s, and the [`Reconciler`] applies them
//! through the store's atomic increment, in this order:
//!
//! * create: write the record, then apply its deltas;
//! * update: reverse the old deltas, write the new record, apply the new
//!   deltas;
//! * delete: reverse the deltas, then delete the record.
//!
//! A delta aimed at an account that no longer exists is skipped and
//! reported, not treated as a failure. Any other store error aborts the
//! sequence where it happened; nothing is rolled back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BudgetError, Result};
use crate::ledger::LedgerStore;
use crate::models::{
    AccountId, Transaction, TransactionDraft, TransactionFields, TransactionId, TransactionType,
    UserId,
};
use crate::store::{Collection, DocumentStore};

/// Signed balance adjustment for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDelta {
    /// Account whose balance moves.
    pub account: AccountId,
    /// Signed amount added to the balance.
    pub amount: Decimal,
}

impl BalanceDelta {
    /// The delta that undoes this one.
    #[inline]
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            account: self.account.clone(),
            amount: -self.amount,
        }
    }
}

/// Computes the balance effect of a transaction.
///
/// Expense: `-amount` on the source. Income: `+amount` on the source.
/// Transfer: `-amount` on the source and `+amount` on the destination.
///
/// ```rust
/// use nova_budget::models::{Category, NaiveDate, TransactionFields, TransactionType};
/// use nova_budget::reconciler::balance_deltas;
/// use rust_decimal::Decimal;
///
/// let fields = TransactionFields {
///     kind: TransactionType::Transfer,
///     amount: Decimal::from(300),
///     account_id: "a".into(),
///     to_account_id: Some("b".into()),
///     category: Category::Transfer,
///     description: None,
///     date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
/// };
/// let deltas = balance_deltas(&fields);
/// assert_eq!(deltas[0].amount, Decimal::from(-300));
/// assert_eq!(deltas[1].amount, Decimal::from(300));
/// ```
#[inline]
#[must_use]
pub fn balance_deltas(fields: &TransactionFields) -> Vec<BalanceDelta> {
    let source = |amount: Decimal| BalanceDelta {
        account: fields.account_id.clone(),
        amount,
    };
    match fields.kind {
        TransactionType::Expense => vec![source(-fields.amount)],
        TransactionType::Income => vec![source(fields.amount)],
        TransactionType::Transfer => {
            let mut deltas = vec![source(-fields.amount)];
            if let Some(to) = fields.to_account_id.as_ref() {
                deltas.push(BalanceDelta {
                    account: to.clone(),
                    amount: fields.amount,
                });
            }
            deltas
        }
    }
}

/// Outcome of one reconciled mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Transaction that was created, updated, or deleted.
    pub transaction: TransactionId,
    /// Deltas written to the store, in order.
    pub applied: Vec<BalanceDelta>,
    /// Deltas dropped because their account no longer exists.
    pub skipped: Vec<BalanceDelta>,
}

impl ReconcileReport {
    /// Starts an empty report.
    const fn new(transaction: TransactionId) -> Self {
        Self {
            transaction,
            applied: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Returns `true` if every delta was applied.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Sequences transaction writes and balance increments.
///
/// Reads account and transaction state from the [`LedgerStore`] cache and
/// writes only to the [`DocumentStore`].
#[derive(Debug)]
pub struct Reconciler<'session, S: ?Sized> {
    /// Store receiving the writes.
    store: &'session S,
    /// Cache consulted for preconditions.
    ledger: &'session LedgerStore,
}

impl<'session, S> Reconciler<'session, S>
where
    S: DocumentStore + ?Sized,
{
    /// Creates a reconciler over a store and the session cache.
    #[inline]
    #[must_use]
    pub const fn new(store: &'session S, ledger: &'session LedgerStore) -> Self {
        Self { store, ledger }
    }

    /// Records a new transaction and applies its balance effect.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::NotSignedIn`] when no user is attached, a
    /// validation error for a bad draft (before any write), or the store
    /// error that interrupted the sequence.
    #[tracing::instrument(skip_all, fields(kind = draft.kind.as_str()))]
    pub async fn create(&self, draft: TransactionDraft) -> Result<ReconcileReport> {
        let user = self.ledger.require_user()?;
        let fields = draft.validate(&self.ledger.accounts()?)?;
        let deltas = balance_deltas(&fields);

        let id = self.store.add_transaction(&user.uid, fields).await?;
        tracing::debug!(%id, "transaction recorded");

        let mut report = ReconcileReport::new(id);
        self.apply(&user.uid, deltas, &mut report).await?;
        Ok(report)
    }

    /// Replaces a transaction's fields, moving balances from the old
    /// effect to the new one.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::NotFound`] if the transaction is not cached,
    /// a validation error for a bad draft (before any write), or the store
    /// error that interrupted the sequence.
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn update(&self, id: &TransactionId, draft: TransactionDraft) -> Result<ReconcileReport> {
        let user = self.ledger.require_user()?;
        let old = self.cached(id)?;
        let fields = draft.validate(&self.ledger.accounts()?)?;
        let reversal = reversal_of(&old);
        let deltas = balance_deltas(&fields);

        let mut report = ReconcileReport::new(id.clone());
        self.apply(&user.uid, reversal, &mut report).await?;
        self.store.update_transaction(&user.uid, id, fields).await?;
        tracing::debug!("transaction rewritten");
        self.apply(&user.uid, deltas, &mut report).await?;
        Ok(report)
    }

    /// Reverses a transaction's balance effect and deletes it.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::NotFound`] if the transaction is not cached,
    /// or the store error that interrupted the sequence.
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn delete(&self, id: &TransactionId) -> Result<ReconcileReport> {
        let user = self.ledger.require_user()?;
        let old = self.cached(id)?;

        let mut report = ReconcileReport::new(id.clone());
        self.apply(&user.uid, reversal_of(&old), &mut report).await?;
        self.store.delete_transaction(&user.uid, id).await?;
        tracing::debug!("transaction deleted");
        Ok(report)
    }

    /// Looks a transaction up in the cache.
    fn cached(&self, id: &TransactionId) -> Result<Transaction> {
        self.ledger
            .transaction(id)?
            .ok_or_else(|| BudgetError::NotFound {
                collection: Collection::Transactions,
                id: id.to_string(),
            })
    }

    /// Applies deltas one by one, skipping accounts that no longer exist.
    async fn apply(&self, user: &UserId, deltas: Vec<BalanceDelta>, report: &mut ReconcileReport) -> Result<()> {
        for delta in deltas {
            if self.ledger.account(&delta.account)?.is_none() {
                tracing::warn!(
                    account = %delta.account,
                    amount = %delta.amount,
                    "skipping delta: account is not in the ledger"
                );
                report.skipped.push(delta);
                continue;
            }
            match self
                .store
                .increment_account_balance(user, &delta.account, delta.amount)
                .await
            {
                Ok(()) => {
                    tracing::trace!(account = %delta.account, amount = %delta.amount, "delta applied");
                    report.applied.push(delta);
                }
                Err(BudgetError::NotFound { .. }) => {
                    tracing::warn!(
                        account = %delta.account,
                        amount = %delta.amount,
                        "skipping delta: account was deleted"
                    );
                    report.skipped.push(delta);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// Inverse deltas of a stored transaction.
fn reversal_of(transaction: &Transaction) -> Vec<BalanceDelta> {
    balance_deltas(&transaction.fields())
        .iter()
        .map(BalanceDelta::inverse)
        .collect()
}
