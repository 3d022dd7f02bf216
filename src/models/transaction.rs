//! Transaction model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Account, AccountId, Category, TransactionId, TransactionType};
use crate::error::ValidationError;

/// A recorded ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Document identifier.
    pub id: TransactionId,
    /// Direction of the entry.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount moved (always > 0; the direction comes from `kind`).
    pub amount: Decimal,
    /// Source account (the only account for expense/income).
    pub account_id: AccountId,
    /// Destination account, present only for transfers.
    pub to_account_id: Option<AccountId>,
    /// Category (`transfer` exactly when `kind` is a transfer).
    pub category: Category,
    /// Free-form note.
    #[serde(default)]
    pub description: Option<String>,
    /// User-chosen booking day.
    pub date: NaiveDate,
    /// Server timestamp of creation.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Assembles a stored transaction from validated fields.
    #[inline]
    #[must_use]
    pub fn from_fields(id: TransactionId, fields: TransactionFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: fields.kind,
            amount: fields.amount,
            account_id: fields.account_id,
            to_account_id: fields.to_account_id,
            category: fields.category,
            description: fields.description,
            date: fields.date,
            created_at,
        }
    }

    /// Returns the user-editable fields of this transaction.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            kind: self.kind,
            amount: self.amount,
            account_id: self.account_id.clone(),
            to_account_id: self.to_account_id.clone(),
            category: self.category,
            description: self.description.clone(),
            date: self.date,
        }
    }

    /// Returns `true` if the transaction moves money in or out of `account`.
    #[inline]
    #[must_use]
    pub fn touches(&self, account: &AccountId) -> bool {
        self.account_id == *account || self.to_account_id.as_ref() == Some(account)
    }
}

/// Validated transaction fields, as written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFields {
    /// Direction of the entry.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount moved (> 0).
    pub amount: Decimal,
    /// Source account.
    pub account_id: AccountId,
    /// Destination account for transfers.
    pub to_account_id: Option<AccountId>,
    /// Category.
    pub category: Category,
    /// Free-form note.
    pub description: Option<String>,
    /// Booking day.
    pub date: NaiveDate,
}

/// Unvalidated transaction input, shaped like the entry form.
///
/// Account selections are optional because the form can be submitted with
/// nothing chosen; [`TransactionDraft::validate`] turns that into an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    /// Direction of the entry.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount entered.
    pub amount: Decimal,
    /// Selected source account.
    pub account_id: Option<AccountId>,
    /// Selected destination account (read only for transfers).
    pub to_account_id: Option<AccountId>,
    /// Selected category (ignored for transfers).
    pub category: Category,
    /// Free-form note.
    pub description: Option<String>,
    /// Booking day.
    pub date: NaiveDate,
}

impl TransactionDraft {
    /// Starts an expense draft.
    #[inline]
    #[must_use]
    pub const fn expense(amount: Decimal, account: AccountId, category: Category, date: NaiveDate) -> Self {
        Self {
            kind: TransactionType::Expense,
            amount,
            account_id: Some(account),
            to_account_id: None,
            category,
            description: None,
            date,
        }
    }

    /// Starts an income draft.
    #[inline]
    #[must_use]
    pub const fn income(amount: Decimal, account: AccountId, category: Category, date: NaiveDate) -> Self {
        Self {
            kind: TransactionType::Income,
            amount,
            account_id: Some(account),
            to_account_id: None,
            category,
            description: None,
            date,
        }
    }

    /// Starts a transfer draft from `from` to `to`.
    #[inline]
    #[must_use]
    pub const fn transfer(amount: Decimal, from: AccountId, to: AccountId, date: NaiveDate) -> Self {
        Self {
            kind: TransactionType::Transfer,
            amount,
            account_id: Some(from),
            to_account_id: Some(to),
            category: Category::Transfer,
            description: None,
            date,
        }
    }

    /// Attaches a description.
    #[inline]
    #[must_use]
    pub fn with_description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the draft against the currently known accounts and returns
    /// the normalized fields.
    ///
    /// Transfers always get the `transfer` category; other kinds drop any
    /// destination account. Blank descriptions become `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the amount is not positive, an
    /// account is missing or unknown, a transfer targets its own source,
    /// or a non-transfer uses the `transfer` category.
    #[inline]
    pub fn validate(self, accounts: &[Account]) -> Result<TransactionFields, ValidationError> {
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        let account_id = self.account_id.ok_or(ValidationError::MissingAccount)?;
        ensure_known(accounts, &account_id)?;

        let (to_account_id, category) = match self.kind {
            TransactionType::Transfer => {
                let to = self
                    .to_account_id
                    .ok_or(ValidationError::MissingDestination)?;
                if to == account_id {
                    return Err(ValidationError::SameAccount(to));
                }
                ensure_known(accounts, &to)?;
                (Some(to), Category::Transfer)
            }
            TransactionType::Expense | TransactionType::Income => {
                if self.category == Category::Transfer {
                    return Err(ValidationError::CategoryMismatch(self.kind));
                }
                (None, self.category)
            }
        };

        let description = self
            .description
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        Ok(TransactionFields {
            kind: self.kind,
            amount: self.amount,
            account_id,
            to_account_id,
            category,
            description,
            date: self.date,
        })
    }
}

/// Fails with [`ValidationError::UnknownAccount`] if `id` is not listed.
fn ensure_known(accounts: &[Account], id: &AccountId) -> Result<(), ValidationError> {
    if accounts.iter().any(|account| account.id == *id) {
        Ok(())
    } else {
        Err(ValidationError::UnknownAccount(id.clone()))
    }
}
