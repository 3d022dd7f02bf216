//! Money account model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AccountId, AccountType};
use crate::error::ValidationError;

/// A user's money account (bank, cash, savings, or credit).
///
/// `balance` changes only through the balance reconciler's field-level
/// increments; nothing else writes it after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Document identifier.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Kind of account.
    #[serde(rename = "type")]
    pub kind: AccountType,
    /// Current balance.
    pub balance: Decimal,
    /// Server timestamp of creation.
    pub created_at: DateTime<Utc>,
}

/// Fields submitted when opening a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Kind of account.
    #[serde(rename = "type")]
    pub kind: AccountType,
    /// Balance the account starts with. May be negative for credit lines.
    pub opening_balance: Decimal,
}

impl NewAccount {
    /// Creates a new-account request.
    #[inline]
    #[must_use]
    pub fn new<T: Into<String>>(name: T, kind: AccountType, opening_balance: Decimal) -> Self {
        Self {
            name: name.into(),
            kind,
            opening_balance,
        }
    }

    /// Trims the name and rejects an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAccountName`] if the name is blank.
    #[inline]
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyAccountName);
        }
        Ok(Self {
            name: name.to_owned(),
            ..self
        })
    }
}

/// Partial update of an account's descriptive fields.
///
/// Balance is not patchable; it moves only through increments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New account kind.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AccountType>,
}

impl AccountPatch {
    /// Creates an empty patch.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new display name.
    #[inline]
    #[must_use]
    pub fn name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the new account kind.
    #[inline]
    #[must_use]
    pub const fn kind(mut self, kind: AccountType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Trims a provided name and rejects a blank one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAccountName`] if a blank name is set.
    #[inline]
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = match self.name {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyAccountName);
                }
                Some(trimmed.to_owned())
            }
            None => None,
        };
        Ok(Self { name, ..self })
    }

    /// Applies the patch to an account in place.
    #[inline]
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(name) = self.name.as_ref() {
            account.name.clone_from(name);
        }
        if let Some(kind) = self.kind {
            account.kind = kind;
        }
    }
}
