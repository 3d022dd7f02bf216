//! Error types for the budget ledger.

use rust_decimal::Decimal;

use crate::models::{AccountId, TransactionType};
use crate::store::Collection;

/// Convenience alias used throughout the crate.
pub type Result<T, E = BudgetError> = core::result::Result<T, E>;

/// All errors that can occur while working with the ledger.
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    /// Input was rejected before any remote call was made.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The auth service refused or lost the session.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A referenced document does not exist.
    #[error("{collection} document {id} not found")]
    NotFound {
        /// Collection that was searched.
        collection: Collection,
        /// Identifier that was not found.
        id: String,
    },

    /// The document store failed to read or write.
    #[error("document store error: {0}")]
    Store(Box<dyn core::error::Error + Send + Sync>),

    /// A snapshot listener reported a failure.
    #[error("{collection} subscription failed: {message}")]
    Subscription {
        /// Collection whose listener failed.
        collection: Collection,
        /// Failure reported by the store.
        message: String,
    },

    /// An operation needed a signed-in user and there is none.
    #[error("no user is signed in")]
    NotSignedIn,

    /// Another mutation is still being saved.
    #[error("another change is still being saved")]
    Busy,

    /// A configuration value could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An internal lock was poisoned by a panicking thread.
    #[error("internal state lock poisoned: {0}")]
    Poisoned(String),
}

impl BudgetError {
    /// Returns `true` if the session can no longer continue and the user
    /// has to sign in again.
    ///
    /// Every other error leaves the session usable.
    #[inline]
    #[must_use]
    pub const fn requires_reauth(&self) -> bool {
        matches!(self, Self::NotSignedIn | Self::Auth(AuthError::SessionExpired))
    }

    /// Returns `true` for errors raised before any remote call.
    #[inline]
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Reasons an input form is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Amount is zero or negative.
    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Budget limit is zero or negative.
    #[error("budget limit must be greater than zero, got {0}")]
    NonPositiveLimit(Decimal),

    /// No source account was selected.
    #[error("please select an account")]
    MissingAccount,

    /// A transfer has no destination account.
    #[error("please select the account to transfer to")]
    MissingDestination,

    /// A transfer names the same account on both sides.
    #[error("cannot transfer from account {0} to itself")]
    SameAccount(AccountId),

    /// A selected account does not exist.
    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),

    /// The `transfer` category was used on a non-transfer entry.
    #[error("the transfer category cannot be used for an {} entry", .0.as_str())]
    CategoryMismatch(TransactionType),

    /// Account name is blank.
    #[error("account name cannot be empty")]
    EmptyAccountName,
}

/// Failures reported by the auth service, phrased for the end user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Email does not look like an address.
    #[error("The email address is badly formatted.")]
    InvalidEmail,

    /// Password is shorter than the provider accepts.
    #[error("Password should be at least {min_len} characters.")]
    WeakPassword {
        /// Minimum accepted length.
        min_len: usize,
    },

    /// Sign-up with an email that already has an account.
    #[error("The email address is already in use by another account.")]
    EmailAlreadyInUse,

    /// Unknown email or wrong password.
    #[error("The email or password is incorrect.")]
    InvalidCredentials,

    /// The signed-in session was revoked or expired.
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,

    /// Any other provider failure.
    #[error("{0}")]
    Provider(String),
}
