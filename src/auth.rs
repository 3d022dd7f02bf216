//! Authentication service abstraction.
//!
//! The tracker only needs a handful of operations from an identity
//! provider: email/password sign-in and sign-up, sign-out, and a way to
//! observe the signed-in user. [`AuthService`] captures exactly that, and
//! [`InMemoryAuth`] implements it for tests and demos.

mod memory;

use alloc::sync::Arc;
use core::future::Future;

use secrecy::SecretString;

use crate::error::AuthError;
use crate::models::User;
use crate::store::Subscription;

pub use memory::InMemoryAuth;

/// Shortest password the providers accept.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Callback receiving the signed-in user, or `None` after sign-out.
pub type AuthListener = Arc<dyn Fn(Option<User>) + Send + Sync>;

/// Identity provider used by the tracker.
pub trait AuthService: core::fmt::Debug + Send + Sync {
    /// Signs in with an existing email/password pair.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] with a user-facing message on failure.
    fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    /// Registers a new email/password pair and signs it in.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] with a user-facing message on failure.
    fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    /// Ends the current session. Signing out twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the provider fails.
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Returns the signed-in user, if any.
    fn current_user(&self) -> Option<User>;

    /// Checks why there is or is not a session.
    ///
    /// Returns the signed-in user, or `Ok(None)` after an ordinary sign-out
    /// or before any sign-in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] if the provider revoked the
    /// session since the last sign-in.
    fn check_session(&self) -> Result<Option<User>, AuthError>;

    /// Registers a listener for sign-in state.
    ///
    /// The listener fires immediately with the current state and then after
    /// every change.
    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription;
}

/// Checks the minimal shape of an email address: `local@domain.tld`.
pub(crate) fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_plausible_email("ana@example.com"));
        assert!(is_plausible_email("a.b+c@mail.example.org"));
        assert!(!is_plausible_email("ana"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("ana@example"));
        assert!(!is_plausible_email("ana@.com"));
        assert!(!is_plausible_email("ana@@example.com"));
        assert!(!is_plausible_email("an a@example.com"));
    }
}
