//! In-memory identity provider.

use alloc::sync::{Arc, Weak};
use core::future::{self, Future};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use secrecy::{ExposeSecret as _, SecretString};

use super::{AuthListener, AuthService, MIN_PASSWORD_LEN, is_plausible_email};
use crate::error::AuthError;
use crate::models::{User, UserId};
use crate::store::Subscription;

/// Email/password provider backed by a process-local user table.
///
/// Emails are matched case-insensitively. Listeners are notified on the
/// calling thread after the state change is committed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuth {
    /// State shared between clones and subscription handles.
    shared: Arc<Shared>,
}

/// Shared locks.
#[derive(Debug, Default)]
struct Shared {
    /// Users, session, and listeners.
    state: Mutex<State>,
    /// Serializes state changes with their notifications.
    delivery: Mutex<()>,
}

/// Mutable provider state.
#[derive(Default)]
struct State {
    /// Registered users keyed by lowercase email.
    users: HashMap<String, Credential>,
    /// Signed-in user.
    current: Option<User>,
    /// Set when the provider revoked the session; cleared on sign-in and
    /// sign-out.
    expired: bool,
    /// Registered auth-state listeners.
    listeners: Vec<(u64, AuthListener)>,
    /// Next listener registration id.
    next_listener: u64,
}

impl core::fmt::Debug for State {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("State")
            .field("users", &self.users.len())
            .field("current", &self.current)
            .field("expired", &self.expired)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Stored sign-in credential.
struct Credential {
    /// Identity handed out on sign-in.
    user: User,
    /// Password as registered.
    password: SecretString,
}

impl InMemoryAuth {
    /// Creates a provider with no registered users.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the current session as if the provider had revoked it, and
    /// notifies listeners. Until the next sign-in or sign-out,
    /// [`AuthService::check_session`] reports [`AuthError::SessionExpired`].
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    #[inline]
    pub fn expire_session(&self) -> Result<(), AuthError> {
        tracing::debug!("expiring current session");
        self.transition(|state| {
            state.expired = true;
            Ok(None)
        })
        .map(|_user| ())
    }

    /// Acquires the state lock and applies a closure.
    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> Result<R, AuthError> {
        let mut state = self.shared.state.lock().map_err(|err| lock_error(&err))?;
        Ok(f(&mut state))
    }

    /// Computes the next signed-in user, stores it, and notifies listeners.
    fn transition(
        &self,
        next: impl FnOnce(&mut State) -> Result<Option<User>, AuthError>,
    ) -> Result<Option<User>, AuthError> {
        let _delivery = self.shared.delivery.lock().map_err(|err| lock_error(&err))?;
        let (user, listeners) = {
            let mut state = self.shared.state.lock().map_err(|err| lock_error(&err))?;
            let user = next(&mut state)?;
            state.current.clone_from(&user);
            let listeners: Vec<AuthListener> = state
                .listeners
                .iter()
                .map(|registered| Arc::clone(&registered.1))
                .collect();
            (user, listeners)
        };
        for listener in listeners {
            listener(user.clone());
        }
        Ok(user)
    }

    /// Signs in, or registers first when `register` is set.
    fn authenticate(&self, email: &str, password: &SecretString, register: bool) -> Result<User, AuthError> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        let key = email.to_lowercase();
        let signed_in = self.transition(|state| {
            if register {
                if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
                    return Err(AuthError::WeakPassword {
                        min_len: MIN_PASSWORD_LEN,
                    });
                }
                if state.users.contains_key(&key) {
                    return Err(AuthError::EmailAlreadyInUse);
                }
                let user = User::new(UserId::generate(), email);
                let _previous = state.users.insert(
                    key.clone(),
                    Credential {
                        user: user.clone(),
                        password: SecretString::from(password.expose_secret().to_owned()),
                    },
                );
                tracing::debug!(uid = %user.uid, "registered user");
                state.expired = false;
                return Ok(Some(user));
            }
            let user = state
                .users
                .get(&key)
                .filter(|credential| credential.password.expose_secret() == password.expose_secret())
                .map(|credential| credential.user.clone())
                .ok_or(AuthError::InvalidCredentials)?;
            state.expired = false;
            Ok(Some(user))
        })?;
        signed_in.ok_or_else(|| AuthError::Provider("sign-in produced no user".to_owned()))
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &PoisonError<T>) -> AuthError {
    AuthError::Provider(format!("auth state unavailable: {err}"))
}

impl AuthService for InMemoryAuth {
    #[inline]
    fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, AuthError>> + Send {
        future::ready(self.authenticate(email, password, false))
    }

    #[inline]
    fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, AuthError>> + Send {
        future::ready(self.authenticate(email, password, true))
    }

    #[inline]
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send {
        future::ready(
            self.transition(|state| {
                state.expired = false;
                Ok(None)
            })
            .map(|_user| ()),
        )
    }

    #[inline]
    fn current_user(&self) -> Option<User> {
        self.with_state(|state| state.current.clone()).ok().flatten()
    }

    #[inline]
    fn check_session(&self) -> Result<Option<User>, AuthError> {
        let (current, expired) = self.with_state(|state| (state.current.clone(), state.expired))?;
        if expired {
            return Err(AuthError::SessionExpired);
        }
        Ok(current)
    }

    #[inline]
    fn on_auth_state_changed(&self, listener: AuthListener) -> Subscription {
        let registered = self
            .shared
            .delivery
            .lock()
            .map_err(|err| lock_error(&err))
            .and_then(|delivery| {
                let (id, current) = self.with_state(|state| {
                    let id = state.next_listener;
                    state.next_listener += 1;
                    state.listeners.push((id, Arc::clone(&listener)));
                    (id, state.current.clone())
                })?;
                listener(current);
                drop(delivery);
                Ok(id)
            });

        let id = match registered {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(error = %err, "failed to register auth listener");
                return Subscription::new("auth", || {});
            }
        };

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        Subscription::new("auth", move || {
            if let Some(shared) = weak.upgrade() {
                let mut state = shared.state.lock().unwrap_or_else(PoisonError::into_inner);
                state.listeners.retain(|registered| registered.0 != id);
            }
        })
    }
}
