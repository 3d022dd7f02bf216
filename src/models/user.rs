//! Authenticated user model.

use serde::{Deserialize, Serialize};

use super::UserId;

/// Identity reported by the auth service for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier; scopes every collection.
    pub uid: UserId,
    /// Email address used to sign in.
    pub email: String,
}

impl User {
    /// Creates a user identity.
    #[inline]
    #[must_use]
    pub fn new<T: Into<String>>(uid: UserId, email: T) -> Self {
        Self {
            uid,
            email: email.into(),
        }
    }
}
