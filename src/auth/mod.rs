//! Admin session: sign in, observe, sign out.

mod firebase;
mod hub;
mod memory;
mod persist;

pub use firebase::FirebaseAuth;
pub use hub::{Listener, SessionHub, Subscription};
pub use memory::MemoryAuth;
pub use persist::SessionFile;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CatalogError;

/// Tokens are treated as expired this long before their real expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// An authenticated admin identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Sign in with an email and password. Any failure is `AuthFailed`.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CatalogError>;

    /// Clear the session. Errors are logged, never returned.
    async fn sign_out(&self);

    fn hub(&self) -> &SessionHub;

    /// Register a listener. It is called right away with the current session
    /// and again after every sign-in or sign-out, until the returned
    /// subscription is dropped.
    fn observe(&self, listener: Listener) -> Subscription {
        self.hub().observe(listener)
    }

    fn current(&self) -> Option<Session> {
        self.hub().current()
    }

    /// Bearer token for the signed-in admin, if any. Providers whose tokens
    /// expire renew them here.
    async fn id_token(&self) -> Option<String> {
        self.current().map(|session| session.id_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_includes_skew() {
        let now = Utc::now();
        let session = Session {
            user_id: "u".to_string(),
            email: "admin@example.com".to_string(),
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(session.is_expired(now));

        let fresh = Session {
            expires_at: now + Duration::seconds(3600),
            ..session
        };
        assert!(!fresh.is_expired(now));
        assert!(!format!("{:?}", fresh).contains("refresh\""));
    }
}
