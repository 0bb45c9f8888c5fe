use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tracing::info;

use super::{Session, SessionHub, SessionProvider};
use crate::error::CatalogError;

/// Credential table kept in memory. Sessions last an hour and are never
/// written anywhere.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: HashMap<String, String>,
    hub: SessionHub,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.accounts.insert(email.into(), password.into());
        self
    }
}

#[async_trait]
impl SessionProvider for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CatalogError> {
        match self.accounts.get(email) {
            Some(expected) if expected == password => {}
            _ => return Err(CatalogError::AuthFailed("INVALID_LOGIN_CREDENTIALS".to_string())),
        }

        let session = Session {
            user_id: format!("local-{}", email),
            email: email.to_string(),
            id_token: format!("local-id-{}", Utc::now().timestamp_millis()),
            refresh_token: String::new(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        info!(%email, "Signed in (memory)");
        self.hub.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) {
        self.hub.publish(None);
    }

    fn hub(&self) -> &SessionHub {
        &self.hub
    }
}
