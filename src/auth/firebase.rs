use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{Session, SessionFile, SessionHub, SessionProvider};
use crate::config::Config;
use crate::error::CatalogError;

/// Firebase email/password auth over the Identity Toolkit REST API.
pub struct FirebaseAuth {
    client: Client,
    identity_url: String,
    securetoken_url: String,
    api_key: String,
    hub: SessionHub,
    file: SessionFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

fn token_lifetime(expires_in: &str) -> Duration {
    Duration::seconds(expires_in.trim().parse().unwrap_or(3600))
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if !body.error.message.is_empty() => body.error.message,
        _ => format!("HTTP {}", status),
    }
}

impl FirebaseAuth {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            identity_url: config.identity_url.clone(),
            securetoken_url: config.securetoken_url.clone(),
            api_key: config.api_key.clone(),
            hub: SessionHub::new(),
            file: SessionFile::new(&config.session_file),
        }
    }

    /// Pick up the session saved by an earlier run, refreshing its id token
    /// when it has expired. A session that cannot be refreshed is discarded.
    pub async fn restore(&self) {
        let saved = match self.file.load() {
            Ok(Some(session)) => session,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, path = %self.file.path().display(), "Ignoring unreadable session file");
                self.forget();
                return;
            }
        };

        let session = if saved.is_expired(Utc::now()) {
            match self.refresh(&saved).await {
                Ok(session) => {
                    self.persist(&session);
                    session
                }
                Err(e) => {
                    warn!(error = %e, email = %saved.email, "Saved session could not be refreshed");
                    self.forget();
                    return;
                }
            }
        } else {
            saved
        };

        info!(email = %session.email, "Restored admin session");
        self.hub.publish(Some(session));
    }

    async fn refresh(&self, session: &Session) -> Result<Session, CatalogError> {
        let url = format!("{}/token", self.securetoken_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(CatalogError::auth)?;

        if !response.status().is_success() {
            return Err(CatalogError::AuthFailed(error_message(response).await));
        }

        let body: RefreshResponse = response.json().await.map_err(CatalogError::auth)?;
        debug!(user = %body.user_id, "Id token refreshed");
        Ok(Session {
            user_id: body.user_id,
            email: session.email.clone(),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: Utc::now() + token_lifetime(&body.expires_in),
        })
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.file.save(session) {
            warn!(error = %e, "Session will not survive this run");
        }
    }

    fn forget(&self) {
        if let Err(e) = self.file.clear() {
            warn!(error = %e, "Failed to remove saved session");
        }
    }
}

#[async_trait]
impl SessionProvider for FirebaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CatalogError> {
        let url = format!("{}/accounts:signInWithPassword", self.identity_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(CatalogError::auth)?;

        if !response.status().is_success() {
            let message = error_message(response).await;
            warn!(%email, reason = %message, "Sign-in rejected");
            return Err(CatalogError::AuthFailed(message));
        }

        let body: SignInResponse = response.json().await.map_err(CatalogError::auth)?;
        let session = Session {
            user_id: body.local_id,
            email: if body.email.is_empty() {
                email.to_string()
            } else {
                body.email
            },
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: Utc::now() + token_lifetime(&body.expires_in),
        };

        info!(email = %session.email, "Signed in");
        self.persist(&session);
        self.hub.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) {
        self.forget();
        self.hub.publish(None);
        info!("Signed out");
    }

    fn hub(&self) -> &SessionHub {
        &self.hub
    }

    async fn id_token(&self) -> Option<String> {
        let session = self.hub.current()?;
        if !session.is_expired(Utc::now()) {
            return Some(session.id_token);
        }

        match self.refresh(&session).await {
            Ok(renewed) => {
                self.persist(&renewed);
                let token = renewed.id_token.clone();
                self.hub.publish(Some(renewed));
                Some(token)
            }
            Err(e) => {
                // The request goes out with the stale token and fails on its own.
                warn!(error = %e, email = %session.email, "Id token could not be refreshed");
                Some(session.id_token)
            }
        }
    }
}
