use thiserror::Error;

use crate::models::ItemId;

/// Failures surfaced by the catalog store, the session provider and the
/// publish validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Network or backend failure on list, insert or delete.
    #[error("Catalog store unavailable: {0}")]
    StoreUnavailable(String),

    /// Delete target is already gone.
    #[error("Catalog item not found: {0}")]
    NotFound(ItemId),

    /// Bad credentials or auth transport failure.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Missing required draft fields, caught before any network call.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl CatalogError {
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable(err.to_string())
    }

    pub fn auth(err: impl std::fmt::Display) -> Self {
        Self::AuthFailed(err.to_string())
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
