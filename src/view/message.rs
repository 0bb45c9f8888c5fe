use crate::error::CatalogError;
use crate::models::{CatalogItem, ItemId, NewCatalogItem, Quality};

use super::state::SessionInfo;

/// Draft text fields the dashboard can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
    Thumbnail,
    LinkSize,
    LinkUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Catalog
    Refresh,
    CatalogLoaded(Result<Vec<CatalogItem>, CatalogError>),
    SearchChanged(String),
    Select(ItemId),
    CloseDetail,

    // Session
    ToggleAdmin,
    SessionChanged(Option<SessionInfo>),
    EmailChanged(String),
    PasswordChanged(String),
    SubmitLogin,
    LoginFinished(Result<SessionInfo, CatalogError>),
    SignOut,

    // Upload form
    DraftChanged(DraftField, String),
    LinkQualityChanged(Quality),
    AddLink,
    Publish,
    Published(Result<ItemId, CatalogError>),

    // Delete
    RequestDelete(ItemId),
    ConfirmDelete(bool),
    Deleted(ItemId, Result<(), CatalogError>),

    DismissNotice,
}

/// Work the reducer asks the runtime to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchCatalog,
    SignIn { email: String, password: String },
    SignOut,
    Insert(NewCatalogItem),
    Remove(ItemId),
    Log { level: tracing::Level, message: String },
}
