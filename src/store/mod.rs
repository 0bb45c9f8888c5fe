//! Catalog persistence.
//!
//! Every list re-reads the whole collection; there is no paging and no
//! local cache.

mod codec;
mod firestore;
mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::models::{CatalogItem, ItemId, NewCatalogItem};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All items, newest `created_at` first.
    async fn list_all(&self) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Persist a new item; the store assigns the id and creation time.
    async fn insert(&self, item: NewCatalogItem) -> Result<ItemId, CatalogError>;

    /// Delete exactly one item. A missing id yields `CatalogError::NotFound`.
    async fn remove_by_id(&self, id: &ItemId) -> Result<(), CatalogError>;
}
