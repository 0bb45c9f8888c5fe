use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use tracing::debug;

use super::CatalogStore;
use crate::error::CatalogError;
use crate::models::{CatalogItem, ItemId, NewCatalogItem};

/// In-process catalog. Creation times come from a logical clock so that
/// insertion order is always reflected in the newest-first listing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    items: Vec<CatalogItem>,
    next_id: u64,
    clock: Option<DateTime<Utc>>,
    unavailable: bool,
}

impl Inner {
    fn tick(&mut self) -> DateTime<Utc> {
        let now = match self.clock {
            Some(last) => (last + Duration::milliseconds(1)).max(Utc::now()),
            None => Utc::now(),
        };
        self.clock = Some(now);
        now
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage; every call fails with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(inner: &Inner) -> Result<(), CatalogError> {
        if inner.unavailable {
            return Err(CatalogError::StoreUnavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let inner = self.lock();
        Self::check(&inner)?;
        let mut items = inner.items.clone();
        // Pending timestamps (None) sort after every dated item.
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn insert(&self, item: NewCatalogItem) -> Result<ItemId, CatalogError> {
        let mut inner = self.lock();
        Self::check(&inner)?;
        inner.next_id += 1;
        let id = ItemId::new(format!("mem-{}", inner.next_id));
        let created_at = inner.tick();
        inner.items.push(CatalogItem {
            id: id.clone(),
            title: item.title,
            description: item.description,
            thumbnail: item.thumbnail,
            created_at: Some(created_at),
            links: item.links,
        });
        debug!(%id, "Inserted into memory store");
        Ok(id)
    }

    async fn remove_by_id(&self, id: &ItemId) -> Result<(), CatalogError> {
        let mut inner = self.lock();
        Self::check(&inner)?;
        let before = inner.items.len();
        inner.items.retain(|item| &item.id != id);
        if inner.items.len() == before {
            return Err(CatalogError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_item(title: &str) -> NewCatalogItem {
        NewCatalogItem {
            title: title.to_string(),
            thumbnail: format!("http://x/{}.jpg", title),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn inserted_item_lists_first() {
        let store = MemoryStore::new();
        store.insert(new_item("a")).await.unwrap();
        let id = store.insert(new_item("b")).await.unwrap();

        let items = store.list_all().await.unwrap();
        assert_eq!(items[0].id, id);
        assert_eq!(items[1].title, "a");
    }

    #[tokio::test]
    async fn second_remove_is_not_found() {
        let store = MemoryStore::new();
        let id = store.insert(new_item("a")).await.unwrap();

        store.remove_by_id(&id).await.unwrap();
        assert!(store.list_all().await.unwrap().iter().all(|i| i.id != id));
        assert_matches!(store.remove_by_id(&id).await, Err(CatalogError::NotFound(missing)) if missing == id);
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert_matches!(store.list_all().await, Err(CatalogError::StoreUnavailable(_)));
        assert_matches!(store.insert(new_item("a")).await, Err(CatalogError::StoreUnavailable(_)));
        assert!(store.is_empty());
    }
}
