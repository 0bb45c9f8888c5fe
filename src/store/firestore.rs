use async_trait::async_trait;
use rand::{Rng, distr::Alphanumeric};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::CatalogStore;
use super::codec::{self, CREATED_AT, QueryRow};
use std::sync::Arc;

use crate::auth::SessionProvider;
use crate::config::Config;
use crate::error::CatalogError;
use crate::models::{CatalogItem, ItemId, NewCatalogItem};

const AUTO_ID_LEN: usize = 20;

/// Catalog collection in Cloud Firestore, spoken to over the REST v1 API.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    documents: String,
    collection: String,
    api_key: String,
    auth: Arc<dyn SessionProvider>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl FirestoreStore {
    pub fn new(client: Client, config: &Config, auth: Arc<dyn SessionProvider>) -> Self {
        Self {
            client,
            base_url: config.firestore_url.clone(),
            documents: config.documents_path(),
            collection: config.collection.clone(),
            api_key: config.api_key.clone(),
            auth,
        }
    }

    fn documents_url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base_url, self.documents, suffix)
    }

    fn document_name(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents, self.collection, id)
    }

    /// Adds the API key and, when signed in, the admin's id token.
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.query(&[("key", self.api_key.as_str())]);
        match self.auth.id_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn failure(response: Response) -> (StatusCode, String, String) {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (status, body.error.status, body.error.message),
            Err(_) => (status, String::new(), text),
        }
    }
}

fn auto_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl CatalogStore for FirestoreStore {
    async fn list_all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "orderBy": [{
                    "field": { "fieldPath": CREATED_AT },
                    "direction": "DESCENDING"
                }]
            }
        });

        let url = self.documents_url(":runQuery");
        debug!(%url, "Listing catalog");
        let response = self.authorize(self.client.post(&url)).await.json(&body).send().await?;

        if !response.status().is_success() {
            let (status, code, message) = Self::failure(response).await;
            return Err(CatalogError::StoreUnavailable(format!(
                "runQuery failed with {} {}: {}",
                status, code, message
            )));
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let row: QueryRow = match serde_json::from_value(row) {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable query row");
                    continue;
                }
            };
            let Some(doc) = row.document else {
                continue;
            };
            match codec::decode_item(&doc) {
                Ok(item) => items.push(item),
                Err(e) => warn!(document = %doc.name, error = %e, "Skipping malformed catalog document"),
            }
        }

        debug!(count = items.len(), "Catalog listed");
        Ok(items)
    }

    async fn insert(&self, item: NewCatalogItem) -> Result<ItemId, CatalogError> {
        let id = auto_id();
        let body = json!({
            "writes": [{
                "update": {
                    "name": self.document_name(&id),
                    "fields": codec::encode_item(&item),
                },
                "updateTransforms": [{
                    "fieldPath": CREATED_AT,
                    "setToServerValue": "REQUEST_TIME"
                }],
                "currentDocument": { "exists": false }
            }]
        });

        let url = self.documents_url(":commit");
        let response = self.authorize(self.client.post(&url)).await.json(&body).send().await?;

        if !response.status().is_success() {
            let (status, code, message) = Self::failure(response).await;
            return Err(CatalogError::StoreUnavailable(format!(
                "commit failed with {} {}: {}",
                status, code, message
            )));
        }

        info!(%id, title = %item.title, "Catalog item inserted");
        Ok(ItemId::new(id))
    }

    async fn remove_by_id(&self, id: &ItemId) -> Result<(), CatalogError> {
        let url = self.documents_url(&format!("/{}/{}", self.collection, id));
        let response = self
            .authorize(self.client.delete(&url))
            .await
            .query(&[("currentDocument.exists", "true")])
            .send()
            .await?;

        if response.status().is_success() {
            info!(%id, "Catalog item removed");
            return Ok(());
        }

        let (status, code, message) = Self::failure(response).await;
        if status == StatusCode::NOT_FOUND || code == "NOT_FOUND" || code == "FAILED_PRECONDITION" {
            return Err(CatalogError::NotFound(id.clone()));
        }
        Err(CatalogError::StoreUnavailable(format!(
            "delete failed with {} {}: {}",
            status, code, message
        )))
    }
}
