//! Firestore REST document encoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::collections::HashMap;

use crate::models::{CatalogItem, DownloadLink, ItemId, NewCatalogItem, Quality};

pub const CREATED_AT: &str = "createdAt";

/// A typed Firestore value, e.g. `{"stringValue": "x"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

/// One element of a `runQuery` response stream. Rows that only carry a
/// `readTime` have no document.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRow {
    pub document: Option<Document>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}': {reason}")]
pub struct DecodeError {
    pub field: String,
    pub reason: String,
}

fn decode_error(field: &str, reason: impl Into<String>) -> DecodeError {
    DecodeError {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Document id is the last segment of the resource name.
pub fn document_id(name: &str) -> ItemId {
    ItemId::new(name.rsplit('/').next().unwrap_or(name))
}

fn string_field(fields: &HashMap<String, Value>, key: &str) -> Result<String, DecodeError> {
    match fields.get(key) {
        None | Some(Value::NullValue(())) => Ok(String::new()),
        Some(Value::StringValue(s)) => Ok(s.clone()),
        Some(other) => Err(decode_error(key, format!("expected string, got {:?}", other))),
    }
}

fn decode_link(value: &Value) -> Result<DownloadLink, DecodeError> {
    let Value::MapValue(map) = value else {
        return Err(decode_error("links", "expected map entries"));
    };
    let quality = string_field(&map.fields, "quality")?;
    let quality: Quality = quality
        .parse()
        .map_err(|e: crate::models::UnknownQuality| decode_error("links.quality", e.to_string()))?;
    Ok(DownloadLink {
        quality,
        size: string_field(&map.fields, "size")?,
        url: string_field(&map.fields, "url")?,
    })
}

pub fn decode_item(doc: &Document) -> Result<CatalogItem, DecodeError> {
    let created_at = match doc.fields.get(CREATED_AT) {
        None | Some(Value::NullValue(())) => None,
        Some(Value::TimestampValue(ts)) => Some(*ts),
        Some(other) => {
            return Err(decode_error(
                CREATED_AT,
                format!("expected timestamp, got {:?}", other),
            ));
        }
    };

    let links = match doc.fields.get("links") {
        None | Some(Value::NullValue(())) => Vec::new(),
        Some(Value::ArrayValue(array)) => array
            .values
            .iter()
            .map(decode_link)
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(decode_error("links", format!("expected array, got {:?}", other)));
        }
    };

    Ok(CatalogItem {
        id: document_id(&doc.name),
        title: string_field(&doc.fields, "title")?,
        description: string_field(&doc.fields, "description")?,
        thumbnail: string_field(&doc.fields, "thumbnail")?,
        created_at,
        links,
    })
}

fn encode_link(link: &DownloadLink) -> Value {
    let fields = HashMap::from([
        (
            "quality".to_string(),
            Value::StringValue(link.quality.label().to_string()),
        ),
        ("size".to_string(), Value::StringValue(link.size.clone())),
        ("url".to_string(), Value::StringValue(link.url.clone())),
    ]);
    Value::MapValue(MapValue { fields })
}

/// Fields of a new document. `createdAt` is left to a server transform.
pub fn encode_item(item: &NewCatalogItem) -> HashMap<String, Value> {
    HashMap::from([
        ("title".to_string(), Value::StringValue(item.title.clone())),
        (
            "description".to_string(),
            Value::StringValue(item.description.clone()),
        ),
        (
            "thumbnail".to_string(),
            Value::StringValue(item.thumbnail.clone()),
        ),
        (
            "links".to_string(),
            Value::ArrayValue(ArrayValue {
                values: item.links.iter().map(encode_link).collect(),
            }),
        ),
    ])
}
