use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque document identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "4K")]
    UltraHd,
    #[default]
    #[serde(rename = "1080p")]
    FullHd,
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "480p")]
    Sd,
    #[serde(rename = "360p")]
    Low,
}

impl Quality {
    pub const ALL: [Quality; 5] = [
        Quality::UltraHd,
        Quality::FullHd,
        Quality::Hd,
        Quality::Sd,
        Quality::Low,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Quality::UltraHd => "4K",
            Quality::FullHd => "1080p",
            Quality::Hd => "720p",
            Quality::Sd => "480p",
            Quality::Low => "360p",
        }
    }

    /// 4K and 1080p get the big-screen marker in the detail overlay.
    pub fn is_high_definition(self) -> bool {
        matches!(self, Quality::UltraHd | Quality::FullHd)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown quality '{0}' (expected one of 4K, 1080p, 720p, 480p, 360p)")]
pub struct UnknownQuality(pub String);

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Quality::ALL
            .into_iter()
            .find(|q| q.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownQuality(s.to_string()))
    }
}

/// One quality-specific download of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub quality: Quality,
    pub size: String,
    pub url: String,
}

impl DownloadLink {
    /// File name used when the link is saved locally: the last URL path
    /// segment, falling back to the title and quality.
    pub fn file_name(&self, title: &str) -> String {
        let without_query = self.url.split(['?', '#']).next().unwrap_or_default();
        let without_scheme = without_query
            .split_once("://")
            .map_or(without_query, |(_, rest)| rest);
        let path = without_scheme.split_once('/').map(|(_, path)| path);
        match path.and_then(|p| p.rsplit('/').next()) {
            Some(last) if !matches!(last, "" | "." | "..") => last.to_string(),
            _ => {
                let stem: String = title
                    .chars()
                    .map(|c| if c.is_alphanumeric() { c } else { '_' })
                    .collect();
                format!("{}_{}.mp4", stem, self.quality.label())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    /// Absent while the server timestamp is still pending.
    pub created_at: Option<DateTime<Utc>>,
    pub links: Vec<DownloadLink>,
}

impl CatalogItem {
    /// Case-insensitive substring match on title or description.
    pub fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

/// Payload for `CatalogStore::insert`. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewCatalogItem {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub links: Vec<DownloadLink>,
}
