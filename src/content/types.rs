// src/content/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One child of a stream field: a `type` tag plus that block's raw value.
///
/// Values stay as JSON so block types this crate knows nothing about survive
/// a read/write cycle unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChild {
    #[serde(rename = "type")]
    pub block_type: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

pub type StreamValue = Vec<StreamChild>;

/// Stream fields by field name (`content`, `header`, `sidefoot`, …).
pub type StreamFields = BTreeMap<String, StreamValue>;

/// A stored snapshot of a page's stream fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub fields: StreamFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: u64,
    pub page_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub live: bool,
    #[serde(default)]
    pub fields: StreamFields,
    #[serde(default)]
    pub revisions: Vec<Revision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published_at: Option<DateTime<Utc>>,
}

impl Page {
    pub fn new(id: u64, page_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            page_type: page_type.into(),
            title: title.into(),
            slug: None,
            live: false,
            fields: StreamFields::new(),
            revisions: Vec::new(),
            last_published_at: None,
        }
    }

    /// Builder-style helper for seeding a stream field.
    pub fn with_field(mut self, field: impl Into<String>, stream: StreamValue) -> Self {
        self.fields.insert(field.into(), stream);
        self
    }

    pub fn stream(&self, field: &str) -> Option<&StreamValue> {
        self.fields.get(field)
    }

    pub fn stream_mut(&mut self, field: &str) -> Option<&mut StreamValue> {
        self.fields.get_mut(field)
    }

    pub fn latest_revision(&self) -> Option<&Revision> {
        self.revisions.iter().max_by_key(|r| r.id)
    }

    /// Snapshot the current fields into a new revision and mark the page live.
    pub fn publish_at(&mut self, now: DateTime<Utc>) {
        let id = self.latest_revision().map_or(1, |r| r.id + 1);
        self.revisions.push(Revision {
            id,
            created_at: now,
            fields: self.fields.clone(),
        });
        self.live = true;
        self.last_published_at = Some(now);
    }
}
