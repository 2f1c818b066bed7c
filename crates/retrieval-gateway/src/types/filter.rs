//! Metadata filters for queries and deletes

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::document::{DocumentChunkMetadata, Source};

/// Predicate over chunk metadata. Every set field must match (AND).
///
/// `start_date` and `end_date` bound `created_at` inclusively. A chunk with a
/// missing or unparseable `created_at` never satisfies a date bound.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadataFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl DocumentMetadataFilter {
    /// True when no condition is set
    pub fn is_empty(&self) -> bool {
        self.document_id.is_none()
            && self.source.is_none()
            && self.source_id.is_none()
            && self.author.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Evaluate the filter against a chunk's metadata
    pub fn matches(&self, metadata: &DocumentChunkMetadata) -> bool {
        let doc = &metadata.document;

        if let Some(document_id) = &self.document_id {
            if &metadata.document_id != document_id {
                return false;
            }
        }
        if self.source.is_some() && doc.source != self.source {
            return false;
        }
        if self.source_id.is_some() && doc.source_id != self.source_id {
            return false;
        }
        if self.author.is_some() && doc.author != self.author {
            return false;
        }

        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }

        let Some(created_at) = doc.created_at.as_deref().and_then(parse_timestamp) else {
            return false;
        };
        if let Some(start) = self.start_date.as_deref() {
            match parse_timestamp(start) {
                Some(start) if created_at >= start => {}
                _ => return false,
            }
        }
        if let Some(end) = self.end_date.as_deref() {
            match parse_timestamp(end) {
                Some(end) if created_at <= end => {}
                _ => return false,
            }
        }
        true
    }
}

/// Parse a timestamp string into unix seconds.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DD` (midnight UTC) and bare unix seconds.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }
    value.parse::<i64>().ok()
}
