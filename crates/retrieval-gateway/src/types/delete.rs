//! Delete requests and the single-mode deletion policy

use serde::{Deserialize, Serialize};

use super::filter::DocumentMetadataFilter;
use crate::error::{Error, Result};

/// Delete request as supplied by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeleteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<DocumentMetadataFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_all: Option<bool>,
}

/// Exactly one way of selecting what to delete
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteMode {
    /// Delete these documents and all their chunks
    Ids(Vec<String>),
    /// Delete every chunk matching the filter
    Filter(DocumentMetadataFilter),
    /// Wipe the backend
    All,
}

impl DeleteRequest {
    /// Delete by document IDs
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Delete by metadata filter
    pub fn by_filter(filter: DocumentMetadataFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Default::default()
        }
    }

    /// Delete everything
    pub fn all() -> Self {
        Self {
            delete_all: Some(true),
            ..Default::default()
        }
    }

    /// Resolve the request into a single deletion mode.
    ///
    /// Exactly one of non-empty `ids`, a non-empty `filter` or
    /// `delete_all: true` must be present. Absence of all three is invalid;
    /// delete-all is never inferred.
    pub fn validate(self) -> Result<DeleteMode> {
        let ids = self.ids.filter(|ids| !ids.is_empty());
        let filter = self.filter.filter(|f| !f.is_empty());
        let delete_all = self.delete_all == Some(true);

        let selected = usize::from(ids.is_some()) + usize::from(filter.is_some()) + usize::from(delete_all);
        match (selected, ids, filter) {
            (1, Some(ids), _) => Ok(DeleteMode::Ids(ids)),
            (1, _, Some(filter)) => Ok(DeleteMode::Filter(filter)),
            (1, None, None) => Ok(DeleteMode::All),
            (0, _, _) => Err(Error::InvalidDeleteRequest(
                "One of ids, filter, or delete_all is required".to_string(),
            )),
            _ => Err(Error::InvalidDeleteRequest(
                "Only one of ids, filter, or delete_all may be given".to_string(),
            )),
        }
    }
}
