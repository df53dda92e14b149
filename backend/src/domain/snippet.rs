//! Snippet content types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable snippet identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(Uuid);

impl SnippetId {
    /// Generate a new random [`SnippetId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    /// Storage-assigned unique identifier.
    pub id: SnippetId,
    /// Snippet title, at most 100 characters.
    pub title: String,
    /// Snippet body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp derived from the submitted lifetime.
    pub expires_at: DateTime<Utc>,
}

/// A validated submission not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetDraft {
    /// Snippet title.
    pub title: String,
    /// Snippet body.
    pub content: String,
    /// Lifetime in days; one of 1, 7 or 365.
    pub expires_days: u32,
}
