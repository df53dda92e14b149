//! Port abstraction for snippet storage.

use async_trait::async_trait;

use crate::domain::{Snippet, SnippetDraft, SnippetId};

use super::define_port_error;

define_port_error! {
    /// Failures raised by snippet store adapters.
    pub enum SnippetStoreError {
        /// No snippet exists for the supplied id, or it has expired.
        NoRecord => "no matching snippet record",
        /// The store could not be reached.
        Connection { message: String } => "snippet store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "snippet store query failed: {message}",
    }
}

/// Contract for snippet storage.
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// The most recent unexpired snippets, newest first.
    async fn latest(&self) -> Result<Vec<Snippet>, SnippetStoreError>;

    /// Fetch an unexpired snippet by id.
    async fn get(&self, id: &SnippetId) -> Result<Snippet, SnippetStoreError>;

    /// Persist a validated draft and return its assigned id.
    async fn insert(&self, draft: &SnippetDraft) -> Result<SnippetId, SnippetStoreError>;
}
