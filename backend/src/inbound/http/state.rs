//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::domain::ports::{SnippetRepository, UserRepository};

/// Repository handles shared by all HTTP workers.
///
/// Stored in `web::Data`; cloning is cheap since both fields are `Arc`s.
#[derive(Clone)]
pub struct HttpState {
    /// User account store.
    pub users: Arc<dyn UserRepository>,
    /// Snippet store.
    pub snippets: Arc<dyn SnippetRepository>,
}
