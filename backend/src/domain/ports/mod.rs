//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod snippet_repository;
mod user_repository;

pub use snippet_repository::{SnippetRepository, SnippetStoreError};
pub use user_repository::{UserRepository, UserStoreError};
