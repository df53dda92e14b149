//! PostgreSQL persistence adapters built on Diesel.
//!
//! Row structs in [`models`] are implementation details and never cross the
//! domain boundary; repositories translate between rows and domain entities
//! and map infrastructure failures onto the port error enums.

pub mod pool;
pub(crate) mod models;
pub(crate) mod schema;

mod diesel_snippet_repository;
mod diesel_user_repository;

pub use diesel_snippet_repository::DieselSnippetRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
