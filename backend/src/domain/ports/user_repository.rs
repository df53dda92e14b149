//! Port abstraction for the user store.
//!
//! In hexagonal terms this is a *driven* port: handlers and middleware call
//! it without knowing the backing infrastructure, which makes them
//! deterministic to test with in-memory substitutes. Credential hashing
//! happens behind this boundary — plaintexts go in, but hash material never
//! comes out.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Failures raised by user store adapters.
    ///
    /// The first three variants are expected outcomes recovered locally by
    /// callers; the remainder are fatal.
    pub enum UserStoreError {
        /// The email address is already registered to another account.
        DuplicateEmail => "email address is already in use",
        /// No account matches the supplied credentials. Deliberately does not
        /// distinguish an unknown email from a wrong password.
        InvalidCredentials => "email or password is incorrect",
        /// No account exists for the supplied id.
        NoRecord => "no matching user record",
        /// The store could not be reached.
        Connection { message: String } => "user store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "user store query failed: {message}",
        /// The credential hashing primitive failed.
        Hashing { message: String } => "credential hashing failed: {message}",
    }
}

/// Contract for user account storage and credential verification.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create an account, hashing `password` before storage.
    async fn insert(&self, name: &str, email: &str, password: &str)
    -> Result<UserId, UserStoreError>;

    /// Verify a credential pair and return the account id on success.
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, UserStoreError>;

    /// Whether an account exists for `id`.
    async fn exists(&self, id: &UserId) -> Result<bool, UserStoreError>;

    /// Fetch account attributes for `id`.
    async fn get(&self, id: &UserId) -> Result<User, UserStoreError>;

    /// Verify `password` against the stored hash for `id`.
    async fn is_correct_password(&self, id: &UserId, password: &str)
    -> Result<(), UserStoreError>;

    /// Replace the stored hash for `id` with a hash of `new_password`.
    async fn change_password(&self, id: &UserId, new_password: &str)
    -> Result<(), UserStoreError>;
}
