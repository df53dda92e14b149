//! Domain primitives and ports.
//!
//! Purpose: Define strongly typed domain entities and the contracts the
//! adapters implement. Keep types transport-agnostic; inbound adapters map
//! them to HTTP payloads and status codes.

pub mod error;
pub mod password;
pub mod ports;
pub mod snippet;
pub mod user;
pub mod validator;

pub use self::error::{Error, ErrorCode};
pub use self::password::{CredentialHasher, HashingError, VerifyOutcome};
pub use self::snippet::{Snippet, SnippetDraft, SnippetId};
pub use self::user::{User, UserId, UserIdError};
pub use self::validator::Validator;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;
