//! HTTP inbound adapter.
//!
//! Purpose: Map HTTP requests onto domain operations and domain errors onto
//! HTTP responses. Handlers return [`ApiResult`] and rely on the session,
//! identity and anti-forgery layers wired by the server module.

pub mod csrf;
pub mod error;
pub mod health;
pub mod identity;
pub mod require_auth;
pub mod session;
pub mod snippets;
pub mod state;
pub mod users;

#[cfg(test)]
pub(crate) mod test_utils;

pub use crate::domain::ApiResult;
pub use csrf::CsrfGuard;
pub use identity::{CurrentUser, Identity};
pub use require_auth::RequireAuth;
pub use session::SessionContext;
pub use state::HttpState;

use serde::Serialize;

/// Context payload served by GET form endpoints: the session's anti-forgery
/// token (minted on first use) and any pending flash message.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormContext {
    csrf_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    flash: Option<String>,
}

impl FormContext {
    /// Assemble the payload from the request's session.
    pub fn load(session: &SessionContext) -> ApiResult<Self> {
        Ok(Self {
            csrf_token: session.csrf_token()?,
            flash: session.take_flash()?,
        })
    }
}
