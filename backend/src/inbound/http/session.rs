//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations: the authenticated identity, the per-session
//! anti-forgery token, one-shot flash messages and the post-login redirect
//! path. Token rotation on privilege transitions goes through [`renew`]
//! (old token invalidated, data carried over) and must be paired with
//! [`regenerate_csrf_token`] so the anti-forgery secret rotates with it.
//!
//! [`renew`]: SessionContext::renew
//! [`regenerate_csrf_token`]: SessionContext::regenerate_csrf_token

use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const CSRF_TOKEN_KEY: &str = "csrf_token";
pub(crate) const FLASH_KEY: &str = "flash";
pub(crate) const RETURN_PATH_KEY: &str = "redirect_path_after_login";

fn session_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::internal(format!("{context}: {err}"))
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Obtain a wrapper for the session attached to `req`.
    ///
    /// Used by middleware, which work with requests rather than extractors.
    #[must_use]
    pub fn from_parts(req: &HttpRequest) -> Self {
        Self(req.get_session())
    }

    /// Persist the authenticated user's id in the session.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|err| session_error("failed to persist session identity", err))
    }

    /// Remove the authenticated identity, leaving the session anonymous.
    pub fn clear_user(&self) {
        self.0.remove(USER_ID_KEY);
    }

    /// Fetch the current user id from the session, if present.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|err| session_error("failed to read session identity", err))?;
        match raw {
            Some(raw) => match UserId::new(&raw) {
                Ok(id) => Ok(Some(id)),
                Err(err) => {
                    tracing::warn!(error = %err, "invalid user id in session; clearing");
                    self.clear_user();
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Require an authenticated user id.
    ///
    /// Protected routes sit behind the access-control middleware, so this is
    /// a backstop rather than the primary gate.
    pub fn require_user(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Rotate the session token, carrying the session data over.
    ///
    /// Must be called on every privilege transition (login and logout) to
    /// defeat session fixation. Callers pair it with
    /// [`Self::regenerate_csrf_token`].
    pub fn renew(&self) {
        self.0.renew();
    }

    /// The session's anti-forgery token, minting one if absent.
    pub fn csrf_token(&self) -> Result<String, Error> {
        if let Some(token) = self.stored_csrf_token()? {
            return Ok(token);
        }
        self.regenerate_csrf_token()
    }

    /// The stored anti-forgery token without minting a new one.
    pub fn stored_csrf_token(&self) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(CSRF_TOKEN_KEY)
            .map_err(|err| session_error("failed to read csrf token", err))
    }

    /// Replace the anti-forgery token with a freshly minted one.
    pub fn regenerate_csrf_token(&self) -> Result<String, Error> {
        let token = Uuid::new_v4().simple().to_string();
        self.0
            .insert(CSRF_TOKEN_KEY, token.clone())
            .map_err(|err| session_error("failed to store csrf token", err))?;
        Ok(token)
    }

    /// Store a one-shot flash message shown after the next render.
    pub fn set_flash(&self, message: &str) -> Result<(), Error> {
        self.0
            .insert(FLASH_KEY, message)
            .map_err(|err| session_error("failed to store flash message", err))
    }

    /// Read and clear the pending flash message, if any.
    pub fn take_flash(&self) -> Result<Option<String>, Error> {
        self.pop_string(FLASH_KEY)
    }

    /// Remember the path an unauthenticated visitor asked for.
    pub fn stash_return_path(&self, path: &str) -> Result<(), Error> {
        self.0
            .insert(RETURN_PATH_KEY, path)
            .map_err(|err| session_error("failed to store return path", err))
    }

    /// Read and clear the stashed post-login redirect path, if any.
    pub fn take_return_path(&self) -> Result<Option<String>, Error> {
        self.pop_string(RETURN_PATH_KEY)
    }

    fn pop_string(&self, key: &str) -> Result<Option<String>, Error> {
        let value = self
            .0
            .get::<String>(key)
            .map_err(|err| session_error("failed to read session value", err))?;
        if value.is_some() {
            self.0.remove(key);
        }
        Ok(value)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
