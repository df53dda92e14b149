//! Shared fixtures for HTTP adapter unit tests.

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use async_trait::async_trait;

use crate::domain::ports::{UserRepository, UserStoreError};
use crate::domain::{User, UserId};

/// Cookie-backed session middleware matching production settings, except the
/// signing key is throwaway and `Secure` is off so plain-HTTP test requests
/// round-trip cookies.
pub(crate) fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .cookie_content_security(CookieContentSecurity::Private)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::hours(2)))
        .build()
}

/// User store stub whose every operation reports a connection failure.
pub(crate) struct FailingUserRepository;

#[async_trait]
impl UserRepository for FailingUserRepository {
    async fn insert(
        &self,
        _name: &str,
        _email: &str,
        _password: &str,
    ) -> Result<UserId, UserStoreError> {
        Err(UserStoreError::connection("store offline"))
    }

    async fn authenticate(&self, _email: &str, _password: &str) -> Result<UserId, UserStoreError> {
        Err(UserStoreError::connection("store offline"))
    }

    async fn exists(&self, _id: &UserId) -> Result<bool, UserStoreError> {
        Err(UserStoreError::connection("store offline"))
    }

    async fn get(&self, _id: &UserId) -> Result<User, UserStoreError> {
        Err(UserStoreError::connection("store offline"))
    }

    async fn is_correct_password(
        &self,
        _id: &UserId,
        _password: &str,
    ) -> Result<(), UserStoreError> {
        Err(UserStoreError::connection("store offline"))
    }

    async fn change_password(
        &self,
        _id: &UserId,
        _new_password: &str,
    ) -> Result<(), UserStoreError> {
        Err(UserStoreError::connection("store offline"))
    }
}
