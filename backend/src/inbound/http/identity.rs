//! Identity resolution for each request.
//!
//! Reads the session's stored user id and confirms the account still exists
//! before any handler trusts it. A stale id (account deleted since login) is
//! removed from the session and the request proceeds anonymously. A store
//! outage likewise clears the identity and degrades to anonymous rather than
//! failing the request; the visitor can log in again once the store recovers.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{LocalBoxFuture, Ready, ready};

use crate::domain::ports::UserRepository;
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;

/// Verified identity attached to the request by [`Identity`].
///
/// Present only when the session carried a user id that still resolves to an
/// account. Extracting it in a handler fails with 401 when absent; protected
/// routes should additionally sit behind `RequireAuth`, which redirects
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    /// The authenticated account's id.
    pub id: UserId,
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let current = req.extensions().get::<CurrentUser>().copied();
        ready(current.ok_or_else(|| Error::unauthorized("login required")))
    }
}

/// Middleware factory resolving the session identity on every request.
pub struct Identity {
    users: Arc<dyn UserRepository>,
}

impl Identity {
    /// Build the middleware around a user store.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Identity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = IdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddleware {
            service: Rc::new(service),
            users: Arc::clone(&self.users),
        }))
    }
}

/// Service wrapper produced by [`Identity`].
pub struct IdentityMiddleware<S> {
    service: Rc<S>,
    users: Arc<dyn UserRepository>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let users = Arc::clone(&self.users);
        Box::pin(async move {
            let session = SessionContext::from_parts(req.request());
            let candidate = session.user_id().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "failed to read session identity");
                None
            });
            if let Some(id) = candidate {
                match users.exists(&id).await {
                    Ok(true) => {
                        req.extensions_mut().insert(CurrentUser { id });
                    }
                    Ok(false) => {
                        tracing::info!(user_id = %id, "session references a deleted account");
                        session.clear_user();
                    }
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            user_id = %id,
                            "identity lookup failed; continuing anonymously"
                        );
                        session.clear_user();
                    }
                }
            }
            service.call(req).await
        })
    }
}
