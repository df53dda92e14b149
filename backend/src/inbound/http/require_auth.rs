//! Access control for routes that need an authenticated user.
//!
//! Applied per-route, inside the identity middleware. Anonymous visitors are
//! redirected to the login page with 303 See Other, and the path they asked
//! for is stashed in the session so a successful login can send them back.
//! Responses for protected pages carry `Cache-Control: no-store` so shared
//! caches never serve them.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{CACHE_CONTROL, HeaderValue, LOCATION};
use actix_web::{HttpMessage, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};

use crate::inbound::http::identity::CurrentUser;
use crate::inbound::http::session::SessionContext;

const LOGIN_PATH: &str = "/user/login";

/// Middleware factory guarding a route behind authentication.
#[derive(Clone, Default)]
pub struct RequireAuth;

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequireAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Service wrapper produced by [`RequireAuth`].
pub struct RequireAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let authenticated = req.extensions().get::<CurrentUser>().is_some();
            if !authenticated {
                let session = SessionContext::from_parts(req.request());
                if let Err(err) = session.stash_return_path(req.path()) {
                    tracing::warn!(error = %err, "failed to stash return path");
                }
                let (http_req, _) = req.into_parts();
                let res = HttpResponse::SeeOther()
                    .insert_header((LOCATION, LOGIN_PATH))
                    .finish()
                    .map_into_right_body();
                return Ok(ServiceResponse::new(http_req, res));
            }

            let mut res = service.call(req).await?;
            res.headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            Ok(res.map_into_left_body())
        })
    }
}
