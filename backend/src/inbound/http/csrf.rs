//! Anti-forgery guard for state-changing requests.
//!
//! Double-checks every unsafe-method request against the session's
//! anti-forgery token before the handler runs. The submitted token may
//! arrive in the `X-CSRF-Token` header or the `csrf_token` form field; the
//! form case requires buffering the body, which is replayed for the inner
//! service so extractors still see it. Rejections are a generic 400 that
//! does not distinguish a missing token from a mismatched one.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_http::h1;
use actix_web::body::EitherBody;
use actix_web::dev::{self, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{FromRequest, ResponseError, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};

use crate::domain::Error;
use crate::inbound::http::session::SessionContext;

const TOKEN_HEADER: &str = "x-csrf-token";
const TOKEN_FIELD: &str = "csrf_token";

/// Middleware factory enforcing anti-forgery tokens on unsafe methods.
#[derive(Clone, Default)]
pub struct CsrfGuard;

impl<S, B> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = CsrfGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfGuardMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Service wrapper produced by [`CsrfGuard`].
pub struct CsrfGuardMiddleware<S> {
    service: Rc<S>,
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Constant-time equality so the comparison does not leak a prefix length.
fn tokens_match(expected: &str, submitted: &str) -> bool {
    let expected = expected.as_bytes();
    let submitted = submitted.as_bytes();
    if expected.len() != submitted.len() {
        return false;
    }
    expected
        .iter()
        .zip(submitted)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn is_form_content(req: &ServiceRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn token_from_form(body: &web::Bytes) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == TOKEN_FIELD)
        .map(|(_, value)| value.into_owned())
}

impl<S, B> Service<ServiceRequest> for CsrfGuardMiddleware<S>
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
            if is_safe_method(req.method()) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let stored = match SessionContext::from_parts(req.request()).stored_csrf_token() {
                Ok(stored) => stored,
                Err(err) => {
                    let (http_req, _) = req.into_parts();
                    let res = err.error_response().map_into_right_body();
                    return Ok(ServiceResponse::new(http_req, res));
                }
            };

            let header_token = req
                .headers()
                .get(TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            let buffer_form = header_token.is_none() && is_form_content(&req);
            let (http_req, mut payload) = req.into_parts();

            let (submitted, replay) = if buffer_form {
                let body = web::Bytes::from_request(&http_req, &mut payload).await?;
                let token = token_from_form(&body);
                (token, Some(body))
            } else {
                (header_token, None)
            };

            let valid = matches!(
                (stored.as_deref(), submitted.as_deref()),
                (Some(expected), Some(got)) if tokens_match(expected, got)
            );

            if !valid {
                tracing::warn!(path = %http_req.path(), "rejected request with bad anti-forgery token");
                let res = Error::invalid_request("invalid request")
                    .error_response()
                    .map_into_right_body();
                return Ok(ServiceResponse::new(http_req, res));
            }

            let payload = match replay {
                Some(body) => {
                    let (_, mut replayed) = h1::Payload::create(true);
                    replayed.unread_data(body);
                    dev::Payload::from(replayed)
                }
                None => payload,
            };
            let req = ServiceRequest::from_parts(http_req, payload);
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use serde::{Deserialize, Serialize};

    use crate::domain::ApiResult;
    use crate::inbound::http::test_utils::test_session_middleware;

    #[derive(Serialize, Deserialize)]
    struct EchoForm {
        message: String,
    }

    macro_rules! guarded_app {
        () => {
            test::init_service(
                App::new()
                    .wrap(CsrfGuard)
                    .wrap(test_session_middleware())
                    .route(
                        "/token",
                        web::get().to(|session: SessionContext| async move {
                            ApiResult::Ok(HttpResponse::Ok().body(session.csrf_token()?))
                        }),
                    )
                    .route(
                        "/submit",
                        web::post().to(|form: web::Form<EchoForm>| async move {
                            HttpResponse::Ok().body(form.into_inner().message)
                        }),
                    ),
            )
            .await
        };
    }

    macro_rules! token_and_cookie {
        ($app:expr) => {{
            let res =
                test::call_service($app, test::TestRequest::get().uri("/token").to_request())
                    .await;
            let cookie = res
                .response()
                .cookies()
                .find(|cookie| cookie.name() == "session")
                .expect("session cookie")
                .into_owned();
            let token =
                String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8 token");
            (token, cookie)
        }};
    }

    #[actix_web::test]
    async fn safe_methods_bypass_the_guard() {
        let app = guarded_app!();
        let res = test::call_service(&app, test::TestRequest::get().uri("/token").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn post_without_token_is_rejected() {
        let app = guarded_app!();
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/submit")
                .set_form(EchoForm {
                    message: "hello".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn post_with_wrong_token_is_rejected() {
        let app = guarded_app!();
        let (_, cookie) = token_and_cookie!(&app);
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/submit")
                .cookie(cookie)
                .set_form([("message", "hello"), ("csrf_token", "forged")])
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn form_token_passes_and_body_is_replayed() {
        let app = guarded_app!();
        let (token, cookie) = token_and_cookie!(&app);
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/submit")
                .cookie(cookie)
                .set_form([("message", "hello"), ("csrf_token", token.as_str())])
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body, "hello", "inner service must still see the form body");
    }

    #[actix_web::test]
    async fn header_token_passes() {
        let app = guarded_app!();
        let (token, cookie) = token_and_cookie!(&app);
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/submit")
                .cookie(cookie)
                .insert_header(("X-CSRF-Token", token))
                .set_form(EchoForm {
                    message: "hello".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
