//! End-to-end coverage of the authentication surface through the full
//! middleware stack: session cookies, anti-forgery guard, identity
//! resolution and access control, exactly as `create_server` wires them.

use std::sync::Arc;

use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::test;

use snipboard::inbound::http::HttpState;
use snipboard::server::{AppDependencies, build_app};
use snipboard::test_support::{InMemorySnippetRepository, InMemoryUserRepository};

fn deps(users: Arc<InMemoryUserRepository>) -> AppDependencies {
    AppDependencies {
        http_state: HttpState {
            users,
            snippets: Arc::new(InMemorySnippetRepository::new()),
        },
        key: Key::generate(),
        // Plain-HTTP test requests must round-trip the cookie.
        cookie_secure: false,
        same_site: SameSite::Lax,
    }
}

fn session_cookie(
    res: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

macro_rules! form_token {
    ($app:expr, $uri:expr, $cookie:expr) => {{
        let mut req = test::TestRequest::get().uri($uri);
        if let Some(cookie) = $cookie {
            req = req.cookie(cookie);
        }
        let res = test::call_service($app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie(&res).expect("form fetch sets the session cookie");
        let payload: serde_json::Value = test::read_body_json(res).await;
        let token = payload["csrfToken"]
            .as_str()
            .expect("form context carries the token")
            .to_owned();
        (token, cookie)
    }};
}

fn location(res: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> String {
    res.headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

#[actix_web::test]
async fn mutations_without_a_token_are_rejected_before_side_effects() {
    let users = Arc::new(InMemoryUserRepository::new());
    let app = test::init_service(build_app(deps(users.clone()))).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/signup")
            .set_form([
                ("name", "Alice"),
                ("email", "alice@example.com"),
                ("password", "pa$$word123"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let payload: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(payload["code"], "invalid_request");

    // The handler never ran, so no account exists.
    let (token, cookie) = form_token!(&app, "/user/login", None::<Cookie<'static>>);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/login")
            .cookie(cookie)
            .set_form([
                ("email", "alice@example.com"),
                ("password", "pa$$word123"),
                ("csrf_token", token.as_str()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn forged_tokens_get_the_same_generic_rejection_as_missing_ones() {
    let app = test::init_service(build_app(deps(Arc::new(InMemoryUserRepository::new())))).await;

    let (_, cookie) = form_token!(&app, "/user/signup", None::<Cookie<'static>>);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/signup")
            .cookie(cookie)
            .set_form([
                ("name", "Alice"),
                ("email", "alice@example.com"),
                ("password", "pa$$word123"),
                ("csrf_token", "forged-token"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let payload: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(payload["message"], "invalid request");
}

#[actix_web::test]
async fn signup_then_login_establishes_an_identity() {
    let app = test::init_service(build_app(deps(Arc::new(InMemoryUserRepository::new())))).await;

    let (token, cookie) = form_token!(&app, "/user/signup", None::<Cookie<'static>>);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/signup")
            .cookie(cookie)
            .set_form([
                ("name", "Alice"),
                ("email", "alice@example.com"),
                ("password", "pa$$word123"),
                ("csrf_token", token.as_str()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/user/login");
    let cookie = session_cookie(&res);

    let (token, cookie) = form_token!(&app, "/user/login", cookie);
    // Signup left a flash behind for the login page.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/login")
            .cookie(cookie)
            .set_form([
                ("email", "alice@example.com"),
                ("password", "pa$$word123"),
                ("csrf_token", token.as_str()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/snippet/create");
    let cookie = session_cookie(&res).expect("login re-issues the cookie");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/account/view")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let payload: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(payload["email"], "alice@example.com");
}

#[actix_web::test]
async fn login_rotates_both_session_cookie_and_csrf_token() {
    let users = Arc::new(InMemoryUserRepository::new());
    users.seed_user("Alice", "alice@example.com", "pa$$word123").await;
    let app = test::init_service(build_app(deps(users))).await;

    let (pre_login_token, cookie) = form_token!(&app, "/user/login", None::<Cookie<'static>>);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/login")
            .cookie(cookie.clone())
            .set_form([
                ("email", "alice@example.com"),
                ("password", "pa$$word123"),
                ("csrf_token", pre_login_token.as_str()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let post_login_cookie = session_cookie(&res).expect("post-login cookie");
    assert_ne!(
        cookie.value(),
        post_login_cookie.value(),
        "a pre-login session id must never survive authentication"
    );

    // The pre-login anti-forgery token died with the rotation.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/snippet/create")
            .cookie(post_login_cookie.clone())
            .set_form([
                ("title", "O snail"),
                ("content", "Climb Mount Fuji"),
                ("expires", "7"),
                ("csrf_token", pre_login_token.as_str()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // A freshly served token works.
    let (token, cookie) = form_token!(&app, "/snippet/create", Some(post_login_cookie));
    assert_ne!(token, pre_login_token);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/snippet/create")
            .cookie(cookie)
            .set_form([
                ("title", "O snail"),
                ("content", "Climb Mount Fuji"),
                ("expires", "7"),
                ("csrf_token", token.as_str()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(location(&res).starts_with("/snippet/view/"));
}

#[actix_web::test]
async fn protected_page_redirects_and_login_returns_there_exactly_once() {
    let users = Arc::new(InMemoryUserRepository::new());
    users.seed_user("Alice", "alice@example.com", "pa$$word123").await;
    let app = test::init_service(build_app(deps(users))).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/account/view").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/user/login");
    let cookie = session_cookie(&res);

    let (token, cookie) = form_token!(&app, "/user/login", cookie);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/login")
            .cookie(cookie)
            .set_form([
                ("email", "alice@example.com"),
                ("password", "pa$$word123"),
                ("csrf_token", token.as_str()),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(location(&res), "/account/view");
}

#[actix_web::test]
async fn logout_invalidates_the_session_for_protected_pages() {
    let users = Arc::new(InMemoryUserRepository::new());
    users.seed_user("Alice", "alice@example.com", "pa$$word123").await;
    let app = test::init_service(build_app(deps(users))).await;

    let (token, cookie) = form_token!(&app, "/user/login", None::<Cookie<'static>>);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/login")
            .cookie(cookie)
            .set_form([
                ("email", "alice@example.com"),
                ("password", "pa$$word123"),
                ("csrf_token", token.as_str()),
            ])
            .to_request(),
    )
    .await;
    let cookie = session_cookie(&res).expect("logged-in cookie");

    let (token, cookie) = form_token!(&app, "/snippet/create", Some(cookie));
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/user/logout")
            .cookie(cookie)
            .set_form([("csrf_token", token.as_str())])
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    let cookie = session_cookie(&res).expect("post-logout cookie");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/account/view")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/user/login");
}

#[actix_web::test]
async fn every_response_carries_trace_and_security_headers() {
    let app = test::init_service(build_app(deps(Arc::new(InMemoryUserRepository::new())))).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
    assert!(res.status().is_success());
    assert!(res.headers().contains_key("trace-id"));
    assert_eq!(
        res.headers()
            .get("X-Frame-Options")
            .and_then(|v| v.to_str().ok()),
        Some("deny")
    );
    assert_eq!(
        res.headers()
            .get("X-Content-Type-Options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    // The probe sits outside the session stack.
    assert!(session_cookie(&res).is_none());
}
