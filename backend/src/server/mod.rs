//! Server construction and middleware wiring.
//!
//! The dynamic surface lives in an anonymous scope wrapped, outermost first,
//! by the session middleware, the anti-forgery guard and the identity
//! resolver, so every handler behind it sees a decoded session, a checked
//! token and a resolved `CurrentUser` where one exists. The liveness probe is
//! registered ahead of the scope and bypasses all three.

mod config;

pub use config::ServerConfig;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};

use crate::inbound::http::state::HttpState;
use crate::inbound::http::{CsrfGuard, Identity, health, snippets, users};
use crate::middleware::Trace;

/// Everything a worker needs to assemble the application.
#[derive(Clone)]
pub struct AppDependencies {
    /// Repository handles.
    pub http_state: HttpState,
    /// Session cookie signing key.
    pub key: Key,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    /// SameSite policy for the session cookie.
    pub same_site: SameSite,
}

fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Frame-Options", "deny"))
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("Referrer-Policy", "origin-when-cross-origin"))
        .add(("X-XSS-Protection", "0"))
}

/// Assemble the application with its full middleware stack.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let identity = Identity::new(http_state.users.clone());

    // Last wrap registered runs first: session, then CSRF, then identity.
    let gated = web::scope("")
        .wrap(identity)
        .wrap(CsrfGuard)
        .wrap(session)
        .service(snippets::home)
        .service(snippets::view)
        .service(snippets::create_form)
        .service(snippets::create)
        .service(users::signup_form)
        .service(users::signup)
        .service(users::login_form)
        .service(users::login)
        .service(users::logout)
        .service(users::account_view)
        .service(users::change_password_form)
        .service(users::change_password);

    App::new()
        .app_data(web::Data::new(http_state))
        .wrap(security_headers())
        .wrap(Trace)
        .service(health::ping)
        .service(gated)
}

/// Construct an Actix HTTP server for the given state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(http_state: HttpState, config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();
    Ok(server)
}
