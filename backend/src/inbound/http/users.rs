//! User account handlers: signup, login, logout, password change, account.
//!
//! Form submissions arrive as `application/x-www-form-urlencoded`; responses
//! are JSON payloads for an external renderer. GET form endpoints hand out
//! the session's anti-forgery token and any pending flash message. Every
//! form owns a [`Validator`] and runs all of its checks in one pass so a
//! single response reports every problem.

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;

use crate::domain::ports::UserStoreError;
use crate::domain::{ApiResult, Validator, validator};
use crate::inbound::http::FormContext;
use crate::inbound::http::error::unprocessable_form;
use crate::inbound::http::identity::CurrentUser;
use crate::inbound::http::require_auth::RequireAuth;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const LOGIN_PATH: &str = "/user/login";
const DEFAULT_POST_LOGIN_PATH: &str = "/snippet/create";

const MIN_PASSWORD_CHARS: usize = 8;

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// Signup form fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl SignupForm {
    fn validate(&self) -> Validator {
        let mut v = Validator::new();
        v.check_field(validator::not_blank(&self.name), "name", "This field cannot be blank");
        v.check_field(validator::not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            validator::matches_email(&self.email),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(
            validator::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        v.check_field(
            validator::min_chars(&self.password, MIN_PASSWORD_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
        v
    }
}

/// Serve the signup form context.
#[get("/user/signup")]
pub async fn signup_form(session: SessionContext) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(FormContext::load(&session)?))
}

/// Register a new account.
#[post("/user/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<SignupForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let mut v = form.validate();
    if !v.is_valid() {
        return Err(unprocessable_form(&v));
    }

    match state
        .users
        .insert(&form.name, &form.email, &form.password)
        .await
    {
        Ok(_) => {
            session.set_flash("Your signup was successful. Please log in.")?;
            Ok(see_other(LOGIN_PATH))
        }
        Err(UserStoreError::DuplicateEmail) => {
            v.add_field_error("email", "Email address is already in use");
            Err(unprocessable_form(&v))
        }
        Err(err) => Err(err.into()),
    }
}

/// Login form fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl LoginForm {
    fn validate(&self) -> Validator {
        let mut v = Validator::new();
        v.check_field(validator::not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            validator::matches_email(&self.email),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(
            validator::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        v
    }
}

/// Serve the login form context.
#[get("/user/login")]
pub async fn login_form(session: SessionContext) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(FormContext::load(&session)?))
}

/// Authenticate and establish a session identity.
///
/// On success the session token is rotated and the anti-forgery token
/// regenerated before the identity is stored, so a pre-login session id can
/// never be promoted to an authenticated one.
#[post("/user/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<LoginForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let mut v = form.validate();
    if !v.is_valid() {
        return Err(unprocessable_form(&v));
    }

    let user_id = match state.users.authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(UserStoreError::InvalidCredentials) => {
            v.add_non_field_error("Email or password is incorrect");
            return Err(unprocessable_form(&v));
        }
        Err(err) => return Err(err.into()),
    };

    session.renew();
    session.regenerate_csrf_token()?;
    session.persist_user(&user_id)?;
    session.set_flash("You've been logged in successfully!")?;

    let destination = session
        .take_return_path()?
        .unwrap_or_else(|| DEFAULT_POST_LOGIN_PATH.to_owned());
    Ok(see_other(&destination))
}

/// Tear down the authenticated session.
#[post("/user/logout", wrap = "RequireAuth")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    session.renew();
    session.regenerate_csrf_token()?;
    session.clear_user();
    session.set_flash("You've been logged out successfully!")?;
    Ok(see_other("/"))
}

/// Current user's profile.
#[get("/account/view", wrap = "RequireAuth")]
pub async fn account_view(
    state: web::Data<HttpState>,
    session: SessionContext,
    user: CurrentUser,
) -> ApiResult<HttpResponse> {
    match state.users.get(&user.id).await {
        Ok(account) => Ok(HttpResponse::Ok().json(account)),
        Err(UserStoreError::NoRecord) => {
            session.clear_user();
            Ok(see_other(LOGIN_PATH))
        }
        Err(err) => Err(err.into()),
    }
}

/// Password change form fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
    #[serde(default)]
    confirm_new_password: String,
}

impl ChangePasswordForm {
    fn validate(&self) -> Validator {
        let mut v = Validator::new();
        v.check_field(
            validator::not_blank(&self.current_password),
            "currentPassword",
            "This field cannot be blank",
        );
        v.check_field(
            validator::not_blank(&self.new_password),
            "newPassword",
            "This field cannot be blank",
        );
        v.check_field(
            validator::min_chars(&self.new_password, MIN_PASSWORD_CHARS),
            "newPassword",
            "This field must be at least 8 characters long",
        );
        v.check_field(
            validator::not_blank(&self.confirm_new_password),
            "confirmNewPassword",
            "This field cannot be blank",
        );
        v.check_field(
            validator::is_same(&self.new_password, &self.confirm_new_password),
            "confirmNewPassword",
            "Passwords do not match",
        );
        v
    }
}

/// Serve the password change form context.
#[get("/account/password/update", wrap = "RequireAuth")]
pub async fn change_password_form(session: SessionContext) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(FormContext::load(&session)?))
}

/// Replace the current user's password.
///
/// If the session's account has vanished the identity is cleared and the
/// visitor is sent back to login rather than continuing with a dangling id.
#[post("/account/password/update", wrap = "RequireAuth")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    user: CurrentUser,
    form: web::Form<ChangePasswordForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let mut v = form.validate();
    if !v.is_valid() {
        return Err(unprocessable_form(&v));
    }

    match state
        .users
        .is_correct_password(&user.id, &form.current_password)
        .await
    {
        Ok(()) => {}
        Err(UserStoreError::InvalidCredentials) => {
            v.add_field_error("currentPassword", "Current password is not correct");
            return Err(unprocessable_form(&v));
        }
        Err(UserStoreError::NoRecord) => {
            session.clear_user();
            return Ok(see_other(LOGIN_PATH));
        }
        Err(err) => return Err(err.into()),
    }

    match state.users.change_password(&user.id, &form.new_password).await {
        Ok(()) => {
            session.set_flash("Your password has been updated!")?;
            Ok(see_other("/"))
        }
        Err(UserStoreError::NoRecord) => {
            session.clear_user();
            Ok(see_other(LOGIN_PATH))
        }
        Err(err) => Err(err.into()),
    }
}
