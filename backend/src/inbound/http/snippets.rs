//! Snippet handlers: home listing, single view, gated create.

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ApiResult, Error, SnippetDraft, SnippetId, Validator, validator};
use crate::inbound::http::FormContext;
use crate::inbound::http::error::unprocessable_form;
use crate::inbound::http::require_auth::RequireAuth;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const MAX_TITLE_CHARS: usize = 100;
const PERMITTED_EXPIRES_DAYS: [u32; 3] = [1, 7, 365];

/// Home page payload: latest snippets plus any pending flash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HomeContext {
    snippets: Vec<crate::domain::Snippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flash: Option<String>,
}

/// Latest snippets, newest first.
#[get("/")]
pub async fn home(state: web::Data<HttpState>, session: SessionContext) -> ApiResult<HttpResponse> {
    let snippets = state.snippets.latest().await.map_err(Error::from)?;
    Ok(HttpResponse::Ok().json(HomeContext {
        snippets,
        flash: session.take_flash()?,
    }))
}

/// View payload: the snippet plus any pending flash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewContext {
    snippet: crate::domain::Snippet,
    #[serde(skip_serializing_if = "Option::is_none")]
    flash: Option<String>,
}

/// A single snippet; 404 when missing or expired.
#[get("/snippet/view/{id}")]
pub async fn view(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let id = SnippetId::from_uuid(path.into_inner());
    let snippet = state.snippets.get(&id).await.map_err(Error::from)?;
    Ok(HttpResponse::Ok().json(ViewContext {
        snippet,
        flash: session.take_flash()?,
    }))
}

/// Create form fields.
#[derive(Debug, Deserialize)]
pub struct CreateSnippetForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    expires: u32,
}

impl CreateSnippetForm {
    fn validate(&self) -> Validator {
        let mut v = Validator::new();
        v.check_field(validator::not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            validator::max_chars(&self.title, MAX_TITLE_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(
            validator::not_blank(&self.content),
            "content",
            "This field cannot be blank",
        );
        v.check_field(
            validator::permitted_value(&self.expires, &PERMITTED_EXPIRES_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        v
    }
}

/// Serve the create form context.
#[get("/snippet/create", wrap = "RequireAuth")]
pub async fn create_form(session: SessionContext) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(FormContext::load(&session)?))
}

/// Persist a new snippet and redirect to its view page.
#[post("/snippet/create", wrap = "RequireAuth")]
pub async fn create(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<CreateSnippetForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let v = form.validate();
    if !v.is_valid() {
        return Err(unprocessable_form(&v));
    }

    let draft = SnippetDraft {
        title: form.title,
        content: form.content,
        expires_days: form.expires,
    };
    let id = state.snippets.insert(&draft).await.map_err(Error::from)?;
    session.set_flash("Snippet successfully created!")?;
    Ok(HttpResponse::SeeOther()
        .insert_header((LOCATION, format!("/snippet/view/{id}")))
        .finish())
}
