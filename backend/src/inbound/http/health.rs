//! Liveness probe, served outside the session stack.

use actix_web::{HttpResponse, get};

/// Respond with a plain `OK` so load balancers can probe the process.
#[get("/ping")]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}
