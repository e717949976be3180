use actix_web::http::StatusCode;
use actix_web::{delete, get, post, web, HttpResponse, ResponseError};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::Error;
use crate::row_stream::RowStream;
use crate::store::{self, LIST_USERS_SQL};
use crate::user::User;

pub const DEFAULT_RESULTS: u32 = 10;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("request failed: {}", self);
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

#[derive(Deserialize)]
struct ListUsersParams {
    results: Option<u32>,
}

#[derive(Deserialize)]
struct NewUser {
    email: Option<String>,
}

#[get("/users")]
async fn list_users(
    pool: web::Data<SqlitePool>,
    params: web::Query<ListUsersParams>,
) -> HttpResponse {
    let stream = RowStream::<User>::new(
        &pool,
        LIST_USERS_SQL,
        params.results.unwrap_or(DEFAULT_RESULTS),
    );
    HttpResponse::Ok()
        .content_type("application/x-ndjson")
        .streaming(stream)
}

#[get("/users/{id}")]
async fn get_user(
    pool: web::Data<SqlitePool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, Error> {
    Ok(match store::fetch(&pool, id.into_inner()).await? {
        Some(user) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(user.to_string()),
        None => HttpResponse::NotFound().finish(),
    })
}

#[post("/users")]
async fn create_user(
    pool: web::Data<SqlitePool>,
    new_user: web::Json<NewUser>,
) -> Result<HttpResponse, Error> {
    let user = store::insert(&pool, new_user.email.as_deref()).await?;
    log::info!("created {}", user);
    Ok(HttpResponse::Created().json(user))
}

#[delete("/users/{id}")]
async fn delete_user(
    pool: web::Data<SqlitePool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, Error> {
    Ok(if store::delete(&pool, id.into_inner()).await? {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::NotFound().finish()
    })
}

/// Mounts the user routes. Expects a `web::Data<SqlitePool>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(get_user)
        .service(create_user)
        .service(delete_user);
}
