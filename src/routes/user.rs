use actix_web::{
    delete, get, patch, post,
    web::{Data, Json, Path, Query},
    HttpResponse,
};
use validator::Validate;

use crate::{
    app::{AppError, AppState},
    database::models::user::{NewUser, UserChanges},
    services::{pagination::PageQuery, users},
};

/// Pipe for creating an user
/// - url: `{domain}/users`
///
/// # HTTP request requirements
/// ## body
/// - json object with `name`, `email` and an optional `bio`
///
/// # Example
/// ```
/// let request = actix_web::test::TestRequest::post()
///     .uri("/users")
///     .set_json(json!({ "name": "Ada", "email": "ada@example.com" }))
///     .to_request();
/// ```
///
/// # Response
/// ## Ok
/// - `201` with the created user
/// ## Error
/// - Bad request
/// - Conflict if the email is taken
#[post("/users")]
pub async fn create_user(app_state: Data<AppState>, body: Json<NewUser>) -> Result<HttpResponse, AppError> {
    let input = body.into_inner();
    input.validate()?;

    let user = app_state.run(move |conn| users::create(conn, input)).await?;

    Ok(HttpResponse::Created().json(user))
}

/// Pipe for listing users, newest first
/// - url: `{domain}/users?page&limit`
///
/// # Response
/// ## Ok
/// ```
/// { "data": [...], "meta": { "total": 12, "page": 1 } }
/// ```
#[get("/users")]
pub async fn list_users(app_state: Data<AppState>, query: Query<PageQuery>) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    query.validate()?;

    let page = app_state.run(move |conn| users::list(conn, query.into())).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Returns the user along with their posts
#[get("/users/{id}")]
pub async fn get_user(app_state: Data<AppState>, path: Path<i32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let user = app_state.run(move |conn| users::get(conn, id)).await?;

    Ok(HttpResponse::Ok().json(user))
}

#[patch("/users/{id}")]
pub async fn update_user(
    app_state: Data<AppState>,
    path: Path<i32>,
    body: Json<UserChanges>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let changes = body.into_inner();
    changes.validate()?;

    let user = app_state.run(move |conn| users::update(conn, id, changes)).await?;

    Ok(HttpResponse::Ok().json(user))
}

#[delete("/users/{id}")]
pub async fn delete_user(app_state: Data<AppState>, path: Path<i32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let message = app_state.run(move |conn| users::remove(conn, id)).await?;

    Ok(HttpResponse::Ok().json(message))
}
