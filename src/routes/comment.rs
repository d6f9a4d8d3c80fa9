use actix_web::{
    delete, get, post,
    web::{Data, Json, Path},
    HttpResponse,
};
use validator::Validate;

use crate::{
    app::{AppError, AppState},
    database::models::comment::NewComment,
    services::comments,
};

/// Pipe for creating a comment
/// - url: `{domain}/comments`
///
/// # HTTP request requires
/// ## body
/// - json object with `content`, `postId` and `authorId`
///
/// # Example
/// ```
/// let request = actix_web::test::TestRequest::post()
///     .uri("/comments")
///     .set_json(json!({ "content": "Nice read", "postId": 3, "authorId": 1 }))
///     .to_request();
/// ```
///
/// # Response
/// ## Ok
/// - `201` with the comment, its author and post
/// ## Error
/// - Bad request
/// - Not found if the post does not exist
#[post("/comments")]
pub async fn create_comment(app_state: Data<AppState>, body: Json<NewComment>) -> Result<HttpResponse, AppError> {
    let input = body.into_inner();
    input.validate()?;

    let comment = app_state.run(move |conn| comments::create(conn, input)).await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Pipe for getting comments from a post
/// - url: `{domain}/comments/post/{post_id}`
///
/// # Response
/// ## Ok
/// - json list of the post comments, newest first
/// ```
/// [
///     {
///         "id": 8,
///         "content": "Comment body 2",
///         "postId": 73,
///         "authorId": 2,
///         "createdAt": "2022-08-12T06:05:31.097180",
///         "author": { "id": 2, "name": "Ada" }
///     }
/// ]
/// ```
/// ## Error
/// - Bad request
#[get("/comments/post/{post_id}")]
pub async fn get_comments(app_state: Data<AppState>, path: Path<i32>) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let comments = app_state.run(move |conn| comments::list_by_post(conn, post_id)).await?;

    Ok(HttpResponse::Ok().json(comments))
}

#[get("/comments/{id}")]
pub async fn get_comment(app_state: Data<AppState>, path: Path<i32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let comment = app_state.run(move |conn| comments::get(conn, id)).await?;

    Ok(HttpResponse::Ok().json(comment))
}

#[delete("/comments/{id}")]
pub async fn delete_comment(app_state: Data<AppState>, path: Path<i32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let message = app_state.run(move |conn| comments::remove(conn, id)).await?;

    Ok(HttpResponse::Ok().json(message))
}
