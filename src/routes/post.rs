use actix_web::{
    delete, get, patch, post,
    web::{Data, Json, Path, Query},
    HttpResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    app::{AppError, AppState},
    auth::Identity,
    database::models::post::{CreatePost, PostFilter, UpdatePost},
    services::{
        pagination::{PageQuery, PageRequest},
        posts,
    },
};

/// `GET /posts` query string
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    #[validate(range(min = 1, message = "page must not be less than 1"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, message = "limit must not be less than 1"))]
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// Only the literal `true` selects published posts, any other value selects drafts
    pub published: Option<String>,
    pub author_id: Option<i32>,
}

impl PostQuery {
    pub fn into_parts(self) -> (PostFilter, PageRequest) {
        let filter = PostFilter {
            published: self.published.map(|value| value == "true"),
            author_id: self.author_id,
            search: self.search.filter(|search| !search.is_empty()),
        };
        let request = PageRequest::from(PageQuery {
            page: self.page,
            limit: self.limit,
        });
        (filter, request)
    }
}

/// Pipe for creating a new post
/// - url: `{domain}/posts`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`, the token owner becomes the author
/// ## body
/// - title: [String]
/// - content: [String] (optional)
/// - published: [bool] (optional)
/// - tags: list of tag names (optional), created on first use
///
/// # Response
/// ## Ok
/// - `201` with the post, its author, tags and comment count
/// ## Error
/// - Bad request
/// - Unauthorized
#[post("/posts")]
pub async fn create_post(
    identity: Identity,
    app_state: Data<AppState>,
    body: Json<CreatePost>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner();
    input.validate()?;

    let author_id = identity.user_id;
    let post = app_state.run(move |conn| posts::create(conn, input, author_id)).await?;

    Ok(HttpResponse::Created().json(post))
}

/// Pipe for listing posts
/// - url: `{domain}/posts?page&limit&search&published&authorId`
///
/// `search` matches title or content, case-insensitively.
///
/// # Response
/// ## Ok
/// ```
/// {
///     "data": [...],
///     "meta": { "total": 25, "page": 2, "lastPage": 3, "hasNextPage": true, "hasPrevPage": true }
/// }
/// ```
/// ## Error
/// - Bad request
#[get("/posts")]
pub async fn list_posts(app_state: Data<AppState>, query: Query<PostQuery>) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    query.validate()?;

    let (filter, request) = query.into_parts();
    let page = app_state.run(move |conn| posts::list(conn, filter, request)).await?;

    Ok(HttpResponse::Ok().json(page))
}

#[get("/posts/author/{author_id}")]
pub async fn get_posts_by_author(app_state: Data<AppState>, path: Path<i32>) -> Result<HttpResponse, AppError> {
    let author_id = path.into_inner();
    let posts = app_state.run(move |conn| posts::list_by_author(conn, author_id)).await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// Returns the post with its author, tags and comments, newest comment first
#[get("/posts/{id}")]
pub async fn get_post(app_state: Data<AppState>, path: Path<i32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let post = app_state.run(move |conn| posts::get(conn, id)).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Supplying `tags` replaces every tag of the post, `[]` removes them all
#[patch("/posts/{id}")]
pub async fn update_post(
    app_state: Data<AppState>,
    path: Path<i32>,
    body: Json<UpdatePost>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = body.into_inner();
    input.validate()?;

    let post = app_state.run(move |conn| posts::update(conn, id, input)).await?;

    Ok(HttpResponse::Ok().json(post))
}

#[delete("/posts/{id}")]
pub async fn delete_post(app_state: Data<AppState>, path: Path<i32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let message = app_state.run(move |conn| posts::remove(conn, id)).await?;

    Ok(HttpResponse::Ok().json(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};

    use crate::{
        auth::token::Token,
        database::models::user::{NewUser, User},
        routes::{configure, testing},
    };

    #[actix_rt::test]
    async fn test_query_into_parts() {
        let query = PostQuery {
            page: Some(2),
            limit: Some(5),
            search: Some(String::from("rust")),
            published: Some(String::from("true")),
            author_id: Some(7),
        };
        let (filter, request) = query.into_parts();
        assert_eq!(
            filter,
            PostFilter {
                published: Some(true),
                author_id: Some(7),
                search: Some(String::from("rust")),
            }
        );
        assert_eq!(request, PageRequest { page: 2, limit: 5 });

        let (filter, request) = PostQuery {
            published: Some(String::from("yes")),
            search: Some(String::new()),
            ..Default::default()
        }
        .into_parts();
        assert_eq!(filter.published, Some(false));
        assert_eq!(filter.search, None);
        assert_eq!(request, PageRequest { page: 1, limit: 10 });
    }

    #[actix_rt::test]
    async fn test_create_post_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(testing::offline_state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(json!({ "title": "Hello" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_invalid_requests() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(testing::offline_state()))
                .configure(configure),
        )
        .await;

        for uri in ["/posts?page=0", "/posts?limit=-1", "/posts?authorId=abc", "/posts/x", "/posts/author/me"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }

        let req = test::TestRequest::patch()
            .uri("/posts/1")
            .set_json(json!({ "title": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri("/posts/1")
            .set_json(json!({ "tags": "not-a-list" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    #[ignore = "requires DATABASE_URL and a redis server on REDIS_URL"]
    async fn test_post_lifecycle() {
        let app_state = testing::live_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .configure(configure),
        )
        .await;

        let author = User::create(
            &mut app_state.psql_pool.get().unwrap(),
            &NewUser {
                name: String::from("Post author"),
                email: testing::unique_email(),
                bio: None,
            },
        )
        .unwrap();
        let token = Token::new(&mut app_state.redis_pool.get().unwrap(), author.id, 60).unwrap();

        let req = test::TestRequest::post()
            .uri("/posts")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "title": "Hello", "content": "First post", "tags": ["a", "b", "a"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let post: Value = test::read_body_json(resp).await;
        let id = post["id"].as_i64().unwrap();
        assert_eq!(post["authorId"], author.id);
        assert_eq!(post["published"], false);
        assert_eq!(post["tags"].as_array().unwrap().len(), 2);
        assert_eq!(post["_count"]["comments"], 0);

        let req = test::TestRequest::get()
            .uri(&format!("/posts?authorId={}&search=FIRST", author.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page: Value = test::read_body_json(resp).await;
        assert_eq!(page["meta"]["total"], 1);
        assert_eq!(page["meta"]["lastPage"], 1);
        assert_eq!(page["meta"]["hasNextPage"], false);
        assert_eq!(page["data"][0]["id"], id);

        let req = test::TestRequest::patch()
            .uri(&format!("/posts/{}", id))
            .set_json(json!({ "published": true, "content": null, "tags": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Value = test::read_body_json(resp).await;
        assert_eq!(updated["published"], true);
        assert_eq!(updated["tags"], json!([]));
        assert_eq!(updated["content"], Value::Null);
        assert_eq!(updated["title"], "Hello");

        let req = test::TestRequest::get().uri(&format!("/posts/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let detail: Value = test::read_body_json(resp).await;
        assert_eq!(detail["author"]["id"], author.id);
        assert_eq!(detail["comments"], json!([]));

        let req = test::TestRequest::get()
            .uri(&format!("/posts/author/{}", author.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let listed: Value = test::read_body_json(resp).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let req = test::TestRequest::delete().uri(&format!("/posts/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        for req in [
            test::TestRequest::get().uri(&format!("/posts/{}", id)).to_request(),
            test::TestRequest::delete().uri(&format!("/posts/{}", id)).to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }

        Token::delete(&mut app_state.redis_pool.get().unwrap(), &token).unwrap();
        User::delete(&mut app_state.psql_pool.get().unwrap(), author.id).unwrap();
    }
}
