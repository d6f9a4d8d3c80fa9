pub mod comment;
pub mod post;
pub mod token;
pub mod user;

use actix_web::web;

use crate::app::AppError;

/// Registers every route along with extractor configs that turn malformed
/// bodies, queries and paths into `400 Bad Request`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    //User routes
    .service(user::create_user)
    .service(user::list_users)
    .service(user::get_user)
    .service(user::update_user)
    .service(user::delete_user)
    //Post routes
    .service(post::create_post)
    .service(post::list_posts)
    .service(post::get_posts_by_author)
    .service(post::get_post)
    .service(post::update_post)
    .service(post::delete_post)
    //Comment routes
    .service(comment::create_comment)
    .service(comment::get_comments)
    .service(comment::get_comment)
    .service(comment::delete_comment)
    //Token routes
    .service(token::issue_token)
    .service(token::revoke_token);
}

#[cfg(test)]
pub(crate) mod testing {
    use diesel::r2d2::{ConnectionManager, Pool};

    use crate::{app::AppState, database::db_utils::psql_connect_to_db};

    fn lazy_redis_pool(url: &str) -> crate::database::db_utils::RedisPool {
        Pool::builder()
            .min_idle(Some(0))
            .build_unchecked(redis::Client::open(url).unwrap())
    }

    /// State whose pools never connect; for requests rejected before any query runs
    pub fn offline_state() -> AppState {
        AppState {
            psql_pool: Pool::builder()
                .min_idle(Some(0))
                .build_unchecked(ConnectionManager::new("postgres://offline.invalid/blogapi")),
            redis_pool: lazy_redis_pool("redis://offline.invalid/"),
            token_ttl: 60,
        }
    }

    /// State backed by `DATABASE_URL`; redis is only contacted when a test issues a token
    pub fn live_state() -> AppState {
        dotenv::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").unwrap();
        let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| String::from("redis://127.0.0.1/"));

        AppState {
            psql_pool: psql_connect_to_db(&database_url).unwrap(),
            redis_pool: lazy_redis_pool(&redis_url),
            token_ttl: 60,
        }
    }

    pub fn unique_email() -> String {
        format!("{}@example.com", uuid::Uuid::new_v4())
    }
}
