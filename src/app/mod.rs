pub mod config;
pub mod maintenance;

use std::fmt::Display;
use actix_web::{error::BlockingError, http::StatusCode, web, HttpResponse, ResponseError};
use diesel::PgConnection;
use serde_json::json;

use crate::database::{
    db_utils::{PgPool, RedisPool},
    error::{classify, PersistenceError},
};

/** Used for storing the database connections when handling requests */
#[derive(Clone)]
pub struct AppState {
    pub psql_pool: PgPool,
    pub redis_pool: RedisPool,
    /// Lifetime of an issued bearer token, in seconds
    pub token_ttl: usize,
}

impl AppState {
    /// Checks out a postgres connection and runs `f` on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.psql_pool.clone();
        web::block(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }

    /// Same as [`AppState::run`] but against the redis token store.
    pub async fn run_redis<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut redis::Connection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.redis_pool.clone();
        web::block(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

/** Holds the errors we will used during request processing */
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    UnauthorizedError,
    NotFound(String),
    Conflict(String),
    ServiceUnavailable,
    InternalServerError,
}

impl AppError {
    /// Maps a persistence failure to a domain error, using `missing` to
    /// describe the row when it turns out to be absent.
    pub fn persistence(err: diesel::result::Error, missing: impl FnOnce() -> String) -> Self {
        match classify(err) {
            PersistenceError::NotFound => AppError::NotFound(missing()),
            PersistenceError::Conflict(constraint) => AppError::Conflict(match constraint {
                Some(name) => format!("Unique constraint failed on {}", name),
                None => String::from("Unique constraint failed"),
            }),
            PersistenceError::Other(err) => {
                log::error!("database error: {}", err);
                AppError::InternalServerError
            }
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(msg) => f.write_str(msg),
            AppError::UnauthorizedError => f.write_str("Unauthorized"),
            AppError::NotFound(msg) => f.write_str(msg),
            AppError::Conflict(msg) => f.write_str(msg),
            AppError::ServiceUnavailable => f.write_str("Service unavailable for maintenance"),
            AppError::InternalServerError => f.write_str("Internal server error"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthorizedError => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "statusCode": status.as_u16(),
            "message": self.to_string(),
            "error": status.canonical_reason().unwrap_or_default(),
        }))
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        AppError::persistence(err, || String::from("Record not found"))
    }
}
impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        log::error!("connection pool error: {}", err);
        AppError::InternalServerError
    }
}
impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        log::error!("redis error: {}", err);
        AppError::InternalServerError
    }
}
impl From<BlockingError> for AppError {
    fn from(_: BlockingError) -> Self {
        AppError::InternalServerError
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl std::error::Error for AppError {}
