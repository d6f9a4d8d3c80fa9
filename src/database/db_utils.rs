use std::io;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, Pool},
};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type RedisPool = Pool<redis::Client>;

/// Builds the postgres connection pool.
/// Fails if no connection can be established to `database_url`.
///
/// # Example
/// ```
/// let pool = psql_connect_to_db("postgres://localhost/blogapi")?;
/// let mut conn = pool.get()?;
/// ```
pub fn psql_connect_to_db(database_url: &str) -> io::Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("Error connecting to postgres: {}", err)))
}

/// Builds the redis connection pool used by the token store.
pub fn redis_connect_to_db(redis_url: &str) -> io::Result<RedisPool> {
    let client = redis::Client::open(redis_url)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid redis url {}: {}", redis_url, err)))?;
    Pool::builder()
        .build(client)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("Error connecting to redis: {}", err)))
}
