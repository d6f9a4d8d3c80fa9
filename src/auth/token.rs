use rand::distributions::{Alphanumeric, DistString};
use redis::Commands;

use crate::app::AppError;

const TOKEN_LENGTH: usize = 32;
const KEY_PREFIX: &str = "token:";

fn key(token: &str) -> String {
    format!("{}{}", KEY_PREFIX, token)
}

/// Bearer tokens stored in redis as `token:<token> -> user id`, expiring after a ttl
pub struct Token {}

impl Token {
    /// Issues a fresh token for `user_id`, valid for `ttl` seconds
    pub fn new(redis_conn: &mut redis::Connection, user_id: i32, ttl: usize) -> Result<String, AppError> {
        let token = Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LENGTH);

        redis_conn.set_ex::<_, _, ()>(key(&token), user_id, ttl)?;

        Ok(token)
    }

    /// Resolves a token to its user id, `Unauthorized` if unknown or expired
    pub fn find(redis_conn: &mut redis::Connection, token: &str) -> Result<i32, AppError> {
        let user_id: Option<i32> = redis_conn.get(key(token))?;
        user_id.ok_or(AppError::UnauthorizedError)
    }

    /// Returns whether the token existed
    pub fn delete(redis_conn: &mut redis::Connection, token: &str) -> Result<bool, AppError> {
        let removed: i32 = redis_conn.del(key(token))?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db_utils::redis_connect_to_db;

    #[test]
    fn test_key() {
        assert_eq!(key("abc"), "token:abc");
    }

    #[test]
    #[ignore = "requires a redis server on REDIS_URL"]
    fn test_token_lifecycle() {
        dotenv::dotenv().ok();
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| String::from("redis://127.0.0.1/"));
        let pool = redis_connect_to_db(&url).unwrap();
        let mut conn = pool.get().unwrap();

        let token = Token::new(&mut conn, 42, 60).unwrap();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert_eq!(Token::find(&mut conn, &token).unwrap(), 42);

        assert!(Token::delete(&mut conn, &token).unwrap());
        assert!(matches!(Token::find(&mut conn, &token), Err(AppError::UnauthorizedError)));
        assert!(!Token::delete(&mut conn, &token).unwrap());
    }
}
