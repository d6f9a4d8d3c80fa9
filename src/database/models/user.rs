use chrono::NaiveDateTime;
use diesel::{pg::PgConnection, prelude::*};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::nullable;
use crate::schema::users;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Author as embedded in post listings and comment details
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthorSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Author as embedded in a single post
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthorProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
}

/// Author as embedded in a comment
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentAuthor {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Deserialize, Insertable, Validate)]
#[diesel(table_name = users)]
pub struct NewUser {
    #[validate(length(min = 1, message = "name should not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    pub bio: Option<String>,
}

/// Partial update, `None` fields are left untouched
#[derive(Debug, Default, Deserialize, AsChangeset, Validate)]
#[diesel(table_name = users)]
pub struct UserChanges {
    #[validate(length(min = 1, message = "name should not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be an email"))]
    pub email: Option<String>,
    /// `null` clears the bio
    #[serde(default, deserialize_with = "nullable")]
    pub bio: Option<Option<String>>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.bio.is_none()
    }
}

impl User {
    pub fn create(conn: &mut PgConnection, new_user: &NewUser) -> QueryResult<User> {
        diesel::insert_into(users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(conn)
    }

    pub fn find_by_id(conn: &mut PgConnection, user_id: i32) -> QueryResult<User> {
        users::table.find(user_id).select(User::as_select()).first(conn)
    }

    pub fn find_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<User> {
        users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(conn)
    }

    pub fn summaries(conn: &mut PgConnection, user_ids: &[i32]) -> QueryResult<Vec<AuthorSummary>> {
        users::table
            .filter(users::id.eq_any(user_ids.to_vec()))
            .select(AuthorSummary::as_select())
            .load(conn)
    }

    pub fn profile(conn: &mut PgConnection, user_id: i32) -> QueryResult<AuthorProfile> {
        users::table.find(user_id).select(AuthorProfile::as_select()).first(conn)
    }

    pub fn comment_author(conn: &mut PgConnection, user_id: i32) -> QueryResult<CommentAuthor> {
        users::table.find(user_id).select(CommentAuthor::as_select()).first(conn)
    }

    /// Returns one page of users, newest first
    pub fn page(conn: &mut PgConnection, skip: i64, take: i64) -> QueryResult<Vec<User>> {
        users::table
            .order((users::created_at.desc(), users::id.desc()))
            .offset(skip)
            .limit(take)
            .select(User::as_select())
            .load(conn)
    }

    pub fn count(conn: &mut PgConnection) -> QueryResult<i64> {
        users::table.count().get_result(conn)
    }

    /** Applies `changes` and returns the updated row, `NotFound` if the row is gone */
    pub fn update(conn: &mut PgConnection, user_id: i32, changes: &UserChanges) -> QueryResult<User> {
        if changes.is_empty() {
            return User::find_by_id(conn, user_id);
        }

        diesel::update(users::table.find(user_id))
            .set(changes)
            .returning(User::as_returning())
            .get_result(conn)
    }

    /** Deletes an user, `NotFound` if there was none */
    pub fn delete(conn: &mut PgConnection, user_id: i32) -> QueryResult<i32> {
        diesel::delete(users::table.find(user_id))
            .returning(users::id)
            .get_result(conn)
    }
}
