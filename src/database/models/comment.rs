use chrono::NaiveDateTime;
use diesel::{pg::PgConnection, prelude::*};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    post::{Post, PostRef},
    user::{AuthorSummary, CommentAuthor, User},
};
use crate::schema::{comments, posts, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(Post))]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub content: String,
    pub post_id: i32,
    pub author_id: i32,
    pub created_at: NaiveDateTime,
}

/// Request body of `POST /comments`, inserted as is
#[derive(Debug, Deserialize, Insertable, Validate)]
#[diesel(table_name = comments)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[validate(length(min = 1, message = "content should not be empty"))]
    pub content: String,
    pub post_id: i32,
    pub author_id: i32,
}

impl Comment {
    pub fn create(conn: &mut PgConnection, new_comment: &NewComment) -> QueryResult<Comment> {
        diesel::insert_into(comments::table)
            .values(new_comment)
            .returning(Comment::as_returning())
            .get_result(conn)
    }

    /** Returns comment with the id specified, along with its author and post */
    pub fn find_by_id(conn: &mut PgConnection, comment_id: i32) -> QueryResult<(Comment, AuthorSummary, PostRef)> {
        comments::table
            .inner_join(users::table)
            .inner_join(posts::table)
            .filter(comments::id.eq(comment_id))
            .select((Comment::as_select(), AuthorSummary::as_select(), PostRef::as_select()))
            .first(conn)
    }

    /** Returns all comments posted on a post, newest first */
    pub fn find_by_post(conn: &mut PgConnection, post_id: i32) -> QueryResult<Vec<(Comment, CommentAuthor)>> {
        comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(post_id))
            .order((comments::created_at.desc(), comments::id.desc()))
            .select((Comment::as_select(), CommentAuthor::as_select()))
            .load(conn)
    }

    /// Number of comments on each post, in the same order as `posts`
    pub fn count_for_posts(conn: &mut PgConnection, posts: &[Post]) -> QueryResult<Vec<i64>> {
        let ids: Vec<i32> = posts.iter().map(|post| post.id).collect();
        let counts: Vec<(i32, i64)> = comments::table
            .filter(comments::post_id.eq_any(ids))
            .group_by(comments::post_id)
            .select((comments::post_id, diesel::dsl::count(comments::id)))
            .load(conn)?;

        Ok(posts
            .iter()
            .map(|post| {
                counts
                    .iter()
                    .find(|(post_id, _)| *post_id == post.id)
                    .map_or(0, |(_, count)| *count)
            })
            .collect())
    }

    /** Deletes a comment from database, `NotFound` if there was none */
    pub fn delete(conn: &mut PgConnection, comment_id: i32) -> QueryResult<i32> {
        diesel::delete(comments::table.find(comment_id))
            .returning(comments::id)
            .get_result(conn)
    }
}
