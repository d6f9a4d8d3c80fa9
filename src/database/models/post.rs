use chrono::NaiveDateTime;
use diesel::{
    pg::{Pg, PgConnection},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{nullable, user::User};
use crate::schema::posts;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: i32,
    pub created_at: NaiveDateTime,
}

/// Post as embedded in a comment
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostRef {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
    /// `None` keeps the column default
    pub published: Option<bool>,
    pub author_id: i32,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = posts)]
pub struct PostChanges {
    pub title: Option<String>,
    /// `Some(None)` clears the column
    pub content: Option<Option<String>>,
    pub published: Option<bool>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.published.is_none()
    }
}

/// Request body of `POST /posts`
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePost {
    #[validate(length(min = 1, message = "title should not be empty"))]
    pub title: String,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Request body of `PATCH /posts/{id}`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePost {
    #[validate(length(min = 1, message = "title should not be empty"))]
    pub title: Option<String>,
    /// `null` clears the content
    #[serde(default, deserialize_with = "nullable")]
    pub content: Option<Option<String>>,
    pub published: Option<bool>,
    /// When present, replaces every tag of the post
    pub tags: Option<Vec<String>>,
}

impl UpdatePost {
    pub fn split(self) -> (PostChanges, Option<Vec<String>>) {
        let changes = PostChanges {
            title: self.title,
            content: self.content,
            published: self.published,
        };
        (changes, self.tags)
    }
}

/// Listing filter, every field is optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub published: Option<bool>,
    pub author_id: Option<i32>,
    pub search: Option<String>,
}

/// Escapes LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Post {
    pub fn create(conn: &mut PgConnection, new_post: &NewPost) -> QueryResult<Post> {
        diesel::insert_into(posts::table)
            .values(new_post)
            .returning(Post::as_returning())
            .get_result(conn)
    }

    pub fn find_by_id(conn: &mut PgConnection, post_id: i32) -> QueryResult<Post> {
        posts::table.find(post_id).select(Post::as_select()).first(conn)
    }

    pub fn reference(conn: &mut PgConnection, post_id: i32) -> QueryResult<PostRef> {
        posts::table.find(post_id).select(PostRef::as_select()).first(conn)
    }

    pub fn exists(conn: &mut PgConnection, post_id: i32) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(posts::table.find(post_id))).get_result(conn)
    }

    fn filtered(filter: &PostFilter) -> posts::BoxedQuery<'static, Pg> {
        let mut query = posts::table.into_boxed();

        if let Some(published) = filter.published {
            query = query.filter(posts::published.eq(published));
        }
        if let Some(author_id) = filter.author_id {
            query = query.filter(posts::author_id.eq(author_id));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            query = query.filter(
                posts::title
                    .nullable()
                    .ilike(pattern.clone())
                    .or(posts::content.ilike(pattern)),
            );
        }

        query
    }

    /// Returns one page of matching posts, newest first
    pub fn page(conn: &mut PgConnection, filter: &PostFilter, skip: i64, take: i64) -> QueryResult<Vec<Post>> {
        Post::filtered(filter)
            .order((posts::created_at.desc(), posts::id.desc()))
            .offset(skip)
            .limit(take)
            .select(Post::as_select())
            .load(conn)
    }

    pub fn count(conn: &mut PgConnection, filter: &PostFilter) -> QueryResult<i64> {
        Post::filtered(filter).count().get_result(conn)
    }

    pub fn by_author(conn: &mut PgConnection, author_id: i32) -> QueryResult<Vec<Post>> {
        posts::table
            .filter(posts::author_id.eq(author_id))
            .order((posts::created_at.desc(), posts::id.desc()))
            .select(Post::as_select())
            .load(conn)
    }

    /** Applies `changes` and returns the updated row, `NotFound` if the row is gone */
    pub fn update(conn: &mut PgConnection, post_id: i32, changes: &PostChanges) -> QueryResult<Post> {
        if changes.is_empty() {
            return Post::find_by_id(conn, post_id);
        }

        diesel::update(posts::table.find(post_id))
            .set(changes)
            .returning(Post::as_returning())
            .get_result(conn)
    }

    /** Deletes a post, its tag links and comments go with it */
    pub fn delete(conn: &mut PgConnection, post_id: i32) -> QueryResult<i32> {
        diesel::delete(posts::table.find(post_id))
            .returning(posts::id)
            .get_result(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("snake_case"), "%snake\\_case%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_update_split() {
        let update = UpdatePost {
            title: Some(String::from("New title")),
            tags: Some(vec![]),
            ..Default::default()
        };
        let (changes, tags) = update.split();

        assert_eq!(changes.title.as_deref(), Some("New title"));
        assert!(changes.content.is_none());
        assert!(!changes.is_empty());
        assert_eq!(tags, Some(vec![]));
        assert!(PostChanges::default().is_empty());
    }

    #[test]
    fn test_update_content_null() {
        let update: UpdatePost = serde_json::from_str(r#"{ "content": null }"#).unwrap();
        let (changes, tags) = update.split();
        assert_eq!(changes.content, Some(None));
        assert!(!changes.is_empty());
        assert!(tags.is_none());

        let update: UpdatePost = serde_json::from_str(r#"{ "title": "Kept" }"#).unwrap();
        assert_eq!(update.content, None);

        let update: UpdatePost = serde_json::from_str(r#"{ "content": "New body" }"#).unwrap();
        assert_eq!(update.content, Some(Some(String::from("New body"))));
    }
}
