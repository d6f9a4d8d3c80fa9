use diesel::PgConnection;
use serde::Serialize;

use super::Message;
use crate::{
    app::AppError,
    database::models::{
        comment::{Comment, NewComment},
        post::{Post, PostRef},
        user::{AuthorSummary, CommentAuthor, User},
    },
};

#[derive(Debug, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: CommentAuthor,
}

impl From<(Comment, CommentAuthor)> for CommentWithAuthor {
    fn from((comment, author): (Comment, CommentAuthor)) -> Self {
        CommentWithAuthor { comment, author }
    }
}

/// Comment as returned right after creation
#[derive(Debug, Serialize)]
pub struct CreatedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: CommentAuthor,
    pub post: PostRef,
}

#[derive(Debug, Serialize)]
pub struct CommentDetail {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorSummary,
    pub post: PostRef,
}

fn not_found(id: i32) -> impl FnOnce() -> String {
    move || format!("Comment with ID {} not found", id)
}

/// Creates a comment. The post is checked up front so an unknown `postId`
/// fails with `NotFound` before anything is inserted.
pub fn create(conn: &mut PgConnection, input: NewComment) -> Result<CreatedComment, AppError> {
    if !Post::exists(conn, input.post_id)? {
        return Err(AppError::NotFound(format!("Post with ID {} not found", input.post_id)));
    }

    let comment = Comment::create(conn, &input)?;
    let author = User::comment_author(conn, comment.author_id)?;
    let post = Post::reference(conn, comment.post_id)?;

    log::info!("user {} commented on post {}", comment.author_id, comment.post_id);
    Ok(CreatedComment { comment, author, post })
}

pub fn get(conn: &mut PgConnection, id: i32) -> Result<CommentDetail, AppError> {
    let (comment, author, post) = Comment::find_by_id(conn, id).map_err(|err| AppError::persistence(err, not_found(id)))?;
    Ok(CommentDetail { comment, author, post })
}

/// Comments of a post, newest first. An unknown post simply has none.
pub fn list_by_post(conn: &mut PgConnection, post_id: i32) -> Result<Vec<CommentWithAuthor>, AppError> {
    Ok(Comment::find_by_post(conn, post_id)?
        .into_iter()
        .map(CommentWithAuthor::from)
        .collect())
}

pub fn remove(conn: &mut PgConnection, id: i32) -> Result<Message, AppError> {
    Comment::delete(conn, id).map_err(|err| AppError::persistence(err, not_found(id)))?;
    log::info!("deleted comment {}", id);
    Ok(Message::new(format!("Comment {} deleted successfully", id)))
}
