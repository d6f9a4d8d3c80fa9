use diesel::{prelude::*, result::DatabaseErrorKind, PgConnection};
use serde::Serialize;

use super::{
    comments::CommentWithAuthor,
    pagination::{PageMeta, PageRequest, Paginated},
    Message,
};
use crate::{
    app::AppError,
    database::models::{
        comment::Comment,
        post::{CreatePost, NewPost, Post, PostFilter, UpdatePost},
        tag::Tag,
        user::{AuthorProfile, AuthorSummary, User},
    },
};

#[derive(Debug, Serialize)]
pub struct PostCount {
    pub comments: i64,
}

/// Post as returned by create, update and the paginated listing
#[derive(Debug, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
    pub tags: Vec<Tag>,
    #[serde(rename = "_count")]
    pub count: PostCount,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorProfile,
    pub tags: Vec<Tag>,
    pub comments: Vec<CommentWithAuthor>,
    #[serde(rename = "_count")]
    pub count: PostCount,
}

/// Post as returned by the per-author listing
#[derive(Debug, Serialize)]
pub struct AuthorPost {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
    #[serde(rename = "_count")]
    pub count: PostCount,
}

fn not_found(id: i32) -> impl FnOnce() -> String {
    move || format!("Post with ID {} not found", id)
}

/// Loads author, tags and comment count of every post, keeping the order of `posts`.
fn summarize(conn: &mut PgConnection, posts: Vec<Post>) -> QueryResult<Vec<PostSummary>> {
    let author_ids: Vec<i32> = posts.iter().map(|post| post.author_id).collect();
    let authors = User::summaries(conn, &author_ids)?;
    let tags = Tag::for_posts(conn, &posts)?;
    let counts = Comment::count_for_posts(conn, &posts)?;

    posts
        .into_iter()
        .zip(tags)
        .zip(counts)
        .map(|((post, tags), comments)| {
            let author = authors
                .iter()
                .find(|author| author.id == post.author_id)
                .cloned()
                .ok_or(diesel::result::Error::NotFound)?;
            Ok(PostSummary {
                post,
                author,
                tags,
                count: PostCount { comments },
            })
        })
        .collect()
}

fn summarize_one(conn: &mut PgConnection, post: Post) -> QueryResult<PostSummary> {
    summarize(conn, vec![post])?
        .pop()
        .ok_or(diesel::result::Error::NotFound)
}

/// An author deleted after its token was issued trips the posts -> users foreign key.
fn author_error(err: diesel::result::Error, author_id: i32) -> AppError {
    match err {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            AppError::NotFound(format!("User with ID {} not found", author_id))
        }
        other => AppError::from(other),
    }
}

/// Creates a post owned by `author_id`, linking it to each named tag.
pub fn create(conn: &mut PgConnection, input: CreatePost, author_id: i32) -> Result<PostSummary, AppError> {
    let new_post = NewPost {
        title: input.title,
        content: input.content,
        published: input.published,
        author_id,
    };

    let summary = conn
        .transaction(|conn| {
            let post = Post::create(conn, &new_post)?;
            if let Some(tags) = &input.tags {
                Tag::attach(conn, post.id, tags)?;
            }
            summarize_one(conn, post)
        })
        .map_err(|err| author_error(err, author_id))?;

    log::info!("user {} created post {}", author_id, summary.post.id);
    Ok(summary)
}

pub fn list(
    conn: &mut PgConnection,
    filter: PostFilter,
    request: PageRequest,
) -> Result<Paginated<PostSummary, PageMeta>, AppError> {
    let (data, total) = conn
        .build_transaction()
        .read_only()
        .repeatable_read()
        .run(|conn| {
            let posts = Post::page(conn, &filter, request.skip(), request.limit)?;
            let total = Post::count(conn, &filter)?;
            Ok::<_, diesel::result::Error>((summarize(conn, posts)?, total))
        })?;

    Ok(Paginated {
        data,
        meta: PageMeta::new(total, request),
    })
}

pub fn get(conn: &mut PgConnection, id: i32) -> Result<PostDetail, AppError> {
    let post = Post::find_by_id(conn, id).map_err(|err| AppError::persistence(err, not_found(id)))?;
    let author = User::profile(conn, post.author_id)?;
    let tags = Tag::for_post(conn, &post)?;
    let comments: Vec<CommentWithAuthor> = Comment::find_by_post(conn, post.id)?
        .into_iter()
        .map(CommentWithAuthor::from)
        .collect();

    Ok(PostDetail {
        post,
        author,
        tags,
        count: PostCount {
            comments: comments.len() as i64,
        },
        comments,
    })
}

/// Applies a partial update. Supplied tags replace the whole tag set of the post.
pub fn update(conn: &mut PgConnection, id: i32, input: UpdatePost) -> Result<PostSummary, AppError> {
    let (changes, tags) = input.split();

    let summary = conn
        .transaction(|conn| {
            let post = Post::update(conn, id, &changes)?;
            if let Some(tags) = &tags {
                Tag::detach_all(conn, post.id)?;
                Tag::attach(conn, post.id, tags)?;
            }
            summarize_one(conn, post)
        })
        .map_err(|err| AppError::persistence(err, not_found(id)))?;

    log::info!("updated post {}", id);
    Ok(summary)
}

pub fn remove(conn: &mut PgConnection, id: i32) -> Result<Message, AppError> {
    Post::delete(conn, id).map_err(|err| AppError::persistence(err, not_found(id)))?;
    log::info!("deleted post {}", id);
    Ok(Message::new(format!("Post {} deleted successfully", id)))
}

pub fn list_by_author(conn: &mut PgConnection, author_id: i32) -> Result<Vec<AuthorPost>, AppError> {
    let posts = Post::by_author(conn, author_id)?;
    let tags = Tag::for_posts(conn, &posts)?;
    let counts = Comment::count_for_posts(conn, &posts)?;

    Ok(posts
        .into_iter()
        .zip(tags)
        .zip(counts)
        .map(|((post, tags), comments)| AuthorPost {
            post,
            tags,
            count: PostCount { comments },
        })
        .collect())
}
