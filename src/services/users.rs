use diesel::PgConnection;
use serde::Serialize;

use super::{
    pagination::{BasicMeta, PageRequest, Paginated},
    Message,
};
use crate::{
    app::AppError,
    database::models::{
        post::Post,
        user::{NewUser, User, UserChanges},
    },
};

#[derive(Debug, Serialize)]
pub struct UserWithPosts {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<Post>,
}

fn not_found(id: i32) -> impl FnOnce() -> String {
    move || format!("User with ID {} not found", id)
}

pub fn create(conn: &mut PgConnection, input: NewUser) -> Result<User, AppError> {
    let user = User::create(conn, &input)?;
    log::info!("created user {}", user.id);
    Ok(user)
}

pub fn list(conn: &mut PgConnection, request: PageRequest) -> Result<Paginated<User, BasicMeta>, AppError> {
    let (data, total) = conn
        .build_transaction()
        .read_only()
        .repeatable_read()
        .run(|conn| {
            let data = User::page(conn, request.skip(), request.limit)?;
            let total = User::count(conn)?;
            Ok::<_, diesel::result::Error>((data, total))
        })?;

    Ok(Paginated {
        data,
        meta: BasicMeta { total, page: request.page },
    })
}

pub fn get(conn: &mut PgConnection, id: i32) -> Result<UserWithPosts, AppError> {
    let user = User::find_by_id(conn, id).map_err(|err| AppError::persistence(err, not_found(id)))?;
    let posts = Post::by_author(conn, user.id)?;
    Ok(UserWithPosts { user, posts })
}

pub fn find_by_email(conn: &mut PgConnection, email: &str) -> Result<User, AppError> {
    User::find_by_email(conn, email)
        .map_err(|err| AppError::persistence(err, || format!("User with email {} not found", email)))
}

pub fn update(conn: &mut PgConnection, id: i32, changes: UserChanges) -> Result<User, AppError> {
    let user = User::update(conn, id, &changes).map_err(|err| AppError::persistence(err, not_found(id)))?;
    log::info!("updated user {}", id);
    Ok(user)
}

pub fn remove(conn: &mut PgConnection, id: i32) -> Result<Message, AppError> {
    User::delete(conn, id).map_err(|err| AppError::persistence(err, not_found(id)))?;
    log::info!("deleted user {}", id);
    Ok(Message::new(format!("User {} deleted successfully", id)))
}
