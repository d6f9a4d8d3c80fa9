use diesel::{pg::PgConnection, prelude::*};
use serde::Serialize;

use super::post::Post;
use crate::schema::{post_tags, tags};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = tags)]
struct NewTag<'a> {
    name: &'a str,
}

/// Row of the post <-> tag join table
#[derive(Debug, Clone, Insertable, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(Post))]
#[diesel(belongs_to(Tag))]
#[diesel(table_name = post_tags)]
#[diesel(primary_key(post_id, tag_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostTag {
    pub post_id: i32,
    pub tag_id: i32,
}

/// Drops repeated names, keeping the first occurrence of each.
pub fn unique_names(names: &[String]) -> Vec<&str> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        if !seen.contains(&name.as_str()) {
            seen.push(name.as_str());
        }
    }
    seen
}

impl Tag {
    /// Returns the tags named `names`, creating the ones that don't exist yet.
    /// The insert skips names taken concurrently, so no duplicate rows are created.
    pub fn find_or_create(conn: &mut PgConnection, names: &[&str]) -> QueryResult<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<NewTag> = names.iter().map(|&name| NewTag { name }).collect();
        diesel::insert_into(tags::table)
            .values(&rows)
            .on_conflict(tags::name)
            .do_nothing()
            .execute(conn)?;

        tags::table
            .filter(tags::name.eq_any(names.to_vec()))
            .select(Tag::as_select())
            .load(conn)
    }

    /// Links the post to every named tag, upserting tags by name.
    pub fn attach(conn: &mut PgConnection, post_id: i32, names: &[String]) -> QueryResult<Vec<Tag>> {
        let tags = Tag::find_or_create(conn, &unique_names(names))?;
        if tags.is_empty() {
            return Ok(tags);
        }

        let links: Vec<PostTag> = tags
            .iter()
            .map(|tag| PostTag { post_id, tag_id: tag.id })
            .collect();
        diesel::insert_into(post_tags::table)
            .values(&links)
            .on_conflict_do_nothing()
            .execute(conn)?;

        Ok(tags)
    }

    /** Removes every tag link of the post, the tags themselves are kept */
    pub fn detach_all(conn: &mut PgConnection, post_id: i32) -> QueryResult<usize> {
        diesel::delete(post_tags::table.filter(post_tags::post_id.eq(post_id))).execute(conn)
    }

    pub fn for_post(conn: &mut PgConnection, post: &Post) -> QueryResult<Vec<Tag>> {
        PostTag::belonging_to(post)
            .inner_join(tags::table)
            .order(tags::name.asc())
            .select(Tag::as_select())
            .load(conn)
    }

    /// Tags of each post, in the same order as `posts`
    pub fn for_posts(conn: &mut PgConnection, posts: &[Post]) -> QueryResult<Vec<Vec<Tag>>> {
        let links: Vec<(PostTag, Tag)> = PostTag::belonging_to(posts)
            .inner_join(tags::table)
            .order(tags::name.asc())
            .select((PostTag::as_select(), Tag::as_select()))
            .load(conn)?;

        Ok(links
            .grouped_by(posts)
            .into_iter()
            .map(|group| group.into_iter().map(|(_, tag)| tag).collect())
            .collect())
    }
}
