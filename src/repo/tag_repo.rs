use anyhow::Result;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, instrument};

use crate::db::DbPool;
use crate::models::{NewTag, Tag};
use crate::schema::tags;

use super::contains_pattern;

/// Creates a new tag in the database
///
/// Tag names are not unique, so this always inserts a new row.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `name` - The name for the new tag
///
/// ### Returns
///
/// A Result containing the newly created Tag if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails
#[instrument(skip(pool))]
pub fn create_tag(pool: &DbPool, name: &str) -> Result<Tag> {
    let conn = &mut pool.get()?;

    let tag = insert_tag(conn, name)?;

    debug!("Created tag {}", tag.get_id());
    Ok(tag)
}

fn insert_tag(conn: &mut SqliteConnection, name: &str) -> QueryResult<Tag> {
    diesel::insert_into(tags::table)
        .values(NewTag { name })
        .returning(Tag::as_returning())
        .get_result(conn)
}

/// Retrieves a tag by its ID
///
/// ### Returns
///
/// `Ok(None)` if no tag has that ID
#[instrument(skip(pool))]
pub fn get_tag(pool: &DbPool, tag_id: i32) -> Result<Option<Tag>> {
    let conn = &mut pool.get()?;

    let tag = tags::table
        .find(tag_id)
        .select(Tag::as_select())
        .first(conn)
        .optional()?;

    Ok(tag)
}

/// Finds the tag with exactly this name, creating it if there is none
///
/// When several tags share the name, the one with the lowest ID is used.
pub fn get_or_create_tag(conn: &mut SqliteConnection, name: &str) -> QueryResult<Tag> {
    let existing = tags::table
        .filter(tags::name.eq(name))
        .order(tags::id.asc())
        .select(Tag::as_select())
        .first(conn)
        .optional()?;

    match existing {
        Some(tag) => Ok(tag),
        None => insert_tag(conn, name),
    }
}

/// Lists tags, optionally filtered by a case-insensitive name substring
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `search` - Substring the tag name must contain
///
/// ### Returns
///
/// The matching tags ordered by ID
#[instrument(skip(pool))]
pub fn list_tags(pool: &DbPool, search: Option<&str>) -> Result<Vec<Tag>> {
    let conn = &mut pool.get()?;

    let mut query = tags::table.select(Tag::as_select()).into_boxed();
    if let Some(search) = search {
        query = query.filter(tags::name.like(contains_pattern(search)).escape('\\'));
    }

    let result = query.order(tags::id.asc()).load(conn)?;
    Ok(result)
}

/// Renames a tag
///
/// ### Returns
///
/// The updated tag, or `Ok(None)` if no tag has that ID
#[instrument(skip(pool))]
pub fn update_tag(pool: &DbPool, tag_id: i32, name: &str) -> Result<Option<Tag>> {
    let conn = &mut pool.get()?;

    let tag = diesel::update(tags::table.find(tag_id))
        .set(tags::name.eq(name))
        .returning(Tag::as_returning())
        .get_result(conn)
        .optional()?;

    Ok(tag)
}

/// Deletes a tag and unlinks it from every item
///
/// ### Returns
///
/// `true` if a tag was deleted, `false` if none had that ID
#[instrument(skip(pool))]
pub fn delete_tag(pool: &DbPool, tag_id: i32) -> Result<bool> {
    let conn = &mut pool.get()?;

    let deleted = diesel::delete(tags::table.find(tag_id)).execute(conn)?;

    Ok(deleted > 0)
}
