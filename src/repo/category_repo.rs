use anyhow::Result;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, instrument};

use crate::db::DbPool;
use crate::dto::{CategoryFilter, CategorySortField, Ordering};
use crate::models::{Category, NewCategory};
use crate::schema::categories;

use super::contains_pattern;

/// Creates a new category
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `name` - The name for the new category
///
/// ### Returns
///
/// A Result containing the newly created Category if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - A category with the same name already exists (a Diesel unique violation
///   on `categories.name`, see [`crate::errors::is_unique_violation`])
/// - The database insert operation fails
#[instrument(skip(pool))]
pub fn create_category(pool: &DbPool, name: &str) -> Result<Category> {
    let conn = &mut pool.get()?;

    let category = diesel::insert_into(categories::table)
        .values(NewCategory { name })
        .returning(Category::as_returning())
        .get_result(conn)?;

    debug!("Created category {}", category.get_id());
    Ok(category)
}

/// Retrieves a category by its ID
///
/// ### Returns
///
/// `Ok(None)` if no category has that ID
#[instrument(skip(pool))]
pub fn get_category(pool: &DbPool, category_id: i32) -> Result<Option<Category>> {
    let conn = &mut pool.get()?;

    let category = categories::table
        .find(category_id)
        .select(Category::as_select())
        .first(conn)
        .optional()?;

    Ok(category)
}

/// Looks a category up by exact name on an existing connection
///
/// Used inside item write transactions, where categories are resolved by
/// name and never created implicitly.
pub fn find_category_by_name(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<Category>> {
    categories::table
        .filter(categories::name.eq(name))
        .select(Category::as_select())
        .first(conn)
        .optional()
}

/// Lists categories matching a filter
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `filter` - Optional case-insensitive name substring and ordering
///
/// ### Returns
///
/// The matching categories, by ID unless another ordering was requested
#[instrument(skip(pool))]
pub fn list_categories(pool: &DbPool, filter: &CategoryFilter) -> Result<Vec<Category>> {
    let conn = &mut pool.get()?;

    let mut query = categories::table.select(Category::as_select()).into_boxed();

    if let Some(search) = &filter.search {
        query = query.filter(categories::name.like(contains_pattern(search)).escape('\\'));
    }

    query = match filter.ordering {
        Some(Ordering { field: CategorySortField::Name, descending: false }) => query.order(categories::name.asc()),
        Some(Ordering { field: CategorySortField::Name, descending: true }) => query.order(categories::name.desc()),
        Some(Ordering { field: CategorySortField::Id, descending: true }) => query.order(categories::id.desc()),
        Some(Ordering { field: CategorySortField::Id, descending: false }) | None => {
            query.order(categories::id.asc())
        }
    };

    let result = query.then_order_by(categories::id.asc()).load(conn)?;
    Ok(result)
}

/// Renames a category
///
/// ### Returns
///
/// The updated category, or `Ok(None)` if no category has that ID
///
/// ### Errors
///
/// As for [`create_category`], a unique violation if the new name is taken
#[instrument(skip(pool))]
pub fn update_category(pool: &DbPool, category_id: i32, name: &str) -> Result<Option<Category>> {
    let conn = &mut pool.get()?;

    let category = diesel::update(categories::table.find(category_id))
        .set(categories::name.eq(name))
        .returning(Category::as_returning())
        .get_result(conn)
        .optional()?;

    Ok(category)
}

/// Deletes a category along with every item in it
///
/// Item tag links go with the items; the tags themselves are kept.
///
/// ### Returns
///
/// `true` if a category was deleted, `false` if none had that ID
#[instrument(skip(pool))]
pub fn delete_category(pool: &DbPool, category_id: i32) -> Result<bool> {
    let conn = &mut pool.get()?;

    let deleted = diesel::delete(categories::table.find(category_id)).execute(conn)?;

    Ok(deleted > 0)
}
