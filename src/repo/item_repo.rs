use std::collections::HashMap;

use anyhow::Result;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::dto::{ItemChanges, ItemFilter, ItemSortField, NewItemInput, Ordering};
use crate::errors::is_unique_violation;
use crate::models::{Category, Item, ItemRow, ItemTag, NewItemRow, Quantity, Tag};
use crate::schema::{categories, item_tags, items, tags};

use super::{escape_like, find_category_by_name, get_or_create_tag};

/// Failures of an item create or update that the caller can act on
#[derive(Error, Debug)]
pub enum ItemWriteError {
    /// Categories are never created implicitly by item writes
    #[error("Category with name \"{0}\" does not exist.")]
    UnknownCategory(String),

    #[error("item with this sku already exists.")]
    DuplicateSku,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<diesel::result::Error> for ItemWriteError {
    fn from(err: diesel::result::Error) -> Self {
        let err = anyhow::Error::from(err);
        if is_unique_violation(&err, "items.sku") {
            ItemWriteError::DuplicateSku
        } else {
            ItemWriteError::Other(err)
        }
    }
}

/// Columns an update may touch; `None` leaves a column unchanged
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = items)]
struct ItemChangeset<'a> {
    sku: Option<&'a str>,
    name: Option<&'a str>,
    category_id: Option<i32>,
    in_stock: Option<bool>,
    available_stock_cents: Option<Quantity>,
}

impl ItemChangeset<'_> {
    fn is_empty(&self) -> bool {
        self.sku.is_none()
            && self.name.is_none()
            && self.category_id.is_none()
            && self.in_stock.is_none()
            && self.available_stock_cents.is_none()
    }
}

/// Loads the tags of several items at once, keyed by item ID
///
/// Each item's tags are ordered by tag ID; items without tags are absent
/// from the map.
fn load_tags_for_items(conn: &mut SqliteConnection, item_ids: &[i32]) -> QueryResult<HashMap<i32, Vec<Tag>>> {
    let links: Vec<(i32, Tag)> = item_tags::table
        .inner_join(tags::table)
        .filter(item_tags::item_id.eq_any(item_ids.to_vec()))
        .order((item_tags::item_id.asc(), tags::id.asc()))
        .select((item_tags::item_id, Tag::as_select()))
        .load(conn)?;

    let mut by_item: HashMap<i32, Vec<Tag>> = HashMap::new();
    for (item_id, tag) in links {
        by_item.entry(item_id).or_default().push(tag);
    }
    Ok(by_item)
}

fn load_item(conn: &mut SqliteConnection, item_id: i32) -> QueryResult<Option<Item>> {
    let row = items::table
        .inner_join(categories::table)
        .filter(items::id.eq(item_id))
        .select((ItemRow::as_select(), Category::as_select()))
        .first::<(ItemRow, Category)>(conn)
        .optional()?;

    let Some((row, category)) = row else {
        return Ok(None);
    };

    let tags = load_tags_for_items(conn, &[row.id])?
        .remove(&row.id)
        .unwrap_or_default();

    Ok(Some(Item::from_parts(row, category, tags)))
}

/// Links an item to the tags with the given names, creating missing tags
///
/// Names resolving to the same tag are linked once.
///
/// ### Returns
///
/// The linked tags ordered by ID
fn link_tags(conn: &mut SqliteConnection, item_id: i32, names: &[String]) -> QueryResult<Vec<Tag>> {
    let mut linked = Vec::with_capacity(names.len());
    for name in names {
        linked.push(get_or_create_tag(conn, name)?);
    }
    linked.sort_by_key(Tag::get_id);
    linked.dedup_by_key(|tag| tag.get_id());

    if !linked.is_empty() {
        let links: Vec<ItemTag> = linked
            .iter()
            .map(|tag| ItemTag::new(item_id, tag.get_id()))
            .collect();
        diesel::insert_into(item_tags::table).values(&links).execute(conn)?;
    }

    Ok(linked)
}

fn resolve_category(conn: &mut SqliteConnection, name: &str) -> Result<Category, ItemWriteError> {
    find_category_by_name(conn, name)?.ok_or_else(|| ItemWriteError::UnknownCategory(name.to_string()))
}

/// Creates a new item with its tags
///
/// The category is looked up by name; tags are looked up by name and created
/// when missing. Everything is written in a single transaction.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `input` - The validated item payload
///
/// ### Returns
///
/// The created item with its category and tags expanded
///
/// ### Errors
///
/// - [`ItemWriteError::UnknownCategory`] if no category has the given name
/// - [`ItemWriteError::DuplicateSku`] if another item has the same SKU
/// - [`ItemWriteError::Other`] if the database is unavailable or the write fails
#[instrument(skip(pool, input), fields(sku = %input.sku))]
pub fn create_item(pool: &DbPool, input: &NewItemInput) -> Result<Item, ItemWriteError> {
    let conn = &mut pool.get().map_err(anyhow::Error::from)?;

    let item = conn.transaction::<_, ItemWriteError, _>(|conn| {
        let category = resolve_category(conn, &input.category_name)?;

        let row = diesel::insert_into(items::table)
            .values(NewItemRow {
                sku: &input.sku,
                name: &input.name,
                category_id: category.get_id(),
                in_stock: input.in_stock,
                available_stock_cents: input.available_stock,
            })
            .returning(ItemRow::as_returning())
            .get_result(conn)?;

        let tags = link_tags(conn, row.id, &input.tag_names)?;
        Ok(Item::from_parts(row, category, tags))
    })?;

    info!("Created item {} with {} tags", item.get_id(), item.get_tags().len());
    Ok(item)
}

/// Retrieves an item by its ID with its category and tags expanded
///
/// ### Returns
///
/// `Ok(None)` if no item has that ID
#[instrument(skip(pool))]
pub fn get_item(pool: &DbPool, item_id: i32) -> Result<Option<Item>> {
    let conn = &mut pool.get()?;
    Ok(load_item(conn, item_id)?)
}

/// Lists items matching a filter
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `filter` - Optional case-insensitive exact name, category ID and ordering
///
/// ### Returns
///
/// The matching items with categories and tags expanded, by ID unless
/// another ordering was requested
#[instrument(skip(pool))]
pub fn list_items(pool: &DbPool, filter: &ItemFilter) -> Result<Vec<Item>> {
    let conn = &mut pool.get()?;

    let mut query = items::table
        .inner_join(categories::table)
        .select((ItemRow::as_select(), Category::as_select()))
        .into_boxed();

    if let Some(name) = &filter.name {
        // LIKE without wildcards is a case-insensitive equality test
        query = query.filter(items::name.like(escape_like(name)).escape('\\'));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(items::category_id.eq(category_id));
    }

    query = match filter.ordering {
        None => query.order(items::id.asc()),
        Some(Ordering { field, descending }) => match (field, descending) {
            (ItemSortField::Id, false) => query.order(items::id.asc()),
            (ItemSortField::Id, true) => query.order(items::id.desc()),
            (ItemSortField::Sku, false) => query.order(items::sku.asc()),
            (ItemSortField::Sku, true) => query.order(items::sku.desc()),
            (ItemSortField::Name, false) => query.order(items::name.asc()),
            (ItemSortField::Name, true) => query.order(items::name.desc()),
            (ItemSortField::InStock, false) => query.order(items::in_stock.asc()),
            (ItemSortField::InStock, true) => query.order(items::in_stock.desc()),
            (ItemSortField::AvailableStock, false) => query.order(items::available_stock_cents.asc()),
            (ItemSortField::AvailableStock, true) => query.order(items::available_stock_cents.desc()),
            (ItemSortField::Category, false) => query.order(items::category_id.asc()),
            (ItemSortField::Category, true) => query.order(items::category_id.desc()),
        },
    };

    let rows: Vec<(ItemRow, Category)> = query.then_order_by(items::id.asc()).load(conn)?;

    let ids: Vec<i32> = rows.iter().map(|(row, _)| row.id).collect();
    let mut tags_by_item = load_tags_for_items(conn, &ids)?;
    debug!("Loaded {} items", rows.len());

    let result = rows
        .into_iter()
        .map(|(row, category)| {
            let tags = tags_by_item.remove(&row.id).unwrap_or_default();
            Item::from_parts(row, category, tags)
        })
        .collect();

    Ok(result)
}

/// Applies changes to an existing item
///
/// Fields absent from `changes` are left as they are. When tags are given
/// they replace the item's whole tag set.
///
/// ### Returns
///
/// The updated item, or `Ok(None)` if no item has that ID
///
/// ### Errors
///
/// As for [`create_item`]
#[instrument(skip(pool, changes))]
pub fn update_item(pool: &DbPool, item_id: i32, changes: &ItemChanges) -> Result<Option<Item>, ItemWriteError> {
    let conn = &mut pool.get().map_err(anyhow::Error::from)?;

    conn.transaction::<_, ItemWriteError, _>(|conn| {
        let exists = items::table
            .find(item_id)
            .select(items::id)
            .first::<i32>(conn)
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        let category_id = match &changes.category_name {
            Some(name) => Some(resolve_category(conn, name)?.get_id()),
            None => None,
        };

        let changeset = ItemChangeset {
            sku: changes.sku.as_deref(),
            name: changes.name.as_deref(),
            category_id,
            in_stock: changes.in_stock,
            available_stock_cents: changes.available_stock,
        };
        if !changeset.is_empty() {
            diesel::update(items::table.find(item_id))
                .set(&changeset)
                .execute(conn)?;
        }

        if let Some(names) = &changes.tag_names {
            diesel::delete(item_tags::table.filter(item_tags::item_id.eq(item_id))).execute(conn)?;
            link_tags(conn, item_id, names)?;
        }

        Ok(load_item(conn, item_id)?)
    })
}

/// Deletes an item and its tag links
///
/// ### Returns
///
/// `true` if an item was deleted, `false` if none had that ID
#[instrument(skip(pool))]
pub fn delete_item(pool: &DbPool, item_id: i32) -> Result<bool> {
    let conn = &mut pool.get()?;

    let deleted = diesel::delete(items::table.find(item_id)).execute(conn)?;

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests;
