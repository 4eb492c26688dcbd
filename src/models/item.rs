use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Category, Quantity, Tag};

/// A row of the `items` table
///
/// The category is held as a foreign key and tags live in `item_tags`;
/// see [`Item`] for the expanded representation returned by the API.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ItemRow {
    pub id: i32,
    pub sku: String,
    pub name: String,
    pub category_id: i32,
    pub in_stock: bool,
    #[diesel(column_name = available_stock_cents)]
    pub available_stock: Quantity,
}

/// Insertable form of an item row
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::items)]
pub struct NewItemRow<'a> {
    pub sku: &'a str,
    pub name: &'a str,
    pub category_id: i32,
    pub in_stock: bool,
    pub available_stock_cents: Quantity,
}

/// A stock-keeping unit with its category and tags expanded
///
/// This is the wire shape of an item:
/// `{id, sku, name, category: {id, name}, tags: [{id, name}], in_stock, available_stock}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: i32,
    sku: String,
    name: String,
    category: Category,
    tags: Vec<Tag>,
    in_stock: bool,
    available_stock: Quantity,
}

impl Item {
    /// Assembles the expanded item from its row and related records
    pub fn from_parts(row: ItemRow, category: Category, tags: Vec<Tag>) -> Self {
        Self {
            id: row.id,
            sku: row.sku,
            name: row.name,
            category,
            tags,
            in_stock: row.in_stock,
            available_stock: row.available_stock,
        }
    }

    /// Gets the item's ID
    pub fn get_id(&self) -> i32 {
        self.id
    }

    /// Gets the item's stock-keeping unit code
    pub fn get_sku(&self) -> String {
        self.sku.clone()
    }

    /// Gets the item's name
    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    /// Gets the category the item belongs to
    pub fn get_category(&self) -> &Category {
        &self.category
    }

    /// Gets the item's tags, ordered by tag ID
    pub fn get_tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Whether the item is marked as in stock
    pub fn get_in_stock(&self) -> bool {
        self.in_stock
    }

    /// Gets the quantity available
    pub fn get_available_stock(&self) -> Quantity {
        self.available_stock
    }
}
