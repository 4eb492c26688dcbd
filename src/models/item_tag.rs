use diesel::prelude::*;

/// Represents an association between an item and a tag
#[derive(Queryable, Selectable, Insertable, Debug, Clone, Copy, PartialEq, Eq)]
#[diesel(table_name = crate::schema::item_tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ItemTag {
    /// The ID of the item
    pub item_id: i32,

    /// The ID of the tag
    pub tag_id: i32,
}

impl ItemTag {
    /// Creates a new item tag association
    pub fn new(item_id: i32, tag_id: i32) -> Self {
        Self { item_id, tag_id }
    }
}
