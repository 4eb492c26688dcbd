use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Represents a tag in the system
///
/// Tag names are not unique: two tags may share a name and are still
/// distinct rows.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Tag {
    /// Auto-incremented identifier
    id: i32,

    /// The name of the tag
    name: String,
}

/// Insertable form of a tag
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::tags)]
pub struct NewTag<'a> {
    pub name: &'a str,
}

impl Tag {
    /// Creates a tag value with all fields specified
    ///
    /// ### Arguments
    ///
    /// * `id` - The identifier of the tag
    /// * `name` - The name of the tag
    pub fn new_with_fields(id: i32, name: String) -> Self {
        Self { id, name }
    }

    /// Gets the tag's ID
    ///
    /// ### Returns
    ///
    /// The identifier of the tag
    pub fn get_id(&self) -> i32 {
        self.id
    }

    /// Gets the tag's name
    ///
    /// ### Returns
    ///
    /// The name of the tag
    pub fn get_name(&self) -> String {
        self.name.clone()
    }
}
