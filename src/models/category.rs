use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A uniquely named grouping of items
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Category {
    /// Auto-incremented identifier
    id: i32,

    /// The category name, unique across all categories
    name: String,
}

/// Insertable form of a category
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::categories)]
pub struct NewCategory<'a> {
    pub name: &'a str,
}

impl Category {
    /// Creates a category value with all fields specified
    ///
    /// Rows are normally produced by the database; this is for callers that
    /// already know the id, such as API clients and tests.
    pub fn new_with_fields(id: i32, name: String) -> Self {
        Self { id, name }
    }

    /// Gets the category's ID
    pub fn get_id(&self) -> i32 {
        self.id
    }

    /// Gets the category's name
    pub fn get_name(&self) -> String {
        self.name.clone()
    }
}
