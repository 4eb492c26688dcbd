use chrono::NaiveDateTime;
use diesel::prelude::*;

/// A bearer token identifying a logged-in user
///
/// Each user holds at most one token; login reuses it and logout deletes it.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::auth_tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuthToken {
    pub token: String,
    pub user_id: i32,
    pub created_at: NaiveDateTime,
}
