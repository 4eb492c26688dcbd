use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

/// A user account
///
/// Not `Serialize`; the password hash and reset digest stay server-side.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    id: i32,
    username: String,
    email: String,

    /// Argon2id hash in PHC string format
    password_hash: String,

    /// SHA-256 hex digest of the outstanding reset token, if any
    reset_token_hash: Option<String>,

    /// When the outstanding reset token stops being accepted
    reset_token_expires_at: Option<NaiveDateTime>,

    created_at: NaiveDateTime,
}

/// Insertable form of a user
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn get_id(&self) -> i32 {
        self.id
    }

    pub fn get_username(&self) -> String {
        self.username.clone()
    }

    pub fn get_email(&self) -> String {
        self.email.clone()
    }

    pub fn get_password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Checks a reset-token digest against the stored one
    ///
    /// ### Returns
    ///
    /// `true` only if a token is outstanding, its digest matches, and it has
    /// not expired at `now`
    pub fn reset_token_matches(&self, digest: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token_hash, self.reset_token_expires_at) {
            (Some(stored), Some(expires_at)) => {
                stored == digest && DateTime::<Utc>::from_naive_utc_and_offset(expires_at, Utc) > now
            }
            _ => false,
        }
    }
}
