use anyhow::Result;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::auth::generate_token;
use crate::db::DbPool;
use crate::models::{AuthToken, NewUser, User};
use crate::schema::{auth_tokens, users};

/// Creates a user account
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `username` - The unique username
/// * `email` - The unique, already normalized email address
/// * `password_hash` - The Argon2 PHC hash of the password
///
/// ### Returns
///
/// The newly created user
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The username or email is taken (a unique violation on `users.username`
///   or `users.email`)
/// - The database insert operation fails
#[instrument(skip(pool, password_hash))]
pub fn create_user(pool: &DbPool, username: &str, email: &str, password_hash: &str) -> Result<User> {
    let conn = &mut pool.get()?;

    let user = diesel::insert_into(users::table)
        .values(NewUser {
            username,
            email,
            password_hash,
            created_at: Utc::now().naive_utc(),
        })
        .returning(User::as_returning())
        .get_result(conn)?;

    info!("Registered user {}", user.get_id());
    Ok(user)
}

/// Looks a user up by exact username
#[instrument(skip(pool))]
pub fn find_user_by_username(pool: &DbPool, username: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let user = users::table
        .filter(users::username.eq(username))
        .select(User::as_select())
        .first(conn)
        .optional()?;

    Ok(user)
}

/// Looks a user up by exact email address
#[instrument(skip(pool))]
pub fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let user = users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()?;

    Ok(user)
}

/// Finds the owner of an auth token
///
/// ### Returns
///
/// `Ok(None)` if the token is unknown
#[instrument(skip_all)]
pub fn find_user_by_token(pool: &DbPool, token: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let user = auth_tokens::table
        .inner_join(users::table)
        .filter(auth_tokens::token.eq(token))
        .select(User::as_select())
        .first(conn)
        .optional()?;

    Ok(user)
}

/// Returns the user's auth token, issuing one if they have none
///
/// A user holds at most one token, so repeated logins share it.
#[instrument(skip(pool))]
pub fn get_or_create_token(pool: &DbPool, user_id: i32) -> Result<String> {
    let conn = &mut pool.get()?;

    conn.transaction(|conn| {
        let existing = auth_tokens::table
            .filter(auth_tokens::user_id.eq(user_id))
            .select(auth_tokens::token)
            .first::<String>(conn)
            .optional()?;

        if let Some(token) = existing {
            debug!("Reusing existing token");
            return Ok(token);
        }

        let token = AuthToken {
            token: generate_token(),
            user_id,
            created_at: Utc::now().naive_utc(),
        };
        diesel::insert_into(auth_tokens::table)
            .values(&token)
            .execute(conn)?;

        debug!("Issued new token");
        Ok(token.token)
    })
}

/// Deletes an auth token
///
/// ### Returns
///
/// `true` if the token existed
#[instrument(skip_all)]
pub fn delete_token(pool: &DbPool, token: &str) -> Result<bool> {
    let conn = &mut pool.get()?;

    let deleted = diesel::delete(auth_tokens::table.filter(auth_tokens::token.eq(token))).execute(conn)?;

    Ok(deleted > 0)
}

/// Records an outstanding password-reset token for a user
///
/// Replaces any earlier reset token.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The user requesting the reset
/// * `token_digest` - SHA-256 hex digest of the raw token
/// * `expires_at` - When the token stops being accepted
#[instrument(skip(pool, token_digest))]
pub fn store_reset_token(pool: &DbPool, user_id: i32, token_digest: &str, expires_at: DateTime<Utc>) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::update(users::table.find(user_id))
        .set((
            users::reset_token_hash.eq(Some(token_digest)),
            users::reset_token_expires_at.eq(Some(expires_at.naive_utc())),
        ))
        .execute(conn)?;

    Ok(())
}

/// Sets a new password if the reset token is still outstanding
///
/// The digest and expiry are checked by the update itself; a token completes
/// at most one reset, and a replaced token completes none. On a match the new
/// hash is stored, the reset token cleared and the user's auth token deleted,
/// all in one transaction.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The user resetting their password
/// * `token_digest` - SHA-256 hex digest of the presented token
/// * `now` - The instant the token must still be valid at
/// * `password_hash` - The Argon2 PHC hash of the new password
///
/// ### Returns
///
/// `true` if the password was changed, `false` if the token no longer
/// matches or has expired
#[instrument(skip(pool, token_digest, password_hash))]
pub fn complete_password_reset(
    pool: &DbPool,
    user_id: i32,
    token_digest: &str,
    now: DateTime<Utc>,
    password_hash: &str,
) -> Result<bool> {
    let conn = &mut pool.get()?;

    let changed = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let updated = diesel::update(
            users::table
                .find(user_id)
                .filter(users::reset_token_hash.eq(token_digest))
                .filter(users::reset_token_expires_at.gt(now.naive_utc())),
        )
        .set((
            users::password_hash.eq(password_hash),
            users::reset_token_hash.eq(None::<String>),
            users::reset_token_expires_at.eq(None::<chrono::NaiveDateTime>),
        ))
        .execute(conn)?;

        if updated == 0 {
            return Ok(false);
        }

        diesel::delete(auth_tokens::table.filter(auth_tokens::user_id.eq(user_id))).execute(conn)?;
        Ok(true)
    })?;

    if changed {
        info!("Password reset for user {}", user_id);
    } else {
        debug!("Reset token for user {} no longer valid", user_id);
    }
    Ok(changed)
}
