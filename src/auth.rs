/// Authentication primitives
///
/// Password hashing (Argon2id), token generation, reset-token digests, the
/// bearer-token middleware guarding the inventory routes, and the seam through
/// which password-reset tokens are delivered.

use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::task;
use tracing::{debug, info, instrument, warn};

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::User;
use crate::repo;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// The authenticated caller, inserted into request extensions by [`require_token`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// Hashes a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash string
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Runs [`hash_password`] off the async runtime
pub async fn hash_password_blocking(password: String) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task panicked")?
}

/// Runs [`verify_password`] off the async runtime
pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool> {
    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task panicked")?
}

static DUMMY_PASSWORD_HASH: OnceLock<Option<String>> = OnceLock::new();

fn dummy_password_hash() -> Option<&'static str> {
    DUMMY_PASSWORD_HASH
        .get_or_init(|| hash_password(&generate_token()).ok())
        .as_deref()
}

/// Runs a password check against a fixed hash and discards the outcome
///
/// Used when a login names no account, so it costs the same Argon2 work as a
/// login with a wrong password.
pub async fn verify_dummy_password_blocking(password: String) {
    let outcome = task::spawn_blocking(move || match dummy_password_hash() {
        Some(hash) => verify_password(&password, hash).map(|_| ()),
        None => Ok(()),
    })
    .await;
    if !matches!(outcome, Ok(Ok(()))) {
        debug!("Dummy password check did not complete");
    }
}

fn random_hex(byte_count: usize) -> String {
    let mut rng = rand::rng();
    (0..byte_count).fold(String::with_capacity(byte_count * 2), |mut acc, _| {
        let _ = write!(acc, "{:02x}", rng.random::<u8>());
        acc
    })
}

/// Generates a 40 character bearer token
pub fn generate_token() -> String {
    random_hex(20)
}

/// Generates a 64 character password-reset token
pub fn generate_reset_token() -> String {
    random_hex(32)
}

/// SHA-256 hex digest of a reset token; only the digest is stored
pub fn digest_reset_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .fold(String::with_capacity(64), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

/// Lists the reasons a password is unacceptable
///
/// ### Arguments
///
/// * `password` - The candidate password
/// * `username` - The account's username, when known
/// * `email` - The account's email, when known
///
/// ### Returns
///
/// An empty list if the password is acceptable
pub fn password_problems(password: &str, username: Option<&str>, email: Option<&str>) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    let lowered = password.to_lowercase();
    if username.is_some_and(|u| !u.is_empty() && u.to_lowercase() == lowered) {
        problems.push("The password is too similar to the username.".to_string());
    }
    let local_part = email.and_then(|e| e.split('@').next());
    if local_part.is_some_and(|l| !l.is_empty() && l.to_lowercase() == lowered) {
        problems.push("The password is too similar to the email address.".to_string());
    }

    problems
}

/// Lowercases the domain part of an email address
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Delivers password-reset tokens to account holders
pub trait ResetNotifier: Send + Sync {
    /// Sends the raw reset token to the user's registered address
    fn send_reset_token(&self, user: &User, token: &str) -> Result<()>;
}

/// Writes reset tokens to the application log instead of sending mail
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ResetNotifier for LogNotifier {
    fn send_reset_token(&self, user: &User, token: &str) -> Result<()> {
        info!(
            user_id = user.get_id(),
            email = %user.get_email(),
            "Password reset token issued: {}",
            token
        );
        Ok(())
    }
}

/// Shared handle to the configured notifier
pub type SharedNotifier = Arc<dyn ResetNotifier>;

/// Extracts the key from `Authorization: Token <key>` or `Authorization: Bearer <key>`
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        let key = key.trim();
        (!key.is_empty()).then(|| key.to_string())
    } else {
        None
    }
}

/// Middleware that rejects requests without a valid bearer token
///
/// On success the caller is available to handlers as `Extension<CurrentUser>`.
#[instrument(skip_all, fields(user_id))]
pub async fn require_token(
    State(pool): State<Arc<DbPool>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        debug!("Request without credentials");
        ApiError::NotAuthenticated
    })?;

    let user = repo::find_user_by_token(&pool, &token)?.ok_or_else(|| {
        warn!("Request with unknown token");
        ApiError::InvalidToken
    })?;

    tracing::Span::current().record("user_id", user.get_id());
    request.extensions_mut().insert(CurrentUser { user, token });

    Ok(next.run(request).await)
}
