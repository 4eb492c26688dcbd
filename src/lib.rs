/// Stockroom: An Inventory Management Library
///
/// This library provides the core functionality for an inventory service:
/// items filed under categories and labelled with tags, user accounts with
/// token authentication, and a web API over both.
///
/// ### Modules
///
/// - `auth`: Password hashing, tokens and the authentication middleware
/// - `config`: Server configuration from defaults, file and command line
/// - `db`: Database connection management
/// - `dto`: Request and response payloads and their validation
/// - `errors`: The API error type and its HTTP mapping
/// - `handlers`: HTTP request handlers
/// - `models`: Data structures representing inventory records and accounts
/// - `repo`: Repository layer for database operations
/// - `schema`: Database schema definitions
///
/// ### Web API
///
/// Inventory endpoints require an `Authorization: Token <key>` header:
///
/// - `GET/POST /api/items/`, `GET/PUT/PATCH/DELETE /api/items/{id}/`
/// - `GET/POST /api/categories/`, `GET/PUT/PATCH/DELETE /api/categories/{id}/`
/// - `GET/POST /api/tags/`, `GET/PUT/PATCH/DELETE /api/tags/{id}/`
/// - `POST /logout/`
///
/// Account endpoints are open:
///
/// - `POST /register/`, `POST /login/`
/// - `POST /password_reset/`, `POST /password_reset/confirm/`

/// Authentication module
pub mod auth;

/// Configuration module
pub mod config;

/// Database connection module
pub mod db;

/// Data transfer objects
pub mod dto;

/// Error handling
pub mod errors;

/// Web API handlers
pub mod handlers;

/// Data models module
pub mod models;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{LogNotifier, SharedNotifier};
use crate::db::DbPool;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a password-reset token stays valid unless configured otherwise
pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Longest accepted password-reset token lifetime (one week)
pub const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 10_080;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub notifier: SharedNotifier,
    pub reset_token_ttl: chrono::Duration,
}

impl AppState {
    /// State that logs reset tokens and lets them live for an hour
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self::with_notifier(pool, Arc::new(LogNotifier))
    }

    pub fn with_notifier(pool: Arc<DbPool>, notifier: SharedNotifier) -> Self {
        Self {
            pool,
            notifier,
            reset_token_ttl: chrono::Duration::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
        }
    }

    pub fn with_reset_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.reset_token_ttl = ttl;
        self
    }
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

/// Creates the application router
///
/// ### Arguments
///
/// * `state` - The shared application state
///
/// ### Returns
///
/// An Axum Router configured with all API routes
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/items/", get(handlers::list_items_handler).post(handlers::create_item_handler))
        .route(
            "/api/items/{id}/",
            get(handlers::get_item_handler)
                .put(handlers::replace_item_handler)
                .patch(handlers::patch_item_handler)
                .delete(handlers::delete_item_handler),
        )
        .route(
            "/api/categories/",
            get(handlers::list_categories_handler).post(handlers::create_category_handler),
        )
        .route(
            "/api/categories/{id}/",
            get(handlers::get_category_handler)
                .put(handlers::replace_category_handler)
                .patch(handlers::patch_category_handler)
                .delete(handlers::delete_category_handler),
        )
        .route("/api/tags/", get(handlers::list_tags_handler).post(handlers::create_tag_handler))
        .route(
            "/api/tags/{id}/",
            get(handlers::get_tag_handler)
                .put(handlers::replace_tag_handler)
                .patch(handlers::patch_tag_handler)
                .delete(handlers::delete_tag_handler),
        )
        .route("/logout/", post(handlers::logout_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_token));

    let public = Router::new()
        .route("/register/", post(handlers::register_handler))
        .route("/login/", post(handlers::login_handler))
        .route("/password_reset/", post(handlers::password_reset_request_handler))
        .route("/password_reset/confirm/", post(handlers::password_reset_confirm_handler));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs any pending database migrations
///
/// ### Errors
///
/// Returns an error if a migration fails to apply
pub fn run_migrations(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    Ok(())
}
