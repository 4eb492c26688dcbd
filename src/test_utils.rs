use crate::auth::{self, ResetNotifier};
use crate::models::User;
use crate::*;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use diesel::RunQueryDsl;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Sets up a test database with migrations applied
///
/// This function:
/// 1. Creates an in-memory SQLite database
/// 2. Runs all migrations to set up the schema
///
/// Foreign keys are switched on by the pool's connection customizer.
///
/// ### Returns
///
/// An Arc-wrapped database connection pool connected to the in-memory database
pub fn setup_test_db() -> Arc<db::DbPool> {
    // Plain ":memory:" gives each pooled connection its own database; a
    // uniquely named shared-cache URI keeps one database per test
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url).expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).expect("Failed to run migrations");

    Arc::new(pool)
}

/// Reset notifier that keeps every issued token for inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// The most recent token sent to `email`
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl ResetNotifier for RecordingNotifier {
    fn send_reset_token(&self, user: &User, token: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((user.get_email(), token.to_string()));
        Ok(())
    }
}

/// Application state over a fresh database, recording reset tokens
pub fn setup_test_state() -> (AppState, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::with_notifier(setup_test_db(), notifier.clone());
    (state, notifier)
}

/// Creates a user directly in the database and returns an auth token for them
pub fn create_user_with_token(pool: &db::DbPool, username: &str, email: &str, password: &str) -> (User, String) {
    let hash = auth::hash_password(password).unwrap();
    let user = repo::create_user(pool, username, email, &hash).unwrap();
    let token = repo::get_or_create_token(pool, user.get_id()).unwrap();
    (user, token)
}

/// Sends one request to the app and decodes the JSON response body
///
/// An empty body decodes as `Value::Null`.
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Token {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

use diesel::sql_types::Text;
use diesel::QueryableByName;

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Tests the setup_test_db function
///
/// This test verifies that:
/// 1. The test database can be created and connected to
/// 2. The database has the expected tables
/// 3. Foreign keys are enforced on pooled connections
#[tokio::test]
async fn test_setup_test_db() {
    let pool = setup_test_db();
    let mut conn = pool.get().unwrap();

    let table_names: Vec<TableName> = diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table'")
        .load(&mut conn)
        .expect("Failed to load table names");

    let expected_tables = vec![
        "categories", "tags", "items", "item_tags", "users", "auth_tokens",
        "__diesel_schema_migrations" // Diesel's migration tracking table
    ];

    for table in expected_tables {
        assert!(table_names.iter().any(|t| t.name == table), "Table '{}' not found in database", table);
    }

    // An item pointing at a missing category must be rejected
    let result = diesel::sql_query(
        "INSERT INTO items (sku, name, category_id, in_stock, available_stock_cents) VALUES ('X', 'X', 999, 1, 0)",
    )
    .execute(&mut conn);
    assert!(result.is_err(), "Foreign keys are not enforced");

    drop(conn);

    let (state, _) = setup_test_state();
    let app = create_app(state);
    let (status, _) = send(&app, "GET", "/api/items/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Generates a name a category or tag would accept as is
pub fn arb_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,30}[A-Za-z0-9]"
}

/// Generates a stock quantity string with up to two decimals
pub fn arb_quantity_text() -> impl Strategy<Value = String> {
    (0u32..100_000u32, 0u32..100u32).prop_map(|(whole, cents)| format!("{}.{:02}", whole, cents))
}
