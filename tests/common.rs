//! Common test utilities for Stockroom integration tests
//!
//! Every test gets its own application over a fresh in-memory database, and
//! goes through the public HTTP surface only: accounts are registered through
//! `/register/` and reset tokens are captured by a recording notifier.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use stockroom::{
    auth::ResetNotifier,
    create_app,
    db::init_pool,
    models::{Category, Item, Tag, User},
    run_migrations, AppState,
};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

/// Reset notifier that keeps every issued token
#[derive(Debug, Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingNotifier {
    /// The most recent token sent to `email`
    pub fn token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl ResetNotifier for CapturingNotifier {
    fn send_reset_token(&self, user: &User, token: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((user.get_email(), token.to_string()));
        Ok(())
    }
}

/// A running application and the notifier wired into it
pub struct TestApp {
    pub router: Router,
    pub notifier: Arc<CapturingNotifier>,
}

/// Creates a test application with an in-memory SQLite database
///
/// A uniquely named shared-cache database keeps all pooled connections on
/// the same data while isolating tests from each other.
pub fn create_test_app() -> TestApp {
    let database_url = format!("file:integration_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = init_pool(&database_url).unwrap();
    run_migrations(&mut pool.get().unwrap()).unwrap();

    let notifier = Arc::new(CapturingNotifier::default());
    let state = AppState::with_notifier(Arc::new(pool), notifier.clone());
    TestApp {
        router: create_app(state),
        notifier,
    }
}

impl TestApp {
    /// Sends one request and decodes the JSON response body
    ///
    /// An empty body decodes as `Value::Null`.
    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
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

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    /// Registers an account and returns its token
    pub async fn register(&self, username: &str, email: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/register/",
                None,
                Some(json!({"username": username, "email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers a default account and returns its token
    pub async fn default_token(&self) -> String {
        self.register("stocker", "stocker@example.com").await
    }

    pub async fn create_category(&self, token: &str, name: &str) -> Category {
        let (status, body) = self
            .request("POST", "/api/categories/", Some(token), Some(json!({"name": name})))
            .await;
        assert_eq!(status, StatusCode::CREATED, "category create failed: {body}");
        serde_json::from_value(body).unwrap()
    }

    pub async fn create_tag(&self, token: &str, name: &str) -> Tag {
        let (status, body) = self
            .request("POST", "/api/tags/", Some(token), Some(json!({"name": name})))
            .await;
        assert_eq!(status, StatusCode::CREATED, "tag create failed: {body}");
        serde_json::from_value(body).unwrap()
    }

    /// Creates an item in an existing category with the given tag names
    pub async fn create_item(&self, token: &str, sku: &str, name: &str, category: &str, tags: &[&str], stock: &str) -> Item {
        let (status, body) = self
            .request("POST", "/api/items/", Some(token), Some(item_payload(sku, name, category, tags, stock)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "item create failed: {body}");
        serde_json::from_value(body).unwrap()
    }

    /// Lists items for a query string such as `?search=Bolt`
    pub async fn list_items(&self, token: &str, query: &str) -> Vec<Item> {
        let (status, body) = self
            .request("GET", &format!("/api/items/{}", query), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK, "item list failed: {body}");
        serde_json::from_value(body["items"].clone()).unwrap()
    }
}

/// JSON body for an item create or full update
pub fn item_payload(sku: &str, name: &str, category: &str, tags: &[&str], stock: &str) -> Value {
    json!({
        "sku": sku,
        "name": name,
        "category": {"name": category},
        "tags": tags.iter().map(|t| json!({"name": t})).collect::<Vec<_>>(),
        "in_stock": true,
        "available_stock": stock,
    })
}
