use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use stockroom::dto::{
    CategoryDto, CategoryList, CategoryListQuery, ItemDto, ItemList, ItemListQuery, LoginDto, MessageDto,
    PasswordResetConfirmDto, PasswordResetRequestDto, RegisterDto, RegisteredDto, TagDto, TagList, TagListQuery,
    TokenDto,
};
use stockroom::models::{Category, Item, Tag};
use thiserror::Error;

/// Error type for CLI client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server returned an error status with a message body
    #[error("Server error ({}): {message}", .status.as_u16())]
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

/// Flattens an error body into one line
///
/// Bodies are either `{"detail": ...}`, `{"error": ...}` or a map of field
/// names to message lists.
fn error_message(body: &Value) -> String {
    for key in ["detail", "error"] {
        if let Some(message) = body.get(key).and_then(Value::as_str) {
            return message.to_string();
        }
    }

    match body.as_object() {
        Some(fields) if !fields.is_empty() => fields
            .iter()
            .map(|(field, messages)| {
                let joined = match messages.as_array() {
                    Some(list) => list.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(" "),
                    None => messages.to_string(),
                };
                format!("{}: {}", field, joined)
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => "Unknown error".to_string(),
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = match self.json::<Value>().await {
            Ok(body) => error_message(&body),
            Err(_) => format!("HTTP {}", status),
        };
        Err(ClientError::Server { status, message })
    }
}

/// HTTP client wrapper for communicating with the Stockroom server
pub struct StockroomClient {
    /// The base URL of the server (e.g. "http://localhost:3000")
    base_url: String,
    /// API token sent as `Authorization: Token <key>`
    token: Option<String>,
    client: Client,
}

impl StockroomClient {
    /// Creates a new StockroomClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the Stockroom server
    /// * `token` - The API token for protected endpoints, if logged in
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Token {}", token)),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorized(request).send().await?.check().await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.authorized(request).send().await?.check().await?;
        Ok(())
    }

    // ── Auth endpoints ───────────────────────────────────────────────

    /// Registers a new account and returns it with its token
    pub async fn register(&self, username: String, email: String, password: String) -> Result<RegisteredDto, ClientError> {
        let dto = RegisterDto {
            username: Some(username),
            email: Some(email),
            password: Some(password),
        };
        self.send(self.client.post(self.url("/register/")).json(&dto)).await
    }

    /// Exchanges a username or email and password for a token
    pub async fn login(&self, username: String, password: String) -> Result<TokenDto, ClientError> {
        let dto = LoginDto {
            username: Some(username),
            password: Some(password),
        };
        self.send(self.client.post(self.url("/login/")).json(&dto)).await
    }

    /// Revokes the current token
    pub async fn logout(&self) -> Result<MessageDto, ClientError> {
        self.send(self.client.post(self.url("/logout/"))).await
    }

    /// Asks the server to send a reset token for an email address
    pub async fn request_password_reset(&self, email: String) -> Result<MessageDto, ClientError> {
        let dto = PasswordResetRequestDto { email: Some(email) };
        self.send(self.client.post(self.url("/password_reset/")).json(&dto)).await
    }

    /// Sets a new password using a reset token
    pub async fn confirm_password_reset(&self, dto: &PasswordResetConfirmDto) -> Result<MessageDto, ClientError> {
        self.send(self.client.post(self.url("/password_reset/confirm/")).json(dto)).await
    }

    // ── Item endpoints ───────────────────────────────────────────────

    /// Lists items matching the query
    pub async fn list_items(&self, query: &ItemListQuery) -> Result<Vec<Item>, ClientError> {
        let list: ItemList = self.send(self.client.get(self.url("/api/items/")).query(query)).await?;
        Ok(list.items)
    }

    pub async fn get_item(&self, id: i32) -> Result<Item, ClientError> {
        self.send(self.client.get(self.url(&format!("/api/items/{}/", id)))).await
    }

    pub async fn create_item(&self, dto: &ItemDto) -> Result<Item, ClientError> {
        self.send(self.client.post(self.url("/api/items/")).json(dto)).await
    }

    /// Partially updates an item; absent fields are left unchanged
    pub async fn update_item(&self, id: i32, dto: &ItemDto) -> Result<Item, ClientError> {
        self.send(self.client.patch(self.url(&format!("/api/items/{}/", id))).json(dto)).await
    }

    pub async fn delete_item(&self, id: i32) -> Result<(), ClientError> {
        self.send_empty(self.client.delete(self.url(&format!("/api/items/{}/", id)))).await
    }

    // ── Category endpoints ───────────────────────────────────────────

    pub async fn list_categories(&self, query: &CategoryListQuery) -> Result<Vec<Category>, ClientError> {
        let list: CategoryList = self.send(self.client.get(self.url("/api/categories/")).query(query)).await?;
        Ok(list.categories)
    }

    pub async fn get_category(&self, id: i32) -> Result<Category, ClientError> {
        self.send(self.client.get(self.url(&format!("/api/categories/{}/", id)))).await
    }

    pub async fn create_category(&self, name: String) -> Result<Category, ClientError> {
        let dto = CategoryDto { name: Some(name) };
        self.send(self.client.post(self.url("/api/categories/")).json(&dto)).await
    }

    pub async fn rename_category(&self, id: i32, name: String) -> Result<Category, ClientError> {
        let dto = CategoryDto { name: Some(name) };
        self.send(self.client.patch(self.url(&format!("/api/categories/{}/", id))).json(&dto)).await
    }

    /// Deletes a category; the server also deletes its items
    pub async fn delete_category(&self, id: i32) -> Result<(), ClientError> {
        self.send_empty(self.client.delete(self.url(&format!("/api/categories/{}/", id)))).await
    }

    // ── Tag endpoints ────────────────────────────────────────────────

    pub async fn list_tags(&self, query: &TagListQuery) -> Result<Vec<Tag>, ClientError> {
        let list: TagList = self.send(self.client.get(self.url("/api/tags/")).query(query)).await?;
        Ok(list.tags)
    }

    pub async fn get_tag(&self, id: i32) -> Result<Tag, ClientError> {
        self.send(self.client.get(self.url(&format!("/api/tags/{}/", id)))).await
    }

    pub async fn create_tag(&self, name: String) -> Result<Tag, ClientError> {
        let dto = TagDto { name: Some(name) };
        self.send(self.client.post(self.url("/api/tags/")).json(&dto)).await
    }

    pub async fn rename_tag(&self, id: i32, name: String) -> Result<Tag, ClientError> {
        let dto = TagDto { name: Some(name) };
        self.send(self.client.patch(self.url(&format!("/api/tags/{}/", id))).json(&dto)).await
    }

    pub async fn delete_tag(&self, id: i32) -> Result<(), ClientError> {
        self.send_empty(self.client.delete(self.url(&format!("/api/tags/{}/", id)))).await
    }
}
