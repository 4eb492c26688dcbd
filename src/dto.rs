/// Request and response payloads
///
/// Payload fields are all optional on the wire so that missing or blank
/// values surface as field-level validation messages rather than opaque
/// deserialization failures. Each payload has a `validate` step that turns it
/// into the typed input the repository layer expects.

use serde::{Deserialize, Serialize};

use crate::auth::{normalize_email, password_problems};
use crate::errors::FieldErrors;
use crate::models::{Category, Item, Quantity, Tag};

pub const CATEGORY_NAME_MAX: usize = 100;
pub const TAG_NAME_MAX: usize = 100;
pub const SKU_MAX: usize = 100;
pub const ITEM_NAME_MAX: usize = 200;
pub const USERNAME_MAX: usize = 150;
pub const EMAIL_MAX: usize = 254;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Validates a trimmed, length-limited text field
///
/// Returns `None` when the field is absent (recording an error unless
/// `partial`) or invalid.
fn clean_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
    partial: bool,
) -> Option<String> {
    let Some(value) = value else {
        if !partial {
            push_error(errors, field, REQUIRED);
        }
        return None;
    };

    let value = value.trim();
    if value.is_empty() {
        push_error(errors, field, BLANK);
        return None;
    }
    if value.chars().count() > max_len {
        push_error(
            errors,
            field,
            format!("Ensure this field has no more than {} characters.", max_len),
        );
        return None;
    }
    Some(value.to_string())
}

fn finish<T>(errors: FieldErrors, value: T) -> Result<T, FieldErrors> {
    if errors.is_empty() { Ok(value) } else { Err(errors) }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

fn required_name(name: Option<&str>, max_len: usize) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    match clean_text(&mut errors, "name", name, max_len, false) {
        Some(name) => Ok(name),
        None => Err(errors),
    }
}

fn optional_name(name: Option<&str>, max_len: usize) -> Result<Option<String>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = clean_text(&mut errors, "name", name, max_len, true);
    finish(errors, name)
}

/// Payload for creating or updating a category
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CategoryDto {
    pub name: Option<String>,
}

impl CategoryDto {
    /// Validates a creation or full-update payload
    ///
    /// ### Returns
    ///
    /// The trimmed name
    pub fn validate_create(&self) -> Result<String, FieldErrors> {
        required_name(self.name.as_deref(), CATEGORY_NAME_MAX)
    }

    /// Validates a partial-update payload
    ///
    /// ### Returns
    ///
    /// The trimmed name, or `None` when the payload leaves it unchanged
    pub fn validate_update(&self) -> Result<Option<String>, FieldErrors> {
        optional_name(self.name.as_deref(), CATEGORY_NAME_MAX)
    }
}

/// Payload for creating or updating a tag
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct TagDto {
    pub name: Option<String>,
}

impl TagDto {
    /// Validates a creation or full-update payload, see [`CategoryDto::validate_create`]
    pub fn validate_create(&self) -> Result<String, FieldErrors> {
        required_name(self.name.as_deref(), TAG_NAME_MAX)
    }

    /// Validates a partial-update payload, see [`CategoryDto::validate_update`]
    pub fn validate_update(&self) -> Result<Option<String>, FieldErrors> {
        optional_name(self.name.as_deref(), TAG_NAME_MAX)
    }
}

/// A nested `{id, name}` reference to a category or tag inside an item payload
///
/// Only the name is used to resolve the reference; the id is accepted so that
/// a previously fetched item can be sent back unchanged.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct NamedRefDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: Option<String>,
}

impl NamedRefDto {
    pub fn named(name: impl Into<String>) -> Self {
        Self { id: None, name: Some(name.into()) }
    }
}

/// Payload for creating or updating an item
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ItemDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<NamedRefDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<NamedRefDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    /// Either a decimal string (`"15.00"`) or a JSON number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<serde_json::Value>,
}

/// A validated item payload for creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemInput {
    pub sku: String,
    pub name: String,
    pub category_name: String,
    pub tag_names: Vec<String>,
    pub in_stock: bool,
    pub available_stock: Quantity,
}

/// A validated item payload for update; `None` leaves a field unchanged
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemChanges {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category_name: Option<String>,
    pub tag_names: Option<Vec<String>>,
    pub in_stock: Option<bool>,
    pub available_stock: Option<Quantity>,
}

impl ItemDto {
    fn clean(&self, partial: bool, errors: &mut FieldErrors) -> ItemChanges {
        let sku = clean_text(errors, "sku", self.sku.as_deref(), SKU_MAX, partial);
        let name = clean_text(errors, "name", self.name.as_deref(), ITEM_NAME_MAX, partial);

        let category_name = match &self.category {
            Some(category) => clean_text(
                errors,
                "category.name",
                category.name.as_deref(),
                CATEGORY_NAME_MAX,
                false,
            ),
            None => {
                if !partial {
                    push_error(errors, "category", REQUIRED);
                }
                None
            }
        };

        let tag_names = match &self.tags {
            Some(tags) => {
                let mut names = Vec::with_capacity(tags.len());
                for (index, tag) in tags.iter().enumerate() {
                    let field = format!("tags[{}].name", index);
                    if let Some(name) = clean_text(errors, &field, tag.name.as_deref(), TAG_NAME_MAX, false) {
                        names.push(name);
                    }
                }
                Some(names)
            }
            None => {
                if !partial {
                    push_error(errors, "tags", REQUIRED);
                }
                None
            }
        };

        let available_stock = match &self.available_stock {
            Some(value) => match Quantity::from_json(value) {
                Ok(quantity) => Some(quantity),
                Err(e) => {
                    push_error(errors, "available_stock", e.to_string());
                    None
                }
            },
            None => {
                if !partial {
                    push_error(errors, "available_stock", REQUIRED);
                }
                None
            }
        };

        ItemChanges {
            sku,
            name,
            category_name,
            tag_names,
            in_stock: self.in_stock,
            available_stock,
        }
    }

    /// Validates a creation payload; `in_stock` defaults to `true`
    pub fn validate_create(&self) -> Result<NewItemInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let changes = self.clean(false, &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        match changes {
            ItemChanges {
                sku: Some(sku),
                name: Some(name),
                category_name: Some(category_name),
                tag_names: Some(tag_names),
                in_stock,
                available_stock: Some(available_stock),
            } => Ok(NewItemInput {
                sku,
                name,
                category_name,
                tag_names,
                in_stock: in_stock.unwrap_or(true),
                available_stock,
            }),
            // clean() records an error for every missing required field
            _ => Err(errors),
        }
    }

    /// Validates an update payload
    ///
    /// With `partial` (PATCH) any subset of fields may be present; otherwise
    /// (PUT) the same fields as for creation are required.
    pub fn validate_update(&self, partial: bool) -> Result<ItemChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let changes = self.clean(partial, &mut errors);
        finish(errors, changes)
    }
}

/// A field list results may be sorted by, with direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering<F> {
    pub field: F,
    pub descending: bool,
}

/// Fields items can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSortField {
    Id,
    Sku,
    Name,
    InStock,
    AvailableStock,
    Category,
}

/// Fields categories can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySortField {
    Id,
    Name,
}

fn parse_ordering<F>(
    errors: &mut FieldErrors,
    raw: Option<&str>,
    lookup: impl Fn(&str) -> Option<F>,
) -> Option<Ordering<F>> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    let (descending, name) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    match lookup(name) {
        Some(field) => Some(Ordering { field, descending }),
        None => {
            push_error(errors, "ordering", format!("Cannot order by unknown field \"{}\".", name));
            None
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Query parameters for `GET /api/items/`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ItemListQuery {
    /// Case-insensitive exact match on the item name
    pub search: Option<String>,
    /// Category ID
    pub category: Option<String>,
    /// Field name, `-` prefixed for descending
    pub ordering: Option<String>,
}

/// Validated item listing filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemFilter {
    pub name: Option<String>,
    pub category_id: Option<i32>,
    pub ordering: Option<Ordering<ItemSortField>>,
}

impl ItemListQuery {
    pub fn validate(&self) -> Result<ItemFilter, FieldErrors> {
        let mut errors = FieldErrors::new();

        let category_id = match non_empty(self.category.as_deref()) {
            Some(raw) => match raw.trim().parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    push_error(&mut errors, "category", "A valid integer is required.");
                    None
                }
            },
            None => None,
        };

        let ordering = parse_ordering(&mut errors, self.ordering.as_deref(), |name| match name {
            "id" => Some(ItemSortField::Id),
            "sku" => Some(ItemSortField::Sku),
            "name" => Some(ItemSortField::Name),
            "in_stock" => Some(ItemSortField::InStock),
            "available_stock" => Some(ItemSortField::AvailableStock),
            "category" | "category_id" => Some(ItemSortField::Category),
            _ => None,
        });

        finish(
            errors,
            ItemFilter {
                name: non_empty(self.search.as_deref()),
                category_id,
                ordering,
            },
        )
    }
}

/// Query parameters for `GET /api/categories/`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CategoryListQuery {
    /// Case-insensitive substring of the category name
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Validated category listing filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryFilter {
    pub search: Option<String>,
    pub ordering: Option<Ordering<CategorySortField>>,
}

impl CategoryListQuery {
    pub fn validate(&self) -> Result<CategoryFilter, FieldErrors> {
        let mut errors = FieldErrors::new();
        let ordering = parse_ordering(&mut errors, self.ordering.as_deref(), |name| match name {
            "id" => Some(CategorySortField::Id),
            "name" => Some(CategorySortField::Name),
            _ => None,
        });
        finish(
            errors,
            CategoryFilter {
                search: non_empty(self.search.as_deref()),
                ordering,
            },
        )
    }
}

/// Query parameters for `GET /api/tags/`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct TagListQuery {
    /// Case-insensitive substring of the tag name
    pub search: Option<String>,
}

impl TagListQuery {
    pub fn search(&self) -> Option<String> {
        non_empty(self.search.as_deref())
    }
}

/// Response body for `GET /api/items/`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ItemList {
    pub items: Vec<Item>,
}

/// Response body for `GET /api/categories/`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CategoryList {
    pub categories: Vec<Category>,
}

/// Response body for `GET /api/tags/`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TagList {
    pub tags: Vec<Tag>,
}

/// Payload for `POST /register/`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RegisterDto {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A validated registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

fn clean_email(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let email = clean_text(errors, field, value, EMAIL_MAX, false)?;
    if is_valid_email(&email) {
        Some(normalize_email(&email))
    } else {
        push_error(errors, field, "Enter a valid email address.");
        None
    }
}

fn clean_password(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    match value {
        Some(password) if !password.is_empty() => Some(password.to_string()),
        Some(_) => {
            push_error(errors, field, BLANK);
            None
        }
        None => {
            push_error(errors, field, REQUIRED);
            None
        }
    }
}

impl RegisterDto {
    pub fn validate(&self) -> Result<NewAccount, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = clean_text(&mut errors, "username", self.username.as_deref(), USERNAME_MAX, false);
        if let Some(ref name) = username {
            if !name.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
                push_error(
                    &mut errors,
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }
        let email = clean_email(&mut errors, "email", self.email.as_deref());
        let password = clean_password(&mut errors, "password", self.password.as_deref());

        if let Some(ref password) = password {
            for problem in password_problems(password, username.as_deref(), email.as_deref()) {
                push_error(&mut errors, "password", problem);
            }
        }

        match (username, email, password) {
            (Some(username), Some(email), Some(password)) if errors.is_empty() => {
                Ok(NewAccount { username, email, password })
            }
            _ => Err(errors),
        }
    }
}

/// Response body for `POST /register/`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDto {
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Payload for `POST /login/`
///
/// `username` may hold either a username or an email address.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LoginDto {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login identifier, told apart by the presence of `@`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Username(String),
    Email(String),
}

impl LoginDto {
    pub fn validate(&self) -> Result<(LoginIdentifier, String), FieldErrors> {
        let mut errors = FieldErrors::new();
        let identifier = clean_text(&mut errors, "username", self.username.as_deref(), EMAIL_MAX, false)
            .map(|id| {
                if id.contains('@') {
                    LoginIdentifier::Email(normalize_email(&id))
                } else {
                    LoginIdentifier::Username(id)
                }
            });
        let password = clean_password(&mut errors, "password", self.password.as_deref());

        match (identifier, password) {
            (Some(identifier), Some(password)) => Ok((identifier, password)),
            _ => Err(errors),
        }
    }
}

/// Response body for `POST /login/`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenDto {
    pub token: String,
}

/// Response body carrying a human-readable message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Payload for `POST /password_reset/`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PasswordResetRequestDto {
    pub email: Option<String>,
}

impl PasswordResetRequestDto {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = clean_email(&mut errors, "email", self.email.as_deref());
        match email {
            Some(email) => Ok(email),
            None => Err(errors),
        }
    }
}

/// Payload for `POST /password_reset/confirm/`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PasswordResetConfirmDto {
    pub email: Option<String>,
    pub token: Option<String>,
    pub new_password: Option<String>,
    pub new_password_confirm: Option<String>,
}

/// A validated password reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

impl PasswordResetConfirmDto {
    pub fn validate(&self) -> Result<PasswordReset, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = clean_email(&mut errors, "email", self.email.as_deref());
        let token = clean_text(&mut errors, "token", self.token.as_deref(), 128, false);
        let new_password = clean_password(&mut errors, "new_password", self.new_password.as_deref());
        let confirm = clean_password(&mut errors, "new_password_confirm", self.new_password_confirm.as_deref());

        if let Some(ref password) = new_password {
            for problem in password_problems(password, None, email.as_deref()) {
                push_error(&mut errors, "new_password", problem);
            }
            if confirm.as_ref().is_some_and(|c| c != password) {
                push_error(&mut errors, "new_password_confirm", "Password fields didn't match.");
            }
        }

        match (email, token, new_password) {
            (Some(email), Some(token), Some(new_password)) if errors.is_empty() => {
                Ok(PasswordReset { email, token, new_password })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests;
