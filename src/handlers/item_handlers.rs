use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::dto::{ItemDto, ItemList, ItemListQuery};
use crate::errors::ApiError;
use crate::models::Item;
use crate::repo::{self, ItemWriteError};

use super::parse_id;

impl From<ItemWriteError> for ApiError {
    fn from(err: ItemWriteError) -> Self {
        let message = err.to_string();
        match err {
            ItemWriteError::UnknownCategory(_) => ApiError::field("category", message),
            ItemWriteError::DuplicateSku => ApiError::field("sku", message),
            ItemWriteError::Other(e) => ApiError::Database(e),
        }
    }
}

/// Handler for creating a new item
///
/// This function handles POST requests to `/api/items/`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `payload` - The item with its category and tags given by name
///
/// ### Returns
///
/// 201 with the newly created item, its category and tags expanded
#[instrument(skip(pool, payload))]
pub async fn create_item_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract and deserialize the JSON request body
    payload: Result<Json<ItemDto>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(payload) = payload?;
    let input = payload.validate_create()?;

    info!("Creating new item with sku: {}", input.sku);
    let item = repo::create_item(&pool, &input)?;

    info!("Successfully created item with id: {}", item.get_id());
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for listing items
///
/// This function handles GET requests to `/api/items/`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `query` - Optional `search` (exact name, any case), `category` (ID) and
///   `ordering` (field name, `-` prefixed for descending)
///
/// ### Returns
///
/// `{"items": [...]}` with every matching item
#[instrument(skip(pool))]
pub async fn list_items_handler(
    State(pool): State<Arc<DbPool>>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<ItemList>, ApiError> {
    let filter = query.validate()?;
    debug!("Listing items with filter: {:?}", filter);

    let items = repo::list_items(&pool, &filter)?;

    info!("Retrieved {} items", items.len());
    Ok(Json(ItemList { items }))
}

/// Handler for retrieving a specific item
///
/// This function handles GET requests to `/api/items/{id}/`.
///
/// ### Returns
///
/// The requested item, or 404 if no item has that ID
#[instrument(skip(pool))]
pub async fn get_item_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let id = parse_id(&id)?;

    let item = repo::get_item(&pool, id)?.ok_or_else(|| {
        debug!("Item {} not found", id);
        ApiError::NotFound
    })?;

    Ok(Json(item))
}

async fn update_item(pool: &DbPool, id: &str, payload: ItemDto, partial: bool) -> Result<Json<Item>, ApiError> {
    let id = parse_id(id)?;
    let changes = payload.validate_update(partial)?;

    let item = repo::update_item(pool, id, &changes)?.ok_or(ApiError::NotFound)?;

    info!("Updated item {}", item.get_id());
    Ok(Json(item))
}

/// Handler for replacing an item
///
/// This function handles PUT requests to `/api/items/{id}/`; all fields
/// required at creation are required here too.
#[instrument(skip(pool, payload))]
pub async fn replace_item_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
    payload: Result<Json<ItemDto>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Json(payload) = payload?;
    update_item(&pool, &id, payload, false).await
}

/// Handler for partially updating an item
///
/// This function handles PATCH requests to `/api/items/{id}/`. Only the
/// fields present are changed; a `tags` list replaces the item's tags.
#[instrument(skip(pool, payload))]
pub async fn patch_item_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
    payload: Result<Json<ItemDto>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Json(payload) = payload?;
    update_item(&pool, &id, payload, true).await
}

/// Handler for deleting an item
///
/// This function handles DELETE requests to `/api/items/{id}/`.
#[instrument(skip(pool))]
pub async fn delete_item_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    if !repo::delete_item(&pool, id)? {
        return Err(ApiError::NotFound);
    }

    info!("Deleted item {}", id);
    Ok(StatusCode::NO_CONTENT)
}
