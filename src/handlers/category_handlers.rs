use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::dto::{CategoryDto, CategoryList, CategoryListQuery};
use crate::errors::{is_unique_violation, ApiError};
use crate::models::Category;
use crate::repo;

use super::parse_id;

/// Maps a duplicate category name to its dedicated error
fn category_write_error(err: anyhow::Error) -> ApiError {
    if is_unique_violation(&err, "categories.name") {
        debug!("Category name already taken");
        ApiError::DuplicateCategory
    } else {
        ApiError::Database(err)
    }
}

/// Handler for creating a new category
///
/// This function handles POST requests to `/api/categories/`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `payload` - The request payload containing the category name
///
/// ### Returns
///
/// 201 with the newly created category, or 400 if the name is taken
#[instrument(skip(pool, payload))]
pub async fn create_category_handler(
    State(pool): State<Arc<DbPool>>,
    payload: Result<Json<CategoryDto>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let Json(payload) = payload?;
    let name = payload.validate_create()?;

    info!("Creating new category");
    let category = repo::create_category(&pool, &name).map_err(category_write_error)?;

    info!("Successfully created category with id: {}", category.get_id());
    Ok((StatusCode::CREATED, Json(category)))
}

/// Handler for listing categories
///
/// This function handles GET requests to `/api/categories/`, with optional
/// `search` and `ordering` query parameters.
#[instrument(skip(pool))]
pub async fn list_categories_handler(
    State(pool): State<Arc<DbPool>>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<CategoryList>, ApiError> {
    let filter = query.validate()?;

    let categories = repo::list_categories(&pool, &filter)?;

    info!("Retrieved {} categories", categories.len());
    Ok(Json(CategoryList { categories }))
}

/// Handler for retrieving a specific category
///
/// This function handles GET requests to `/api/categories/{id}/`.
#[instrument(skip(pool))]
pub async fn get_category_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_id(&id)?;

    let category = repo::get_category(&pool, id)?.ok_or(ApiError::NotFound)?;

    Ok(Json(category))
}

async fn update_category(pool: &DbPool, id: &str, name: Option<String>) -> Result<Json<Category>, ApiError> {
    let id = parse_id(id)?;

    let category = match name {
        Some(name) => repo::update_category(pool, id, &name).map_err(category_write_error)?,
        None => repo::get_category(pool, id)?,
    };

    let category = category.ok_or(ApiError::NotFound)?;
    info!("Updated category {}", category.get_id());
    Ok(Json(category))
}

/// Handler for replacing a category
///
/// This function handles PUT requests to `/api/categories/{id}/`; the name
/// is required.
#[instrument(skip(pool, payload))]
pub async fn replace_category_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
    payload: Result<Json<CategoryDto>, JsonRejection>,
) -> Result<Json<Category>, ApiError> {
    let Json(payload) = payload?;
    let name = payload.validate_create()?;
    update_category(&pool, &id, Some(name)).await
}

/// Handler for partially updating a category
///
/// This function handles PATCH requests to `/api/categories/{id}/`.
#[instrument(skip(pool, payload))]
pub async fn patch_category_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
    payload: Result<Json<CategoryDto>, JsonRejection>,
) -> Result<Json<Category>, ApiError> {
    let Json(payload) = payload?;
    let name = payload.validate_update()?;
    update_category(&pool, &id, name).await
}

/// Handler for deleting a category
///
/// This function handles DELETE requests to `/api/categories/{id}/`.
/// Items in the category are deleted with it.
#[instrument(skip(pool))]
pub async fn delete_category_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    if !repo::delete_category(&pool, id)? {
        return Err(ApiError::NotFound);
    }

    info!("Deleted category {}", id);
    Ok(StatusCode::NO_CONTENT)
}
