use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::dto::{TagDto, TagList, TagListQuery};
use crate::errors::ApiError;
use crate::models::Tag;
use crate::repo;

use super::parse_id;

/// Handler for creating a new tag
///
/// This function handles POST requests to `/api/tags/`. Tag names need not
/// be unique.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `payload` - The request payload containing the tag name
///
/// ### Returns
///
/// 201 with the newly created tag
#[instrument(skip(pool, payload))]
pub async fn create_tag_handler(
    State(pool): State<Arc<DbPool>>,
    payload: Result<Json<TagDto>, JsonRejection>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let Json(payload) = payload?;
    let name = payload.validate_create()?;

    info!("Creating new tag");
    let tag = repo::create_tag(&pool, &name)?;

    info!("Successfully created tag with id: {}", tag.get_id());
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Handler for listing tags
///
/// This function handles GET requests to `/api/tags/`, with an optional
/// `search` query parameter.
#[instrument(skip(pool))]
pub async fn list_tags_handler(
    State(pool): State<Arc<DbPool>>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<TagList>, ApiError> {
    debug!("Listing tags");

    let tags = repo::list_tags(&pool, query.search().as_deref())?;

    info!("Retrieved {} tags", tags.len());
    Ok(Json(TagList { tags }))
}

/// Handler for retrieving a specific tag
///
/// This function handles GET requests to `/api/tags/{id}/`.
#[instrument(skip(pool))]
pub async fn get_tag_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
) -> Result<Json<Tag>, ApiError> {
    let id = parse_id(&id)?;

    let tag = repo::get_tag(&pool, id)?.ok_or(ApiError::NotFound)?;

    Ok(Json(tag))
}

async fn update_tag(pool: &DbPool, id: &str, name: Option<String>) -> Result<Json<Tag>, ApiError> {
    let id = parse_id(id)?;

    let tag = match name {
        Some(name) => repo::update_tag(pool, id, &name)?,
        None => repo::get_tag(pool, id)?,
    };

    let tag = tag.ok_or(ApiError::NotFound)?;
    info!("Updated tag {}", tag.get_id());
    Ok(Json(tag))
}

/// Handler for replacing a tag
///
/// This function handles PUT requests to `/api/tags/{id}/`.
#[instrument(skip(pool, payload))]
pub async fn replace_tag_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
    payload: Result<Json<TagDto>, JsonRejection>,
) -> Result<Json<Tag>, ApiError> {
    let Json(payload) = payload?;
    let name = payload.validate_create()?;
    update_tag(&pool, &id, Some(name)).await
}

/// Handler for partially updating a tag
///
/// This function handles PATCH requests to `/api/tags/{id}/`.
#[instrument(skip(pool, payload))]
pub async fn patch_tag_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
    payload: Result<Json<TagDto>, JsonRejection>,
) -> Result<Json<Tag>, ApiError> {
    let Json(payload) = payload?;
    let name = payload.validate_update()?;
    update_tag(&pool, &id, name).await
}

/// Handler for deleting a tag
///
/// This function handles DELETE requests to `/api/tags/{id}/`. The tag is
/// removed from every item that carried it.
#[instrument(skip(pool))]
pub async fn delete_tag_handler(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    if !repo::delete_tag(&pool, id)? {
        return Err(ApiError::NotFound);
    }

    info!("Deleted tag {}", id);
    Ok(StatusCode::NO_CONTENT)
}
