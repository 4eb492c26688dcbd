/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP request,
/// extracting the necessary data, calling the appropriate repository functions,
/// and returning a properly formatted response.

mod item_handlers;
mod category_handlers;
mod tag_handlers;
mod auth_handlers;

// Re-export all handlers
pub use item_handlers::*;
pub use category_handlers::*;
pub use tag_handlers::*;
pub use auth_handlers::*;

use crate::errors::ApiError;

/// Parses a path ID; anything that is not an integer names no record
pub(crate) fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}
