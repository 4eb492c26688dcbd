/// Data models module
///
/// This module defines the core data structures used throughout the application.
/// It includes database models that map to database tables and the expanded
/// item representation returned by the API.

mod quantity;
pub use quantity::{Quantity, QuantityError};

mod category;
pub use category::{Category, NewCategory};

mod tag;
pub use tag::{NewTag, Tag};

mod item;
pub use item::{Item, ItemRow, NewItemRow};

mod item_tag;
pub use item_tag::ItemTag;

mod user;
pub use user::{NewUser, User};

mod auth_token;
pub use auth_token::AuthToken;
