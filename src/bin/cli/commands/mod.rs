pub mod auth;
pub mod category;
pub mod item;
pub mod tag;
