pub mod api;
pub mod article;
pub mod cache;
pub mod config;
pub mod error;

pub use cache::{ArticleCache, ContextTag, Predicate};
pub use error::{CacheError, Result};
