pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::ArticleApi;
pub use error::{ApiError, ValidationErrors};
pub use mock::{ApiCall, MockArticleApi};
pub use types::*;
