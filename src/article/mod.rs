pub mod types;

pub use types::{Article, ArticleUpdate, NewArticle, Profile};
