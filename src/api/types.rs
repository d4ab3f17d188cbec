use derive_more::Constructor;
use serde::{Deserialize, Serialize};

use crate::article::Article;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Constructor)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesPage {
    pub articles: Vec<Article>,
    pub articles_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Constructor)]
pub struct ArticleEnvelope {
    pub article: Article,
}

/// The list endpoint a fetch is routed to, carrying its filter argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    Feed,
    FavoritedBy(String),
    Tag(String),
    Author(String),
    All,
}
