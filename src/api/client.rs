use async_trait::async_trait;

use crate::api::error::ApiError;
use crate::api::types::{ArticleEnvelope, ArticlesPage, Query};
use crate::article::{ArticleUpdate, NewArticle};

/// The remote article endpoints the cache depends on.
///
/// Pages are zero-based; `limit` is the page size.
#[async_trait]
pub trait ArticleApi: Send + Sync {
    async fn feed(&self, page: u32, limit: u32) -> Result<ArticlesPage, ApiError>;

    async fn favorited_by(&self, user: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError>;

    async fn by_tag(&self, tag: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError>;

    async fn by_author(&self, author: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError>;

    async fn all(&self, page: u32, limit: u32) -> Result<ArticlesPage, ApiError>;

    async fn get(&self, slug: &str) -> Result<ArticleEnvelope, ApiError>;

    async fn favorite(&self, slug: &str) -> Result<(), ApiError>;

    async fn unfavorite(&self, slug: &str) -> Result<(), ApiError>;

    async fn create(&self, article: NewArticle) -> Result<ArticleEnvelope, ApiError>;

    async fn update(&self, update: ArticleUpdate) -> Result<ArticleEnvelope, ApiError>;

    async fn delete(&self, slug: &str) -> Result<(), ApiError>;

    /// Routes a list query to its endpoint.
    async fn list(&self, query: &Query, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        match query {
            Query::Feed => self.feed(page, limit).await,
            Query::FavoritedBy(user) => self.favorited_by(user, page, limit).await,
            Query::Tag(tag) => self.by_tag(tag, page, limit).await,
            Query::Author(author) => self.by_author(author, page, limit).await,
            Query::All => self.all(page, limit).await,
        }
    }
}
