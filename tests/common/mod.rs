#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use article_cache::api::{ApiError, ArticleApi, ArticleEnvelope, ArticlesPage, MockArticleApi};
use article_cache::article::{Article, ArticleUpdate, NewArticle, Profile};

pub fn article(slug: &str, author: &str, tags: &[&str]) -> Article {
    Article::new(slug, slug, Profile::new(author)).with_tags(tags.iter().copied())
}

pub fn numbered(prefix: &str, count: usize, author: &str, tags: &[&str]) -> Vec<Article> {
    (0..count)
        .map(|i| article(&format!("{prefix}-{i}"), author, tags))
        .collect()
}

/// Wraps [`MockArticleApi`] so every request waits for a permit.
pub struct GatedApi {
    pub inner: Arc<MockArticleApi>,
    gate: Semaphore,
}

impl GatedApi {
    pub fn new(inner: MockArticleApi) -> Self {
        Self {
            inner: Arc::new(inner),
            gate: Semaphore::new(0),
        }
    }

    /// Lets `count` more requests through.
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    async fn pass(&self) {
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
    }
}

#[async_trait]
impl ArticleApi for GatedApi {
    async fn feed(&self, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        self.pass().await;
        self.inner.feed(page, limit).await
    }

    async fn favorited_by(&self, user: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        self.pass().await;
        self.inner.favorited_by(user, page, limit).await
    }

    async fn by_tag(&self, tag: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        self.pass().await;
        self.inner.by_tag(tag, page, limit).await
    }

    async fn by_author(&self, author: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        self.pass().await;
        self.inner.by_author(author, page, limit).await
    }

    async fn all(&self, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        self.pass().await;
        self.inner.all(page, limit).await
    }

    async fn get(&self, slug: &str) -> Result<ArticleEnvelope, ApiError> {
        self.pass().await;
        self.inner.get(slug).await
    }

    async fn favorite(&self, slug: &str) -> Result<(), ApiError> {
        self.pass().await;
        self.inner.favorite(slug).await
    }

    async fn unfavorite(&self, slug: &str) -> Result<(), ApiError> {
        self.pass().await;
        self.inner.unfavorite(slug).await
    }

    async fn create(&self, article: NewArticle) -> Result<ArticleEnvelope, ApiError> {
        self.pass().await;
        self.inner.create(article).await
    }

    async fn update(&self, update: ArticleUpdate) -> Result<ArticleEnvelope, ApiError> {
        self.pass().await;
        self.inner.update(update).await
    }

    async fn delete(&self, slug: &str) -> Result<(), ApiError> {
        self.pass().await;
        self.inner.delete(slug).await
    }
}
