use tracing::{debug, info, warn};

use crate::api::ArticleEnvelope;
use crate::article::{Article, ArticleUpdate, NewArticle};
use crate::cache::{ArticleCache, ContextTag, PartitionRegistry};
use crate::error::Result;

/// Favorite state of one copy before an optimistic toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UndoEntry {
    context: ContextTag,
    favorited: bool,
    favorites_count: u32,
    applied_count: u32,
}

/// Copies changed by one optimistic toggle, restorable if the server refuses.
#[derive(Debug, Default)]
struct UndoLog {
    slug: String,
    target: bool,
    entries: Vec<UndoEntry>,
}

impl UndoLog {
    /// Applies `target` to every cached copy of `slug` not already in that state.
    fn apply(registry: &mut PartitionRegistry, slug: &str, target: bool) -> Self {
        let mut log = UndoLog {
            slug: slug.to_string(),
            target,
            entries: Vec::new(),
        };

        for context in registry.holders(slug) {
            let Some(article) = registry[context].get_mut(slug) else {
                continue;
            };
            let (favorited, favorites_count) = (article.favorited, article.favorites_count);
            if article.apply_favorite(target) {
                log.entries.push(UndoEntry {
                    context,
                    favorited,
                    favorites_count,
                    applied_count: article.favorites_count,
                });
            }
        }
        log
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restores every copy still showing the optimistic state. Copies replaced
    /// or cleared in the meantime are left alone.
    fn rollback(self, registry: &mut PartitionRegistry) -> usize {
        let mut restored = 0;
        for entry in &self.entries {
            match registry[entry.context].get_mut(&self.slug) {
                Some(article)
                    if article.favorited == self.target
                        && article.favorites_count == entry.applied_count =>
                {
                    article.favorited = entry.favorited;
                    article.favorites_count = entry.favorites_count;
                    restored += 1;
                }
                _ => debug!(
                    "Copy of '{}' in {} partition changed since toggle, not restoring",
                    self.slug, entry.context
                ),
            }
        }
        restored
    }
}

impl ArticleCache {
    /// Optimistically moves every cached copy of `slug` to `target`, then
    /// confirms with the server. On failure the changed copies are rolled back.
    ///
    /// Nothing is sent when no cached copy needed to change.
    pub async fn toggle_favorite(&self, slug: &str, target: bool) -> Result<()> {
        let undo = UndoLog::apply(&mut self.state.lock().registry, slug, target);
        if undo.is_empty() {
            debug!("'{}' already has favorited={} everywhere", slug, target);
            return Ok(());
        }

        debug!(
            "Optimistically set favorited={} on '{}' in {} partitions",
            target,
            slug,
            undo.entries.len()
        );

        let result = if target {
            self.api.favorite(slug).await
        } else {
            self.api.unfavorite(slug).await
        };

        match result {
            Ok(()) => {
                info!("Confirmed favorited={} for '{}'", target, slug);
                Ok(())
            }
            Err(err) => {
                let restored = undo.rollback(&mut self.state.lock().registry);
                warn!(
                    "Favorite toggle for '{}' failed, rolled back {} copies: {}",
                    slug, restored, err
                );
                Err(err.into())
            }
        }
    }

    pub async fn favorite(&self, slug: &str) -> Result<()> {
        self.toggle_favorite(slug, true).await
    }

    pub async fn unfavorite(&self, slug: &str) -> Result<()> {
        self.toggle_favorite(slug, false).await
    }

    /// Creates an article. Every partition is cleared afterwards since
    /// ordering and counts are no longer valid.
    pub async fn create_article(&self, article: NewArticle) -> Result<Article> {
        let ArticleEnvelope { article } = self.api.create(article).await?;
        info!("Created article '{}'", article.slug);
        self.clear_all();
        Ok(article)
    }

    /// Saves an edit and refreshes the copies in partitions already holding it.
    pub async fn update_article(&self, update: ArticleUpdate) -> Result<Article> {
        let ArticleEnvelope { article } = self.api.update(update).await?;
        let touched = self.state.lock().registry.propagate_update(&article);
        info!(
            "Updated article '{}' in {} partitions",
            article.slug,
            touched.len()
        );
        Ok(article)
    }

    /// Clears every partition up front, then deletes remotely. If the server
    /// refuses, the active partition is reloaded before the error is returned.
    pub async fn delete_article(&self, slug: &str) -> Result<()> {
        self.clear_all();

        let result = self.api.delete(slug).await;
        match result {
            Ok(()) => {
                info!("Deleted article '{}'", slug);
                Ok(())
            }
            Err(err) => {
                warn!("Failed to delete '{}', reloading: {}", slug, err);
                if let Err(reload) = self.ensure_loaded().await {
                    warn!("Reload after failed delete also failed: {}", reload);
                }
                Err(err.into())
            }
        }
    }
}
