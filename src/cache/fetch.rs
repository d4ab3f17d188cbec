use derive_more::Constructor;
use tracing::{debug, warn};

use crate::api::{ArticleEnvelope, ArticlesPage, Query};
use crate::article::Article;
use crate::cache::{ArticleCache, CacheState, ContextTag, LoadingGuard, PAGE_SIZE};
use crate::error::Result;

/// What an in-flight list request was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub(crate) struct FetchTicket {
    context: ContextTag,
    query: Query,
    page: u32,
    epoch: u64,
}

impl CacheState {
    fn fetch_ticket(&self) -> Option<FetchTicket> {
        let context = self.active();
        let partition = &self.registry[context];
        if !partition.needs_fetch() {
            return None;
        }
        Some(FetchTicket::new(
            context,
            self.predicate.query(),
            partition.page(),
            partition.epoch(),
        ))
    }

    /// A ticket is superseded once its partition was repaged, invalidated or
    /// cleared, or when the partition is active under a different filter.
    fn is_superseded(&self, ticket: &FetchTicket) -> bool {
        if self.registry[ticket.context].epoch() != ticket.epoch {
            return true;
        }
        self.active() == ticket.context && self.predicate.query() != ticket.query
    }
}

impl ArticleCache {
    /// Loads the active partition unless it is already populated and fresh.
    ///
    /// A failed request leaves the partition stale so the next call retries.
    pub async fn ensure_loaded(&self) -> Result<()> {
        let ticket = self.state.lock().fetch_ticket();
        let Some(ticket) = ticket else {
            debug!("Cache hit for {} partition", self.context());
            return Ok(());
        };

        debug!(
            "Fetching {:?} page {} into {} partition",
            ticket.query, ticket.page, ticket.context
        );

        let _loading = LoadingGuard::engage(&self.in_flight);
        let response = self.api.list(&ticket.query, ticket.page, PAGE_SIZE).await;

        match response {
            Ok(page) => {
                self.commit(ticket, page);
                Ok(())
            }
            Err(err) => {
                warn!("Failed to fetch {} partition: {}", ticket.context, err);
                self.state.lock().registry[ticket.context].mark_stale();
                Err(err.into())
            }
        }
    }

    fn commit(&self, ticket: FetchTicket, page: ArticlesPage) {
        let mut state = self.state.lock();

        if self.config.discard_superseded && state.is_superseded(&ticket) {
            warn!(
                "Discarding superseded response for {} partition (page {})",
                ticket.context, ticket.page
            );
            state.registry[ticket.context].mark_stale();
            return;
        }

        debug!(
            "Loaded {} of {} articles into {} partition",
            page.articles.len(),
            page.articles_count,
            ticket.context
        );
        state
            .registry
            .replace_all(ticket.context, page.articles, page.articles_count);
    }

    /// Returns one article, from the default partition when `accept_cached` allows.
    ///
    /// A fetched article is written into the default partition only.
    pub async fn load_single(&self, slug: &str, accept_cached: bool) -> Result<Article> {
        if accept_cached {
            let cached = self.get_in(slug, ContextTag::Default);
            if let Some(article) = cached {
                debug!("Serving '{}' from cache", slug);
                return Ok(article);
            }
        }

        let _loading = LoadingGuard::engage(&self.in_flight);
        let ArticleEnvelope { article } = self.api.get(slug).await?;

        self.state.lock().registry[ContextTag::Default].upsert(article.clone());
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::{ApiCall, ApiError, MockArticleApi};
    use crate::article::Profile;
    use crate::cache::Predicate;
    use crate::config::CacheConfig;
    use crate::error::CacheError;

    fn articles(prefix: &str, count: usize, tag: &str) -> Vec<Article> {
        (0..count)
            .map(|i| Article::new(format!("{prefix}{i}"), "t", Profile::new("jake")).with_tags([tag]))
            .collect()
    }

    fn setup(seed: Vec<Article>) -> (Arc<MockArticleApi>, ArticleCache) {
        let api = Arc::new(MockArticleApi::new("me").with_articles(seed));
        let cache = ArticleCache::new(api.clone(), CacheConfig::default());
        (api, cache)
    }

    #[tokio::test]
    async fn test_total_pages_from_count() {
        let (_, cache) = setup(articles("a", 23, "rust"));

        cache.ensure_loaded().await.unwrap();

        assert_eq!(cache.total_pages(), 3);
        assert_eq!(cache.articles().count(), 10);
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_second_load_is_cache_hit() {
        let (api, cache) = setup(articles("a", 3, "rust"));

        cache.ensure_loaded().await.unwrap();
        cache.ensure_loaded().await.unwrap();

        assert_eq!(api.list_call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_refetches() {
        let (api, cache) = setup(Vec::new());

        cache.ensure_loaded().await.unwrap();
        cache.ensure_loaded().await.unwrap();

        assert_eq!(api.list_call_count(), 2);
    }

    #[tokio::test]
    async fn test_routes_by_predicate() {
        let (api, cache) = setup(articles("a", 3, "rust"));

        cache.set_predicate(Predicate::tag("rust"));
        cache.set_page(2);
        cache.ensure_loaded().await.unwrap();

        assert_eq!(
            api.calls(),
            vec![ApiCall::List {
                query: Query::Tag("rust".into()),
                page: 2,
                limit: PAGE_SIZE
            }]
        );
    }

    #[tokio::test]
    async fn test_failure_leaves_partition_stale() {
        let (api, cache) = setup(articles("a", 3, "rust"));
        cache.ensure_loaded().await.unwrap();
        cache.set_page(0);

        api.fail_next(ApiError::Transport("connection refused".into()));
        let err = cache.ensure_loaded().await.unwrap_err();

        assert!(matches!(err, CacheError::Api(ApiError::Transport(_))));
        assert!(cache.partition_state(ContextTag::Default).stale);
        assert_eq!(cache.articles().count(), 3);
        assert!(!cache.is_loading());

        cache.ensure_loaded().await.unwrap();
        assert!(!cache.partition_state(ContextTag::Default).stale);
        assert_eq!(api.list_call_count(), 3);
    }

    #[tokio::test]
    async fn test_load_single_accepts_cached() {
        let (api, cache) = setup(articles("a", 3, "rust"));
        cache.ensure_loaded().await.unwrap();

        let article = cache.load_single("a1", true).await.unwrap();

        assert_eq!(article.slug, "a1");
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_load_single_fetches_into_default_only() {
        let (api, cache) = setup(articles("a", 3, "rust"));
        cache.set_predicate(Predicate::tag("rust"));

        let article = cache.load_single("a2", false).await.unwrap();

        assert_eq!(article.slug, "a2");
        assert_eq!(api.calls(), vec![ApiCall::Get("a2".into())]);
        assert!(cache.get_in("a2", ContextTag::Default).is_some());
        assert!(cache.get_in("a2", ContextTag::Tag).is_none());
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_load_single_not_cached_goes_remote() {
        let (api, cache) = setup(articles("a", 3, "rust"));

        cache.load_single("a0", true).await.unwrap();
        assert!(cache.load_single("missing", true).await.is_err());

        assert_eq!(api.call_count(), 2);
    }
}
