//! Partitioned article cache.
//!
//! Each [`ContextTag`] owns one [`Partition`] of the [`PartitionRegistry`]. The
//! active partition is derived from the current [`Predicate`] on every access,
//! so switching filters back and forth serves cached pages without refetching.
//!
//! State lives behind a mutex that is never held across a request, so every
//! operation exposes either the state before or after its changes. Requests are
//! never cancelled; a list response that lands after its partition was repaged,
//! re-filtered or cleared is dropped unless `discard_superseded` is turned off.

pub mod context;
pub mod fetch;
pub mod mutation;
pub mod partition;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::api::ArticleApi;
use crate::article::Article;
use crate::config::CacheConfig;

pub use context::{resolve_context, ContextTag, Predicate};
pub use partition::{Partition, PartitionRegistry, PartitionState, PAGE_SIZE};

#[derive(Debug, Default)]
struct CacheState {
    registry: PartitionRegistry,
    predicate: Predicate,
    // Last filter values seen, kept while other contexts are active.
    last_favorited_by: Option<String>,
    last_author: Option<String>,
}

impl CacheState {
    fn active(&self) -> ContextTag {
        self.predicate.context()
    }
}

pub struct ArticleCache {
    api: Arc<dyn ArticleApi>,
    config: CacheConfig,
    state: Mutex<CacheState>,
    in_flight: AtomicUsize,
}

/// Holds the loading flag up for as long as it lives.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn engage(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ArticleCache {
    pub fn new(api: Arc<dyn ArticleApi>, config: CacheConfig) -> Self {
        Self {
            api,
            config,
            state: Mutex::new(CacheState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn predicate(&self) -> Predicate {
        self.state.lock().predicate.clone()
    }

    pub fn context(&self) -> ContextTag {
        self.state.lock().active()
    }

    /// Switches the active filter.
    ///
    /// Setting `favorited_by` or `author` to a value other than the last one
    /// seen marks the newly active partition stale.
    pub fn set_predicate(&self, predicate: Predicate) {
        let mut state = self.state.lock();
        if state.predicate == predicate {
            return;
        }

        let mut invalidate = false;
        if let Some(user) = predicate.favorited_by_value() {
            if state.last_favorited_by.as_deref() != Some(user) {
                state.last_favorited_by = Some(user.to_string());
                invalidate = true;
            }
        }
        if let Some(author) = predicate.author_value() {
            if state.last_author.as_deref() != Some(author) {
                state.last_author = Some(author.to_string());
                invalidate = true;
            }
        }

        state.predicate = predicate;
        let context = state.active();
        if invalidate {
            debug!("Filter changed, {} partition marked stale", context);
            state.registry[context].invalidate();
        }
    }

    /// Moves the active partition to `page`; the next load refetches it.
    pub fn set_page(&self, page: u32) {
        let mut state = self.state.lock();
        let context = state.active();
        state.registry.set_page(context, page);
        debug!("{} partition moved to page {}", context, page);
    }

    /// Articles of the active partition, in server order.
    ///
    /// Each call re-reads the partition, so the returned iterator reflects the
    /// state at call time.
    pub fn articles(&self) -> impl Iterator<Item = Article> {
        let state = self.state.lock();
        let snapshot = state.registry[state.active()].articles().to_vec();
        snapshot.into_iter()
    }

    pub fn page(&self) -> u32 {
        let state = self.state.lock();
        state.registry[state.active()].page()
    }

    pub fn total_pages(&self) -> u32 {
        let state = self.state.lock();
        state.registry[state.active()].total_pages()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Looks up an article in the active partition.
    pub fn get(&self, slug: &str) -> Option<Article> {
        let state = self.state.lock();
        state.registry.get(slug, state.active()).cloned()
    }

    pub fn get_in(&self, slug: &str, context: ContextTag) -> Option<Article> {
        self.state.lock().registry.get(slug, context).cloned()
    }

    pub fn get_across_all(&self, slug: &str) -> Vec<Article> {
        self.state.lock().registry.get_across_all(slug)
    }

    pub fn partition_state(&self, context: ContextTag) -> PartitionState {
        self.state.lock().registry[context].state()
    }

    /// Fills a partition directly, e.g. from a response fetched elsewhere.
    pub fn replace_all(&self, context: ContextTag, articles: Vec<Article>, total_count: u64) {
        debug!("Priming {} partition with {} articles", context, articles.len());
        self.state.lock().registry.replace_all(context, articles, total_count);
    }

    /// Empties every partition and resets its paging.
    pub fn clear_all(&self) {
        self.state.lock().registry.clear_all();
        info!("Cleared all article partitions");
    }
}
