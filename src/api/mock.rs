use std::collections::{BTreeSet, VecDeque};
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use regex::Regex;
use tracing::debug;

use crate::api::client::ArticleApi;
use crate::api::error::{ApiError, ValidationErrors};
use crate::api::types::{ArticleEnvelope, ArticlesPage, Query};
use crate::article::{Article, ArticleUpdate, NewArticle, Profile};

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// A request as seen by [`MockArticleApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    List { query: Query, page: u32, limit: u32 },
    Get(String),
    Favorite(String),
    Unfavorite(String),
    Create(String),
    Update(String),
    Delete(String),
}

impl ApiCall {
    pub fn is_list(&self) -> bool {
        matches!(self, ApiCall::List { .. })
    }
}

#[derive(Debug)]
struct StoredArticle {
    article: Article,
    fans: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct ServerState {
    articles: Vec<StoredArticle>,
    following: BTreeSet<String>,
    calls: Vec<ApiCall>,
    failures: VecDeque<ApiError>,
}

/// In-memory article server.
///
/// Articles are kept newest first. `favorited` on returned articles is relative
/// to the configured viewer. Every request is journaled, and queued failures
/// are handed out to the next requests in order.
#[derive(Debug)]
pub struct MockArticleApi {
    viewer: String,
    state: Mutex<ServerState>,
}

impl MockArticleApi {
    pub fn new(viewer: impl Into<String>) -> Self {
        Self {
            viewer: viewer.into(),
            state: Mutex::new(ServerState::default()),
        }
    }

    /// Seeds the server. An article marked `favorited` counts as favorited by the viewer.
    pub fn with_articles(self, articles: impl IntoIterator<Item = Article>) -> Self {
        {
            let mut state = self.state.lock();
            for article in articles {
                let mut fans = BTreeSet::new();
                if article.favorited {
                    fans.insert(self.viewer.clone());
                }
                state.articles.push(StoredArticle { article, fans });
            }
        }
        self
    }

    pub fn follow(&self, author: impl Into<String>) {
        self.state.lock().following.insert(author.into());
    }

    /// The next request fails with `error` instead of being served.
    pub fn fail_next(&self, error: ApiError) {
        self.state.lock().failures.push_back(error);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn list_call_count(&self) -> usize {
        self.state.lock().calls.iter().filter(|c| c.is_list()).count()
    }

    /// The server's current copy of an article.
    pub fn stored(&self, slug: &str) -> Option<Article> {
        self.state
            .lock()
            .articles
            .iter()
            .find(|s| s.article.slug == slug)
            .map(|s| s.article.clone())
    }

    fn begin(&self, call: ApiCall) -> Result<parking_lot::MutexGuard<'_, ServerState>, ApiError> {
        debug!("mock api: {:?}", call);
        let mut state = self.state.lock();
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    fn page<F>(&self, call: ApiCall, page: u32, limit: u32, filter: F) -> Result<ArticlesPage, ApiError>
    where
        F: Fn(&StoredArticle, &BTreeSet<String>) -> bool,
    {
        let state = self.begin(call)?;
        let matching: Vec<&StoredArticle> = state
            .articles
            .iter()
            .filter(|s| filter(s, &state.following))
            .collect();

        let offset = page as usize * limit as usize;
        let articles = matching
            .iter()
            .skip(offset)
            .take(limit as usize)
            .map(|s| s.article.clone())
            .collect();

        Ok(ArticlesPage::new(articles, matching.len() as u64))
    }

    fn toggle(&self, call: ApiCall, slug: &str, target: bool) -> Result<(), ApiError> {
        let mut state = self.begin(call)?;
        let stored = state
            .articles
            .iter_mut()
            .find(|s| s.article.slug == slug)
            .ok_or_else(|| ApiError::not_found(format!("article '{slug}'")))?;

        let changed = if target {
            stored.fans.insert(self.viewer.clone())
        } else {
            stored.fans.remove(&self.viewer)
        };
        if !changed {
            let message = if target { "already favorited" } else { "not favorited" };
            return Err(ApiError::Validation(ValidationErrors::single("article", message)));
        }

        stored.article.apply_favorite(target);
        Ok(())
    }
}

#[async_trait]
impl ArticleApi for MockArticleApi {
    async fn feed(&self, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        let call = ApiCall::List { query: Query::Feed, page, limit };
        self.page(call, page, limit, |s, following| {
            following.contains(&s.article.author.username)
        })
    }

    async fn favorited_by(&self, user: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        let call = ApiCall::List { query: Query::FavoritedBy(user.to_string()), page, limit };
        self.page(call, page, limit, |s, _| s.fans.contains(user))
    }

    async fn by_tag(&self, tag: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        let call = ApiCall::List { query: Query::Tag(tag.to_string()), page, limit };
        self.page(call, page, limit, |s, _| s.article.has_tag(tag))
    }

    async fn by_author(&self, author: &str, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        let call = ApiCall::List { query: Query::Author(author.to_string()), page, limit };
        self.page(call, page, limit, |s, _| s.article.author.username == author)
    }

    async fn all(&self, page: u32, limit: u32) -> Result<ArticlesPage, ApiError> {
        let call = ApiCall::List { query: Query::All, page, limit };
        self.page(call, page, limit, |_, _| true)
    }

    async fn get(&self, slug: &str) -> Result<ArticleEnvelope, ApiError> {
        let state = self.begin(ApiCall::Get(slug.to_string()))?;
        state
            .articles
            .iter()
            .find(|s| s.article.slug == slug)
            .map(|s| ArticleEnvelope::new(s.article.clone()))
            .ok_or_else(|| ApiError::not_found(format!("article '{slug}'")))
    }

    async fn favorite(&self, slug: &str) -> Result<(), ApiError> {
        self.toggle(ApiCall::Favorite(slug.to_string()), slug, true)
    }

    async fn unfavorite(&self, slug: &str) -> Result<(), ApiError> {
        self.toggle(ApiCall::Unfavorite(slug.to_string()), slug, false)
    }

    async fn create(&self, article: NewArticle) -> Result<ArticleEnvelope, ApiError> {
        let mut state = self.begin(ApiCall::Create(article.title.clone()))?;
        if article.title.trim().is_empty() {
            return Err(ApiError::Validation(ValidationErrors::single("title", "can't be blank")));
        }

        let base = slugify(&article.title);
        let mut slug = base.clone();
        let mut suffix = 1;
        while state.articles.iter().any(|s| s.article.slug == slug) {
            suffix += 1;
            slug = format!("{base}-{suffix}");
        }

        let now = Utc::now();
        let created = Article {
            slug,
            title: article.title,
            description: article.description,
            body: article.body,
            tag_list: article.tag_list,
            created_at: now,
            updated_at: now,
            favorited: false,
            favorites_count: 0,
            author: Profile::new(self.viewer.clone()),
        };

        state.articles.insert(
            0,
            StoredArticle {
                article: created.clone(),
                fans: BTreeSet::new(),
            },
        );
        Ok(ArticleEnvelope::new(created))
    }

    async fn update(&self, update: ArticleUpdate) -> Result<ArticleEnvelope, ApiError> {
        let mut state = self.begin(ApiCall::Update(update.slug.clone()))?;
        let stored = state
            .articles
            .iter_mut()
            .find(|s| s.article.slug == update.slug)
            .ok_or_else(|| ApiError::not_found(format!("article '{}'", update.slug)))?;

        update.apply_to(&mut stored.article);
        Ok(ArticleEnvelope::new(stored.article.clone()))
    }

    async fn delete(&self, slug: &str) -> Result<(), ApiError> {
        let mut state = self.begin(ApiCall::Delete(slug.to_string()))?;
        let before = state.articles.len();
        state.articles.retain(|s| s.article.slug != slug);
        if state.articles.len() == before {
            return Err(ApiError::not_found(format!("article '{slug}'")));
        }
        Ok(())
    }
}

fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = NON_SLUG.replace_all(&lowered, "-");
    match slug.trim_matches('-') {
        "" => "article".to_string(),
        trimmed => trimmed.to_string(),
    }
}
