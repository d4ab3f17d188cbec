use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub following: bool,
}

impl Profile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

/// An article as returned by the remote API.
///
/// Only `slug`, `favorited` and `favorites_count` are interpreted by the cache,
/// everything else is carried along for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub favorited: bool,
    #[serde(default)]
    pub favorites_count: u32,
    pub author: Profile,
}

impl Article {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, author: Profile) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.into(),
            title: title.into(),
            description: String::new(),
            body: String::new(),
            tag_list: Vec::new(),
            created_at: now,
            updated_at: now,
            favorited: false,
            favorites_count: 0,
            author,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_list = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_favorites(mut self, favorited: bool, count: u32) -> Self {
        self.favorited = favorited;
        self.favorites_count = count;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list.iter().any(|t| t == tag)
    }

    /// Flips the favorite state towards `target`, keeping the counter in step.
    /// Returns `false` when the article already is in `target` state.
    pub fn apply_favorite(&mut self, target: bool) -> bool {
        if self.favorited == target {
            return false;
        }
        self.favorited = target;
        self.favorites_count = if target {
            self.favorites_count.saturating_add(1)
        } else {
            self.favorites_count.saturating_sub(1)
        };
        true
    }
}

/// Payload for creating an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub body: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
}

/// Payload for editing an article. Absent fields stay as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdate {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_list: Option<Vec<String>>,
}

impl ArticleUpdate {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn apply_to(&self, article: &mut Article) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(description) = &self.description {
            article.description = description.clone();
        }
        if let Some(body) = &self.body {
            article.body = body.clone();
        }
        if let Some(tags) = &self.tag_list {
            article.tag_list = tags.clone();
        }
        article.updated_at = Utc::now();
    }
}
