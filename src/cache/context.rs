use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::Query;

/// The five query scopes, each backed by its own partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextTag {
    Default,
    MyFeed,
    FavoritedBy,
    Tag,
    Author,
}

impl ContextTag {
    /// Fixed enumeration order, also used when collecting copies across partitions.
    pub const ALL: [ContextTag; 5] = [
        ContextTag::Default,
        ContextTag::MyFeed,
        ContextTag::FavoritedBy,
        ContextTag::Tag,
        ContextTag::Author,
    ];

    pub const fn index(self) -> usize {
        match self {
            ContextTag::Default => 0,
            ContextTag::MyFeed => 1,
            ContextTag::FavoritedBy => 2,
            ContextTag::Tag => 3,
            ContextTag::Author => 4,
        }
    }
}

impl fmt::Display for ContextTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextTag::Default => "default",
            ContextTag::MyFeed => "my-feed",
            ContextTag::FavoritedBy => "favorited-by",
            ContextTag::Tag => "tag",
            ContextTag::Author => "author",
        };
        f.write_str(name)
    }
}

/// What the article list is currently filtered by.
///
/// Several fields may be set at once; they are resolved by priority
/// `my_feed > favorited_by > tag > author`, falling back to the global list.
/// Empty strings count as unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Predicate {
    pub my_feed: bool,
    pub favorited_by: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn my_feed() -> Self {
        Self {
            my_feed: true,
            ..Self::default()
        }
    }

    pub fn favorited_by(user: impl Into<String>) -> Self {
        Self {
            favorited_by: Some(user.into()),
            ..Self::default()
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn author(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            ..Self::default()
        }
    }

    pub fn favorited_by_value(&self) -> Option<&str> {
        present(&self.favorited_by)
    }

    pub fn author_value(&self) -> Option<&str> {
        present(&self.author)
    }

    /// The list endpoint this predicate selects.
    pub fn query(&self) -> Query {
        if self.my_feed {
            return Query::Feed;
        }
        if let Some(user) = present(&self.favorited_by) {
            return Query::FavoritedBy(user.to_string());
        }
        if let Some(tag) = present(&self.tag) {
            return Query::Tag(tag.to_string());
        }
        if let Some(author) = present(&self.author) {
            return Query::Author(author.to_string());
        }
        Query::All
    }

    pub fn context(&self) -> ContextTag {
        resolve_context(self)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Query {
    pub fn context(&self) -> ContextTag {
        match self {
            Query::Feed => ContextTag::MyFeed,
            Query::FavoritedBy(_) => ContextTag::FavoritedBy,
            Query::Tag(_) => ContextTag::Tag,
            Query::Author(_) => ContextTag::Author,
            Query::All => ContextTag::Default,
        }
    }
}

pub fn resolve_context(predicate: &Predicate) -> ContextTag {
    if predicate.my_feed {
        ContextTag::MyFeed
    } else if present(&predicate.favorited_by).is_some() {
        ContextTag::FavoritedBy
    } else if present(&predicate.tag).is_some() {
        ContextTag::Tag
    } else if present(&predicate.author).is_some() {
        ContextTag::Author
    } else {
        ContextTag::Default
    }
}
