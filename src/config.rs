use std::path::{Path, PathBuf};

use serde::Deserialize;
use smart_default::SmartDefault;
use thiserror::Error;

use crate::api::ArticlesPage;
use crate::article::Article;

pub const DISCARD_SUPERSEDED_VAR: &str = "ARTICLE_CACHE_DISCARD_SUPERSEDED";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}, expected true or false")]
    InvalidFlag { var: &'static str, value: String },

    #[error("Error reading fixture file '{path}'")]
    FixtureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing fixture file '{path}'")]
    FixtureParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Drop list responses whose partition was repaged, re-filtered or cleared
    /// while the request was in flight.
    #[default = true]
    pub discard_superseded: bool,
}

impl CacheConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(value) = std::env::var(DISCARD_SUPERSEDED_VAR) {
            config.discard_superseded = parse_flag(DISCARD_SUPERSEDED_VAR, &value)?;
        }
        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Fixture {
    List(Vec<Article>),
    Page(ArticlesPage),
}

/// Reads articles from a JSON file holding either a bare array or a list response.
pub fn load_fixtures(path: &Path) -> Result<Vec<Article>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::FixtureRead {
        path: path.to_path_buf(),
        source,
    })?;

    let fixture: Fixture = serde_json::from_str(&raw).map_err(|source| ConfigError::FixtureParse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match fixture {
        Fixture::List(articles) => articles,
        Fixture::Page(page) => page.articles,
    })
}
