use thiserror::Error;

use crate::{api::error::ApiError, config::ConfigError};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Remote request failed")]
    Api(#[from] ApiError),

    #[error("Error loading configuration")]
    Config(#[from] ConfigError),
}

impl CacheError {
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            CacheError::Api(err) => Some(err),
            CacheError::Config(_) => None,
        }
    }
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
