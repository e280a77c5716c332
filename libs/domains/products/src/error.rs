use core_config::ConfigError;
use database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Remote backend error: {0}")]
    Remote(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<DatabaseError> for ProductError {
    fn from(err: DatabaseError) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for ProductError {
    fn from(err: reqwest::Error) -> Self {
        ProductError::Remote(err.to_string())
    }
}

impl From<ConfigError> for ProductError {
    fn from(err: ConfigError) -> Self {
        ProductError::Configuration(err.to_string())
    }
}
