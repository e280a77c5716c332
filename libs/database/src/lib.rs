//! Database connectors shared by the catalog services
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB client construction, health checks and config
//! - `config` - `core_config::FromEnv` support for the connector configs
//!
//! ## MongoDB
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "catalog");
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let products = client.database(config.database()).collection::<Document>("products");
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
