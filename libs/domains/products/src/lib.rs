//! Products Domain
//!
//! A product catalog served over GraphQL, backed by one of several
//! interchangeable stores chosen at startup.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← POST /graphql, GraphiQL; builds AuthContext per request
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Schema    │  ← Query/Mutation roots, ProductOutcome union
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Resolvers: authorization gate, error envelopes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ ProductStore│  ← memory | archivo | mongo | firebase (picked by the selector)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Product, ProductInput, UpdateProduct
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     build_schema, handlers, resolve_store, AccessPolicy, ErrorMode, ProductService,
//!     StoreConfig, StoreKind,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = resolve_store(&StoreConfig { kind: StoreKind::Memory }).await?;
//! let schema = build_schema(ProductService::new(store), ErrorMode::Envelope);
//!
//! let router = handlers::router(schema, AccessPolicy::allow_all());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod envelope;
pub mod error;
pub mod file;
pub mod firebase;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod schema;
pub mod selector;
pub mod service;

// Re-export commonly used types
pub use auth::{AccessConfig, AccessPolicy, AuthContext, UNAUTHORIZED_MESSAGE};
pub use envelope::{Envelope, Outcome};
pub use error::{ProductError, ProductResult};
pub use file::{FileProductStore, FileStoreConfig};
pub use firebase::{FirebaseConfig, FirebaseProductStore};
pub use memory::MemoryProductStore;
pub use models::{Product, ProductInput, UpdateProduct};
pub use self::mongodb::{MongoProductStore, MongoStoreConfig};
pub use repository::ProductStore;
pub use schema::{build_schema, CatalogSchema, ErrorMode, ProductOutcome};
pub use selector::{default_registry, resolve_store, StoreConfig, StoreKind, StoreRegistry};
pub use service::ProductService;
