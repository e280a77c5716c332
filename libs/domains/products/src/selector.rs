//! Store selection
//!
//! The `DB` variable names one [`StoreKind`]. At startup the matching factory
//! in a [`StoreRegistry`] builds the store that backs the process from then on.

use core_config::{env_required, ConfigError, FromEnv};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::info;

use crate::error::{ProductError, ProductResult};
use crate::file::{FileProductStore, FileStoreConfig};
use crate::firebase::{FirebaseConfig, FirebaseProductStore};
use crate::memory::MemoryProductStore;
use crate::mongodb::{MongoProductStore, MongoStoreConfig};
use crate::repository::ProductStore;

/// Recognized storage backends. Tokens are matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    Mongo,
    /// JSON file on local disk; `file` is accepted as an alias
    #[strum(to_string = "archivo", serialize = "file")]
    Archivo,
    Firebase,
    Memory,
}

impl StoreKind {
    /// Comma-separated list of accepted tokens, for error messages
    pub fn accepted_tokens() -> String {
        let mut tokens: Vec<String> = StoreKind::iter().map(|k| k.to_string()).collect();
        tokens.push("file".to_string());
        tokens.join(", ")
    }

    pub fn parse_token(token: &str) -> Result<Self, ConfigError> {
        token
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "DB".to_string(),
                value: token.to_string(),
                expected: Self::accepted_tokens(),
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StoreKind,
}

impl FromEnv for StoreConfig {
    /// Reads the required `DB` token
    fn from_env() -> Result<Self, ConfigError> {
        let token = env_required("DB")?;
        Ok(Self {
            kind: StoreKind::parse_token(&token)?,
        })
    }
}

/// Async constructor for one kind of store
pub type StoreFactory =
    Box<dyn Fn() -> BoxFuture<'static, ProductResult<Arc<dyn ProductStore>>> + Send + Sync>;

/// Maps each [`StoreKind`] to the factory that builds it.
#[derive(Default)]
pub struct StoreRegistry {
    factories: HashMap<StoreKind, StoreFactory>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `kind`.
    ///
    /// # Errors
    /// Fails if `kind` already has a factory.
    pub fn register(&mut self, kind: StoreKind, factory: StoreFactory) -> ProductResult<()> {
        if self.factories.contains_key(&kind) {
            return Err(ProductError::Configuration(format!(
                "store '{}' is already registered",
                kind
            )));
        }
        self.factories.insert(kind, factory);
        Ok(())
    }

    /// Build the store registered for `kind`
    pub async fn resolve(&self, kind: StoreKind) -> ProductResult<Arc<dyn ProductStore>> {
        let factory = self.factories.get(&kind).ok_or_else(|| {
            ProductError::Configuration(format!("store '{}' is not registered", kind))
        })?;

        let store = factory().await?;
        info!(store = %kind, provider = store.name(), "Storage provider selected");
        Ok(store)
    }

    pub fn kinds(&self) -> Vec<StoreKind> {
        let mut kinds: Vec<StoreKind> = self.factories.keys().copied().collect();
        kinds.sort_by_key(|k| k.to_string());
        kinds
    }

    pub fn has_kind(&self, kind: StoreKind) -> bool {
        self.factories.contains_key(&kind)
    }
}

async fn build_memory_store() -> ProductResult<Arc<dyn ProductStore>> {
    Ok(Arc::new(MemoryProductStore::new()))
}

async fn build_file_store() -> ProductResult<Arc<dyn ProductStore>> {
    let config = FileStoreConfig::from_env()?;
    Ok(Arc::new(FileProductStore::from_config(&config)))
}

async fn build_mongo_store() -> ProductResult<Arc<dyn ProductStore>> {
    let config = MongoStoreConfig::from_env()?;
    Ok(Arc::new(MongoProductStore::connect(&config).await?))
}

async fn build_firebase_store() -> ProductResult<Arc<dyn ProductStore>> {
    let config = FirebaseConfig::from_env()?;
    Ok(Arc::new(FirebaseProductStore::new(config)))
}

/// Registry with every built-in store.
///
/// Provider settings are read from the environment when the store is
/// resolved, so only the selected provider's variables must be set.
pub fn default_registry() -> ProductResult<StoreRegistry> {
    let mut registry = StoreRegistry::new();

    registry.register(StoreKind::Memory, Box::new(|| build_memory_store().boxed()))?;
    registry.register(StoreKind::Archivo, Box::new(|| build_file_store().boxed()))?;
    registry.register(StoreKind::Mongo, Box::new(|| build_mongo_store().boxed()))?;
    registry.register(StoreKind::Firebase, Box::new(|| build_firebase_store().boxed()))?;

    Ok(registry)
}

/// Build the store selected by `config` from the built-in registry
pub async fn resolve_store(config: &StoreConfig) -> ProductResult<Arc<dyn ProductStore>> {
    default_registry()?.resolve(config.kind).await
}
