//! JSON file store (`archivo`)
//!
//! The whole catalog lives in one JSON array. Each mutation rewrites the file
//! through a sibling temp file and a rename, so readers never observe a
//! half-written catalog.

use async_trait::async_trait;
use core_config::{env_or_default, ConfigError, FromEnv};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, instrument};

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductInput, UpdateProduct};
use crate::repository::ProductStore;

pub const DEFAULT_FILE_PATH: &str = "data/products.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStoreConfig {
    pub path: PathBuf,
}

impl FromEnv for FileStoreConfig {
    /// Reads CATALOG_FILE_PATH, defaulting to `data/products.json`
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            path: PathBuf::from(env_or_default("CATALOG_FILE_PATH", DEFAULT_FILE_PATH)),
        })
    }
}

pub struct FileProductStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileProductStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &FileStoreConfig) -> Self {
        Self::new(config.path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_catalog(&self) -> ProductResult<Vec<Product>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_catalog(&self, products: &[Product]) -> ProductResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(products)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), count = products.len(), "Catalog file written");
        Ok(())
    }
}

/// One past the largest numeric id; non-numeric ids are ignored
fn next_id(products: &[Product]) -> u64 {
    products
        .iter()
        .filter_map(|p| p.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

#[async_trait]
impl ProductStore for FileProductStore {
    fn name(&self) -> &'static str {
        "archivo"
    }

    async fn list_all(&self) -> ProductResult<Vec<Product>> {
        self.read_catalog().await
    }

    async fn list(&self, id: &str) -> ProductResult<Product> {
        self.read_catalog()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, input), fields(path = %self.path.display()))]
    async fn save(&self, input: ProductInput) -> ProductResult<Product> {
        let _guard = self.write_lock.lock().await;
        let mut products = self.read_catalog().await?;

        let product = Product::new(next_id(&products).to_string(), input);
        products.push(product.clone());
        self.write_catalog(&products).await?;

        Ok(product)
    }

    #[instrument(skip(self, update), fields(path = %self.path.display(), product_id = %update.id))]
    async fn update(&self, update: UpdateProduct) -> ProductResult<Product> {
        let _guard = self.write_lock.lock().await;
        let mut products = self.read_catalog().await?;

        let product = products
            .iter_mut()
            .find(|p| p.id == update.id)
            .ok_or_else(|| ProductError::NotFound(update.id.clone()))?;
        product.apply_update(update.changes);
        let updated = product.clone();

        self.write_catalog(&products).await?;
        Ok(updated)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn delete(&self, id: &str) -> ProductResult<Product> {
        let _guard = self.write_lock.lock().await;
        let mut products = self.read_catalog().await?;

        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;
        let removed = products.remove(index);

        self.write_catalog(&products).await?;
        Ok(removed)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn delete_all(&self) -> ProductResult<Vec<Product>> {
        let _guard = self.write_lock.lock().await;
        let removed = self.read_catalog().await?;

        self.write_catalog(&[]).await?;
        Ok(removed)
    }

    async fn health_check(&self) -> ProductResult<()> {
        match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).await?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}
