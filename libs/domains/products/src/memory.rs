//! In-process store for development and tests

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductInput, UpdateProduct};
use crate::repository::ProductStore;

#[derive(Default)]
struct Catalog {
    products: Vec<Product>,
    last_id: u64,
}

/// Keeps products in insertion order; ids are increasing integers.
///
/// Ids are never reused, even after `delete_all`.
#[derive(Default)]
pub struct MemoryProductStore {
    catalog: RwLock<Catalog>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_all(&self) -> ProductResult<Vec<Product>> {
        Ok(self.catalog.read().await.products.clone())
    }

    async fn list(&self, id: &str) -> ProductResult<Product> {
        self.catalog
            .read()
            .await
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, input))]
    async fn save(&self, input: ProductInput) -> ProductResult<Product> {
        let mut catalog = self.catalog.write().await;
        catalog.last_id += 1;

        let product = Product::new(catalog.last_id.to_string(), input);
        catalog.products.push(product.clone());

        tracing::debug!(product_id = %product.id, "Product stored in memory");
        Ok(product)
    }

    #[instrument(skip(self, update), fields(product_id = %update.id))]
    async fn update(&self, update: UpdateProduct) -> ProductResult<Product> {
        let mut catalog = self.catalog.write().await;
        let product = catalog
            .products
            .iter_mut()
            .find(|p| p.id == update.id)
            .ok_or_else(|| ProductError::NotFound(update.id.clone()))?;

        product.apply_update(update.changes);
        Ok(product.clone())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> ProductResult<Product> {
        let mut catalog = self.catalog.write().await;
        let index = catalog
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        Ok(catalog.products.remove(index))
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> ProductResult<Vec<Product>> {
        let mut catalog = self.catalog.write().await;
        Ok(std::mem::take(&mut catalog.products))
    }
}
