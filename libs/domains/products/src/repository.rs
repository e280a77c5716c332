use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{Product, ProductInput, UpdateProduct};

/// Persistence contract every catalog backend implements.
///
/// Stores own identifier generation, existence checks and any field
/// validation. Callers hold them as `Arc<dyn ProductStore>`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Short label used in logs and readiness output
    fn name(&self) -> &'static str;

    /// Every product in the catalog
    async fn list_all(&self) -> ProductResult<Vec<Product>>;

    /// The product with `id`, or [`ProductError::NotFound`](crate::ProductError::NotFound)
    async fn list(&self, id: &str) -> ProductResult<Product>;

    /// Create a product, assigning its id and timestamp
    async fn save(&self, input: ProductInput) -> ProductResult<Product>;

    /// Apply `update.changes` to an existing product and return the result
    async fn update(&self, update: UpdateProduct) -> ProductResult<Product>;

    /// Remove a product and return what was removed
    async fn delete(&self, id: &str) -> ProductResult<Product>;

    /// Remove every product and return what was removed
    async fn delete_all(&self) -> ProductResult<Vec<Product>>;

    /// Readiness probe for the backing storage
    async fn health_check(&self) -> ProductResult<()> {
        Ok(())
    }
}
