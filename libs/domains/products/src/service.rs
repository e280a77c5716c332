//! Product resolvers
//!
//! Six operations sit between the GraphQL schema and the selected store.
//! Mutations pass the authorization gate first; every store fault is logged
//! and flattened into an [`Envelope`].

use std::sync::Arc;
use tracing::{error, instrument, warn};

use crate::auth::AuthContext;
use crate::envelope::{Envelope, Outcome};
use crate::error::ProductError;
use crate::models::{Product, ProductInput, UpdateProduct};
use crate::repository::ProductStore;

pub struct ProductService<S: ProductStore + ?Sized = dyn ProductStore> {
    store: Arc<S>,
}

// Manual impl: derive would require `S: Clone`.
impl<S: ProductStore + ?Sized> Clone for ProductService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ProductStore + ?Sized> ProductService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn fault(&self, operation: &'static str, err: ProductError) -> Envelope {
        error!(
            operation,
            provider = self.store.name(),
            error = %err,
            "Storage provider call failed"
        );
        Envelope::from(err)
    }

    fn gate(&self, auth: &AuthContext, operation: &'static str) -> Outcome<()> {
        if auth.is_admin() {
            Ok(())
        } else {
            warn!(operation, "Mutation denied: caller is not authorized");
            Err(Envelope::unauthorized())
        }
    }

    #[instrument(skip(self), fields(provider = self.store.name()))]
    pub async fn list_all(&self) -> Outcome<Vec<Product>> {
        self.store
            .list_all()
            .await
            .map_err(|e| self.fault("listAll", e))
    }

    #[instrument(skip(self), fields(provider = self.store.name()))]
    pub async fn list(&self, id: &str) -> Outcome<Product> {
        self.store.list(id).await.map_err(|e| self.fault("list", e))
    }

    #[instrument(skip(self, auth, data), fields(provider = self.store.name()))]
    pub async fn save(&self, auth: &AuthContext, data: ProductInput) -> Outcome<Product> {
        self.gate(auth, "save")?;

        self.store.save(data).await.map_err(|e| self.fault("save", e))
    }

    /// `id` always wins over anything the caller put in `data`
    #[instrument(skip(self, auth, data), fields(provider = self.store.name()))]
    pub async fn update(
        &self,
        auth: &AuthContext,
        id: String,
        data: ProductInput,
    ) -> Outcome<Product> {
        self.gate(auth, "update")?;

        self.store
            .update(UpdateProduct::new(id, data))
            .await
            .map_err(|e| self.fault("update", e))
    }

    #[instrument(skip(self, auth), fields(provider = self.store.name()))]
    pub async fn delete_one(&self, auth: &AuthContext, id: &str) -> Outcome<Product> {
        self.gate(auth, "deleteOne")?;

        self.store
            .delete(id)
            .await
            .map_err(|e| self.fault("deleteOne", e))
    }

    #[instrument(skip(self, auth), fields(provider = self.store.name()))]
    pub async fn delete_all(&self, auth: &AuthContext) -> Outcome<Vec<Product>> {
        self.gate(auth, "deleteAll")?;

        self.store
            .delete_all()
            .await
            .map_err(|e| self.fault("deleteAll", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductStore;

    fn mock_store() -> MockProductStore {
        let mut mock = MockProductStore::new();
        mock.expect_name().return_const("mock");
        mock
    }

    fn service(mock: MockProductStore) -> ProductService<MockProductStore> {
        ProductService::new(Arc::new(mock))
    }

    fn product(id: &str, title: &str) -> Product {
        Product {
            id: id.to_string(),
            title: Some(title.to_string()),
            description: None,
            code: None,
            photo_url: None,
            price: None,
            timestamp: Some("2024-01-01T00:00:00.000Z".to_string()),
            stock: None,
        }
    }

    fn boom() -> ProductError {
        ProductError::Database("connection reset".to_string())
    }

    fn boom_envelope() -> Envelope {
        Envelope {
            err: -1,
            message: "Database error: connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn test_denied_mutations_never_reach_the_store() {
        let mut mock = mock_store();
        mock.expect_save().never();
        mock.expect_update().never();
        mock.expect_delete().never();
        mock.expect_delete_all().never();

        let service = service(mock);
        let auth = AuthContext::anonymous();
        let denied = Envelope {
            err: -1,
            message: "ruta no autorizada".to_string(),
        };

        assert_eq!(
            service.save(&auth, ProductInput::default()).await,
            Err(denied.clone())
        );
        assert_eq!(
            service
                .update(&auth, "5".to_string(), ProductInput::default())
                .await,
            Err(denied.clone())
        );
        assert_eq!(service.delete_one(&auth, "5").await, Err(denied.clone()));
        assert_eq!(service.delete_all(&auth).await, Err(denied));
    }

    #[tokio::test]
    async fn test_reads_bypass_the_gate() {
        let mut mock = mock_store();
        mock.expect_list_all()
            .times(1)
            .returning(|| Ok(vec![product("1", "Pen")]));
        mock.expect_list()
            .withf(|id| id == "1")
            .times(1)
            .returning(|_| Ok(product("1", "Pen")));

        let service = service(mock);

        assert_eq!(service.list_all().await.unwrap().len(), 1);
        assert_eq!(service.list("1").await.unwrap().id, "1");
    }

    #[tokio::test]
    async fn test_store_faults_become_envelopes() {
        let mut mock = mock_store();
        mock.expect_list_all().returning(|| Err(boom()));
        mock.expect_list().returning(|_| Err(boom()));
        mock.expect_save().returning(|_| Err(boom()));
        mock.expect_update().returning(|_| Err(boom()));
        mock.expect_delete().returning(|_| Err(boom()));
        mock.expect_delete_all().returning(|| Err(boom()));

        let service = service(mock);
        let auth = AuthContext::admin();

        assert_eq!(service.list_all().await, Err(boom_envelope()));
        assert_eq!(service.list("1").await, Err(boom_envelope()));
        assert_eq!(
            service.save(&auth, ProductInput::default()).await,
            Err(boom_envelope())
        );
        assert_eq!(
            service
                .update(&auth, "1".to_string(), ProductInput::default())
                .await,
            Err(boom_envelope())
        );
        assert_eq!(service.delete_one(&auth, "1").await, Err(boom_envelope()));
        assert_eq!(service.delete_all(&auth).await, Err(boom_envelope()));
    }

    #[tokio::test]
    async fn test_not_found_message_is_preserved() {
        let mut mock = mock_store();
        mock.expect_list()
            .returning(|id| Err(ProductError::NotFound(id.to_string())));

        let envelope = service(mock).list("42").await.unwrap_err();
        assert_eq!(envelope.err, -1);
        assert_eq!(envelope.message, "Product not found: 42");
    }

    #[tokio::test]
    async fn test_update_uses_argument_id_over_payload_id() {
        let data: ProductInput = serde_json::from_str(r#"{"id": "9", "title": "X"}"#).unwrap();

        let mut mock = mock_store();
        mock.expect_update()
            .withf(|update: &UpdateProduct| {
                update.id == "5" && update.changes.title.as_deref() == Some("X")
            })
            .times(1)
            .returning(|update| Ok(product(&update.id, "X")));

        let updated = service(mock)
            .update(&AuthContext::admin(), "5".to_string(), data)
            .await
            .unwrap();
        assert_eq!(updated.id, "5");
    }

    #[tokio::test]
    async fn test_list_all_on_empty_store() {
        let mut mock = mock_store();
        mock.expect_list_all().returning(|| Ok(vec![]));

        assert_eq!(service(mock).list_all().await, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_save_returns_store_product_unchanged() {
        let created = Product {
            price: Some(10),
            ..product("generated-1", "Pen")
        };
        let expected = created.clone();

        let mut mock = mock_store();
        mock.expect_save()
            .withf(|input: &ProductInput| {
                input.title.as_deref() == Some("Pen") && input.price == Some(10)
            })
            .times(1)
            .returning(move |_| Ok(created.clone()));

        let saved = service(mock)
            .save(
                &AuthContext::admin(),
                ProductInput {
                    title: Some("Pen".to_string()),
                    price: Some(10),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(saved, Ok(expected));
    }

    #[tokio::test]
    async fn test_delete_all_returns_removed_products() {
        let mut mock = mock_store();
        mock.expect_delete_all()
            .times(1)
            .returning(|| Ok(vec![product("1", "Pen"), product("2", "Ink")]));

        let removed = service(mock)
            .delete_all(&AuthContext::admin())
            .await
            .unwrap();
        assert_eq!(removed.len(), 2);
    }
}
