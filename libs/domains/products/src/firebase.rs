//! Cloud Firestore store over the REST API
//!
//! Products are documents in one collection. Scalar fields are written as
//! Firestore typed values: text as `stringValue`, integers as `integerValue`
//! (decimal strings on the wire).

use async_trait::async_trait;
use core_config::{env_optional, env_or_default, env_required, ConfigError, FromEnv};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{instrument, warn};

use crate::error::{ProductError, ProductResult};
use crate::models::{now_timestamp, Product, ProductInput, UpdateProduct};
use crate::repository::ProductStore;

pub const DEFAULT_API_BASE: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_COLLECTION: &str = "products";

const PAGE_SIZE: u32 = 300;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_base: String,
    pub auth_token: Option<String>,
    pub collection: String,
}

impl FirebaseConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            auth_token: None,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// `{api_base}/projects/{project}/databases/(default)/documents/{collection}`
    pub fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.api_base.trim_end_matches('/'),
            self.project_id,
            self.collection
        )
    }
}

impl FromEnv for FirebaseConfig {
    /// Reads:
    /// - FIREBASE_PROJECT_ID (required)
    /// - FIREBASE_API_BASE (default: public Firestore endpoint)
    /// - FIREBASE_AUTH_TOKEN (optional bearer token)
    /// - FIREBASE_COLLECTION (default: `products`)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: env_required("FIREBASE_PROJECT_ID")?,
            api_base: env_or_default("FIREBASE_API_BASE", DEFAULT_API_BASE),
            auth_token: env_optional("FIREBASE_AUTH_TOKEN"),
            collection: env_or_default("FIREBASE_COLLECTION", DEFAULT_COLLECTION),
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn integer_value(value: i32) -> Value {
    json!({ "integerValue": value.to_string() })
}

fn read_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)?
        .get("stringValue")?
        .as_str()
        .map(String::from)
}

/// Accepts `integerValue` as a decimal string or number, and whole `doubleValue`s
fn read_integer(fields: &Map<String, Value>, key: &str) -> Option<i32> {
    let value = fields.get(key)?;

    if let Some(integer) = value.get("integerValue") {
        return match integer {
            Value::String(s) => s.parse().ok(),
            other => other.as_i64().and_then(|i| i32::try_from(i).ok()),
        };
    }

    value
        .get("doubleValue")?
        .as_f64()
        .filter(|f| f.fract() == 0.0)
        .and_then(|f| i32::try_from(f as i64).ok())
}

/// Typed field map for the fields present in `input`
fn input_to_fields(input: &ProductInput) -> Map<String, Value> {
    let mut fields = Map::new();

    if let Some(ref title) = input.title {
        fields.insert("title".to_string(), string_value(title));
    }
    if let Some(ref description) = input.description {
        fields.insert("description".to_string(), string_value(description));
    }
    if let Some(code) = input.code {
        fields.insert("code".to_string(), integer_value(code));
    }
    if let Some(ref photo_url) = input.photo_url {
        fields.insert("photoUrl".to_string(), string_value(photo_url));
    }
    if let Some(price) = input.price {
        fields.insert("price".to_string(), integer_value(price));
    }
    if let Some(stock) = input.stock {
        fields.insert("stock".to_string(), integer_value(stock));
    }

    fields
}

/// Product with its id taken from the last segment of the document name
fn document_to_product(document: &Document) -> ProductResult<Product> {
    let id = document
        .name
        .as_deref()
        .and_then(|name| name.rsplit('/').next())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProductError::Remote("Firestore document without a name".to_string()))?;

    let fields = &document.fields;
    Ok(Product {
        id: id.to_string(),
        title: read_string(fields, "title"),
        description: read_string(fields, "description"),
        code: read_integer(fields, "code"),
        photo_url: read_string(fields, "photoUrl"),
        price: read_integer(fields, "price"),
        timestamp: read_string(fields, "timestamp"),
        stock: read_integer(fields, "stock"),
    })
}

#[derive(Clone)]
pub struct FirebaseProductStore {
    client: reqwest::Client,
    config: FirebaseConfig,
}

impl FirebaseProductStore {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// URL of document `id`, encoded as a single path segment.
    ///
    /// Ids that cannot name a document in this collection are reported as not-found.
    fn document_url(&self, id: &str) -> ProductResult<String> {
        if id.is_empty() || id == "." || id == ".." || id.contains('/') {
            return Err(ProductError::NotFound(id.to_string()));
        }

        Ok(format!(
            "{}/{}",
            self.config.collection_url(),
            urlencoding::encode(id)
        ))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turns non-2xx responses into errors; 404 on a document becomes not-found
    async fn check(response: Response, id: Option<&str>) -> ProductResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            return Err(ProductError::NotFound(id.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Firestore request failed");
        Err(ProductError::Remote(format!(
            "Firestore responded with status {}: {}",
            status, body
        )))
    }

    async fn get_document(&self, id: &str) -> ProductResult<Document> {
        let response = self
            .authorized(self.client.get(self.document_url(id)?))
            .send()
            .await?;

        Ok(Self::check(response, Some(id)).await?.json().await?)
    }

    async fn list_page(
        &self,
        page_token: Option<&str>,
        page_size: u32,
    ) -> ProductResult<ListDocumentsResponse> {
        let mut request = self
            .client
            .get(self.config.collection_url())
            .query(&[("pageSize", page_size.to_string())]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.authorized(request).send().await?;
        Ok(Self::check(response, None).await?.json().await?)
    }
}

#[async_trait]
impl ProductStore for FirebaseProductStore {
    fn name(&self) -> &'static str {
        "firebase"
    }

    #[instrument(skip(self), fields(collection = %self.config.collection))]
    async fn list_all(&self) -> ProductResult<Vec<Product>> {
        let mut products = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(page_token.as_deref(), PAGE_SIZE).await?;
            for document in &page.documents {
                products.push(document_to_product(document)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn list(&self, id: &str) -> ProductResult<Product> {
        document_to_product(&self.get_document(id).await?)
    }

    #[instrument(skip(self, input), fields(collection = %self.config.collection))]
    async fn save(&self, input: ProductInput) -> ProductResult<Product> {
        let mut fields = input_to_fields(&input);
        fields.insert("timestamp".to_string(), string_value(&now_timestamp()));

        let body = Document { name: None, fields };
        let response = self
            .authorized(self.client.post(self.config.collection_url()))
            .json(&body)
            .send()
            .await?;

        let created: Document = Self::check(response, None).await?.json().await?;
        let product = document_to_product(&created)?;

        tracing::info!(product_id = %product.id, "Product created in Firestore");
        Ok(product)
    }

    #[instrument(skip(self, update), fields(product_id = %update.id))]
    async fn update(&self, update: UpdateProduct) -> ProductResult<Product> {
        let fields = input_to_fields(&update.changes);
        if fields.is_empty() {
            return self.list(&update.id).await;
        }

        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let body = Document {
            name: None,
            fields: fields.clone(),
        };
        let response = self
            .authorized(self.client.patch(self.document_url(&update.id)?))
            .query(&query)
            .json(&body)
            .send()
            .await?;

        let updated: Document = Self::check(response, Some(&update.id))
            .await?
            .json()
            .await?;
        document_to_product(&updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> ProductResult<Product> {
        let product = self.list(id).await?;

        let response = self
            .authorized(self.client.delete(self.document_url(id)?))
            .send()
            .await?;
        Self::check(response, Some(id)).await?;

        Ok(product)
    }

    #[instrument(skip(self), fields(collection = %self.config.collection))]
    async fn delete_all(&self) -> ProductResult<Vec<Product>> {
        let products = self.list_all().await?;

        for product in &products {
            let response = self
                .authorized(self.client.delete(self.document_url(&product.id)?))
                .send()
                .await?;
            Self::check(response, Some(&product.id)).await?;
        }

        tracing::info!(deleted = products.len(), "Firestore collection cleared");
        Ok(products)
    }

    async fn health_check(&self) -> ProductResult<()> {
        self.list_page(None, 1).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, RawQuery, State},
        http::StatusCode as AxumStatus,
        response::{IntoResponse, Response as AxumResponse},
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const COLLECTION_PATH: &str = "/projects/demo/databases/(default)/documents/products";

    #[test]
    fn test_input_maps_to_typed_fields() {
        let fields = input_to_fields(&ProductInput {
            title: Some("Pen".to_string()),
            price: Some(10),
            photo_url: Some("pen.png".to_string()),
            ..Default::default()
        });

        assert_eq!(fields["title"], json!({ "stringValue": "Pen" }));
        assert_eq!(fields["price"], json!({ "integerValue": "10" }));
        assert_eq!(fields["photoUrl"], json!({ "stringValue": "pen.png" }));
        assert!(!fields.contains_key("stock"));
    }

    #[test]
    fn test_document_maps_to_product() {
        let document: Document = serde_json::from_value(json!({
            "name": "projects/demo/databases/(default)/documents/products/abc123",
            "fields": {
                "title": { "stringValue": "Pen" },
                "price": { "integerValue": "10" },
                "stock": { "integerValue": 3 },
                "code": { "doubleValue": 7.0 },
                "timestamp": { "stringValue": "2024-01-01T00:00:00.000Z" },
                "description": { "nullValue": null }
            },
            "createTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let product = document_to_product(&document).unwrap();
        assert_eq!(product.id, "abc123");
        assert_eq!(product.title.as_deref(), Some("Pen"));
        assert_eq!(product.price, Some(10));
        assert_eq!(product.stock, Some(3));
        assert_eq!(product.code, Some(7));
        assert_eq!(product.description, None);
        assert_eq!(product.timestamp.as_deref(), Some("2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_out_of_range_double_is_dropped() {
        let fields: Map<String, Value> = serde_json::from_value(json!({
            "price": { "doubleValue": 3.0e10 },
            "stock": { "doubleValue": -2147483648.0 },
            "code": { "doubleValue": 1.5 }
        }))
        .unwrap();

        assert_eq!(read_integer(&fields, "price"), None);
        assert_eq!(read_integer(&fields, "stock"), Some(i32::MIN));
        assert_eq!(read_integer(&fields, "code"), None);
    }

    #[test]
    fn test_document_without_name_is_rejected() {
        let err = document_to_product(&Document::default()).unwrap_err();
        assert!(matches!(err, ProductError::Remote(_)));
    }

    #[test]
    fn test_collection_url() {
        let config = FirebaseConfig::new("demo").with_api_base("http://localhost:8080/v1/");
        assert_eq!(
            config.collection_url(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/products"
        );
    }

    #[test]
    fn test_config_requires_project_id() {
        temp_env::with_var_unset("FIREBASE_PROJECT_ID", || {
            let err = FirebaseConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("FIREBASE_PROJECT_ID"));
        });
    }

    const DOCUMENTS_PATH: &str = "/projects/demo/databases/(default)/documents";

    /// Requests observed by the fake Firestore
    #[derive(Clone, Default)]
    struct Recorded {
        patch_queries: Arc<Mutex<Vec<String>>>,
        deleted: Arc<Mutex<Vec<String>>>,
    }

    fn document(collection: &str, id: &str, title: &str) -> Value {
        json!({
            "name": format!("projects/demo/databases/(default)/documents/{}/{}", collection, id),
            "fields": { "title": { "stringValue": title } }
        })
    }

    fn known_title(id: &str) -> Option<&'static str> {
        match id {
            "a1" => Some("Pen"),
            "b2" => Some("Ink"),
            _ => None,
        }
    }

    fn not_found(id: &str) -> AxumResponse {
        (AxumStatus::NOT_FOUND, format!("{} not found", id)).into_response()
    }

    async fn create_document(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({
            "name": "projects/demo/databases/(default)/documents/products/generated1",
            "fields": body["fields"],
        }))
    }

    /// Two pages: `a1` first, then `b2` behind `nextPageToken`
    async fn list_documents(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        match params.get("pageToken").map(String::as_str) {
            None => Json(json!({
                "documents": [document("products", "a1", "Pen")],
                "nextPageToken": "page-2"
            })),
            Some("page-2") => Json(json!({ "documents": [document("products", "b2", "Ink")] })),
            Some(_) => Json(json!({})),
        }
    }

    async fn get_document(Path(id): Path<String>) -> AxumResponse {
        match known_title(&id) {
            Some(title) => Json(document("products", &id, title)).into_response(),
            None => not_found(&id),
        }
    }

    async fn patch_document(
        State(recorded): State<Recorded>,
        Path(id): Path<String>,
        RawQuery(query): RawQuery,
        Json(body): Json<Value>,
    ) -> AxumResponse {
        recorded
            .patch_queries
            .lock()
            .unwrap()
            .push(query.unwrap_or_default());

        match known_title(&id) {
            Some(_) => Json(json!({
                "name": format!("projects/demo/databases/(default)/documents/products/{}", id),
                "fields": body["fields"],
            }))
            .into_response(),
            None => not_found(&id),
        }
    }

    async fn delete_document(State(recorded): State<Recorded>, Path(id): Path<String>) -> AxumResponse {
        match known_title(&id) {
            Some(_) => {
                recorded.deleted.lock().unwrap().push(id);
                Json(json!({})).into_response()
            }
            None => not_found(&id),
        }
    }

    /// Serves a fake Firestore project on an ephemeral port.
    ///
    /// `products` holds `a1` and `b2`; `users/admin` lives in another collection.
    async fn fake_firestore() -> (FirebaseProductStore, Recorded) {
        let recorded = Recorded::default();

        let router = Router::new()
            .route(COLLECTION_PATH, post(create_document).get(list_documents))
            .route(
                &format!("{}/{{id}}", COLLECTION_PATH),
                get(get_document)
                    .patch(patch_document)
                    .delete(delete_document),
            )
            .route(
                &format!("{}/users/admin", DOCUMENTS_PATH),
                get(|| async { Json(document("users", "admin", "leaked from users")) }),
            )
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let store = FirebaseProductStore::new(
            FirebaseConfig::new("demo").with_api_base(format!("http://{}", addr)),
        );
        (store, recorded)
    }

    #[tokio::test]
    async fn test_save_returns_generated_id() {
        let (store, _) = fake_firestore().await;

        let product = store
            .save(ProductInput {
                title: Some("Pen".to_string()),
                price: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(product.id, "generated1");
        assert_eq!(product.title.as_deref(), Some("Pen"));
        assert_eq!(product.price, Some(10));
        assert!(product.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_list_all_follows_page_tokens() {
        let (store, _) = fake_firestore().await;

        let products = store.list_all().await.unwrap();
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2"]);
        assert_eq!(products[1].title.as_deref(), Some("Ink"));
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let (store, _) = fake_firestore().await;

        let err = store.list("nope").await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(ref id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_ids_cannot_leave_the_collection() {
        let (store, recorded) = fake_firestore().await;

        for id in ["../users/admin", "..", ".", "", "a1/../../users/admin"] {
            let err = store.list(id).await.unwrap_err();
            assert!(matches!(err, ProductError::NotFound(_)), "id {:?}", id);
        }

        let err = store.delete("../users/admin").await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(_)));
        assert!(recorded.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_characters_in_id_stay_in_the_path() {
        let (store, _) = fake_firestore().await;

        let err = store.list("a1?pageSize=1").await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(ref id) if id == "a1?pageSize=1"));

        let err = store.list("a1#fragment").await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_sends_field_mask_and_existence_precondition() {
        let (store, recorded) = fake_firestore().await;

        let updated = store
            .update(UpdateProduct::new(
                "a1",
                ProductInput {
                    title: Some("Pen+".to_string()),
                    price: Some(12),
                    ..Default::default()
                },
            ))
            .await
            .unwrap();

        assert_eq!(updated.id, "a1");
        assert_eq!(updated.title.as_deref(), Some("Pen+"));
        assert_eq!(updated.price, Some(12));

        let queries = recorded.patch_queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 1);
        let params: Vec<&str> = queries[0].split('&').collect();
        assert!(params.contains(&"updateMask.fieldPaths=title"));
        assert!(params.contains(&"updateMask.fieldPaths=price"));
        assert!(params.contains(&"currentDocument.exists=true"));
        assert_eq!(params.len(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let (store, _) = fake_firestore().await;

        let err = store
            .update(UpdateProduct::new(
                "zz",
                ProductInput {
                    stock: Some(1),
                    ..Default::default()
                },
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::NotFound(ref id) if id == "zz"));
    }

    #[tokio::test]
    async fn test_update_without_changes_reads_current_document() {
        let (store, recorded) = fake_firestore().await;

        let current = store
            .update(UpdateProduct::new("b2", ProductInput::default()))
            .await
            .unwrap();

        assert_eq!(current.title.as_deref(), Some("Ink"));
        assert!(recorded.patch_queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_document() {
        let (store, recorded) = fake_firestore().await;

        let removed = store.delete("a1").await.unwrap();
        assert_eq!(removed.id, "a1");
        assert_eq!(removed.title.as_deref(), Some("Pen"));
        assert_eq!(*recorded.deleted.lock().unwrap(), vec!["a1".to_string()]);

        let err = store.delete("zz").await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_all_removes_every_page() {
        let (store, recorded) = fake_firestore().await;

        let removed = store.delete_all().await.unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(
            *recorded.deleted.lock().unwrap(),
            vec!["a1".to_string(), "b2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_health_check_lists_one_page() {
        let (store, _) = fake_firestore().await;
        assert!(store.health_check().await.is_ok());
    }
}
