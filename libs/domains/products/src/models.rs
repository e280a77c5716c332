use async_graphql::{ComplexObject, InputObject, SimpleObject, ID};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entry as returned by every store.
///
/// Only `id` is guaranteed; stores decide which of the other fields they
/// require. Serialized with camelCase keys (`photoUrl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
#[graphql(complex)]
pub struct Product {
    /// Store-generated identifier, exposed as `ID!`
    #[graphql(skip)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub price: Option<i32>,
    /// RFC 3339 creation time
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub stock: Option<i32>,
}

#[ComplexObject]
impl Product {
    #[graphql(name = "id")]
    async fn graphql_id(&self) -> ID {
        ID(self.id.clone())
    }
}

/// Client-supplied product fields.
///
/// Has no `id` or `timestamp`; unknown keys in a JSON payload are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, InputObject)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub price: Option<i32>,
    #[serde(default)]
    pub stock: Option<i32>,
}

/// Changes to apply to the product identified by `id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProduct {
    pub id: String,
    pub changes: ProductInput,
}

impl UpdateProduct {
    pub fn new(id: impl Into<String>, changes: ProductInput) -> Self {
        Self {
            id: id.into(),
            changes,
        }
    }
}

/// Current UTC time in RFC 3339 with millisecond precision
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Product {
    /// Build a fresh record from `input`, stamped with the current time
    pub fn new(id: impl Into<String>, input: ProductInput) -> Self {
        Self {
            id: id.into(),
            title: input.title,
            description: input.description,
            code: input.code,
            photo_url: input.photo_url,
            price: input.price,
            timestamp: Some(now_timestamp()),
            stock: input.stock,
        }
    }

    /// Overwrite the fields present in `changes`; `id` and `timestamp` are kept
    pub fn apply_update(&mut self, changes: ProductInput) {
        if let Some(title) = changes.title {
            self.title = Some(title);
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(code) = changes.code {
            self.code = Some(code);
        }
        if let Some(photo_url) = changes.photo_url {
            self.photo_url = Some(photo_url);
        }
        if let Some(price) = changes.price {
            self.price = Some(price);
        }
        if let Some(stock) = changes.stock {
            self.stock = Some(stock);
        }
    }
}
