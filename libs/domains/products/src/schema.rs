//! GraphQL schema
//!
//! Field names and arguments are the same in both error modes; only the
//! result types differ.
//!
//! [`ErrorMode::Envelope`] (default) carries failures as data:
//!
//! ```graphql
//! union ProductOutcome = Product | ErrorEnvelope
//!
//! type Query {
//!   list(id: ID!): ProductOutcome!
//!   listAll: [ProductOutcome!]!
//! }
//!
//! type Mutation {
//!   save(data: ProductInput): ProductOutcome!
//!   update(id: ID!, data: ProductInput): ProductOutcome!
//!   deleteOne(id: ID!): ProductOutcome!
//!   deleteAll: [ProductOutcome!]!
//! }
//! ```
//!
//! List fields hold the products on success and a single `ErrorEnvelope`
//! on failure.
//!
//! [`ErrorMode::Native`] serves plain product types and reports failures in
//! the GraphQL `errors` array with `extensions.err = -1`:
//!
//! ```graphql
//! type Query {
//!   list(id: ID!): Product
//!   listAll: [Product]
//! }
//!
//! type Mutation {
//!   save(data: ProductInput): Product
//!   update(id: ID!, data: ProductInput): Product
//!   deleteOne(id: ID!): Product
//!   deleteAll: [Product]
//! }
//! ```

use async_graphql::{Context, EmptySubscription, Object, Request, Response, Schema, Union, ID};
use core_config::{env_bool_or, ConfigError, FromEnv};

use crate::auth::AuthContext;
use crate::envelope::{Envelope, Outcome};
use crate::models::{Product, ProductInput};
use crate::service::ProductService;

pub type EnvelopeSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;
pub type NativeSchema = Schema<NativeQueryRoot, NativeMutationRoot, EmptySubscription>;

/// The executable schema for the configured [`ErrorMode`]
#[derive(Clone)]
pub enum CatalogSchema {
    Envelope(EnvelopeSchema),
    Native(NativeSchema),
}

impl CatalogSchema {
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        match self {
            CatalogSchema::Envelope(schema) => schema.execute(request).await,
            CatalogSchema::Native(schema) => schema.execute(request).await,
        }
    }

    pub fn sdl(&self) -> String {
        match self {
            CatalogSchema::Envelope(schema) => schema.sdl(),
            CatalogSchema::Native(schema) => schema.sdl(),
        }
    }

    pub fn mode(&self) -> ErrorMode {
        match self {
            CatalogSchema::Envelope(_) => ErrorMode::Envelope,
            CatalogSchema::Native(_) => ErrorMode::Native,
        }
    }
}

#[derive(Union)]
pub enum ProductOutcome {
    Product(Product),
    ErrorEnvelope(Envelope),
}

/// How resolver failures reach the client
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// `{err: -1, message}` returned as data
    #[default]
    Envelope,
    /// GraphQL `errors` entries with `extensions.err = -1`
    Native,
}

impl FromEnv for ErrorMode {
    /// Reads GRAPHQL_NATIVE_ERRORS (default: false)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(if env_bool_or("GRAPHQL_NATIVE_ERRORS", false)? {
            ErrorMode::Native
        } else {
            ErrorMode::Envelope
        })
    }
}

fn single(outcome: Outcome<Product>) -> ProductOutcome {
    match outcome {
        Ok(product) => ProductOutcome::Product(product),
        Err(envelope) => ProductOutcome::ErrorEnvelope(envelope),
    }
}

fn many(outcome: Outcome<Vec<Product>>) -> Vec<ProductOutcome> {
    match outcome {
        Ok(products) => products.into_iter().map(ProductOutcome::Product).collect(),
        Err(envelope) => vec![ProductOutcome::ErrorEnvelope(envelope)],
    }
}

fn native_single(outcome: Outcome<Product>) -> async_graphql::Result<Option<Product>> {
    outcome.map(Some).map_err(|e| e.to_graphql_error())
}

fn native_many(outcome: Outcome<Vec<Product>>) -> async_graphql::Result<Option<Vec<Option<Product>>>> {
    outcome
        .map(|products| Some(products.into_iter().map(Some).collect()))
        .map_err(|e| e.to_graphql_error())
}

fn service<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a ProductService> {
    ctx.data::<ProductService>()
}

/// Requests without an attached context are treated as anonymous
fn auth(ctx: &Context<'_>) -> AuthContext {
    ctx.data_opt::<AuthContext>()
        .copied()
        .unwrap_or_else(AuthContext::anonymous)
}

pub struct QueryRoot;

#[Object(name = "Query")]
impl QueryRoot {
    async fn list(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ProductOutcome> {
        Ok(single(service(ctx)?.list(&id).await))
    }

    async fn list_all(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<ProductOutcome>> {
        Ok(many(service(ctx)?.list_all().await))
    }
}

pub struct MutationRoot;

#[Object(name = "Mutation")]
impl MutationRoot {
    async fn save(
        &self,
        ctx: &Context<'_>,
        data: Option<ProductInput>,
    ) -> async_graphql::Result<ProductOutcome> {
        let outcome = service(ctx)?
            .save(&auth(ctx), data.unwrap_or_default())
            .await;
        Ok(single(outcome))
    }

    async fn update(
        &self,
        ctx: &Context<'_>,
        id: ID,
        data: Option<ProductInput>,
    ) -> async_graphql::Result<ProductOutcome> {
        let outcome = service(ctx)?
            .update(&auth(ctx), id.0, data.unwrap_or_default())
            .await;
        Ok(single(outcome))
    }

    async fn delete_one(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ProductOutcome> {
        Ok(single(service(ctx)?.delete_one(&auth(ctx), &id).await))
    }

    async fn delete_all(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<ProductOutcome>> {
        Ok(many(service(ctx)?.delete_all(&auth(ctx)).await))
    }
}

pub struct NativeQueryRoot;

#[Object(name = "Query")]
impl NativeQueryRoot {
    async fn list(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<Product>> {
        native_single(service(ctx)?.list(&id).await)
    }

    async fn list_all(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Option<Vec<Option<Product>>>> {
        native_many(service(ctx)?.list_all().await)
    }
}

pub struct NativeMutationRoot;

#[Object(name = "Mutation")]
impl NativeMutationRoot {
    async fn save(
        &self,
        ctx: &Context<'_>,
        data: Option<ProductInput>,
    ) -> async_graphql::Result<Option<Product>> {
        let outcome = service(ctx)?
            .save(&auth(ctx), data.unwrap_or_default())
            .await;
        native_single(outcome)
    }

    async fn update(
        &self,
        ctx: &Context<'_>,
        id: ID,
        data: Option<ProductInput>,
    ) -> async_graphql::Result<Option<Product>> {
        let outcome = service(ctx)?
            .update(&auth(ctx), id.0, data.unwrap_or_default())
            .await;
        native_single(outcome)
    }

    async fn delete_one(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<Product>> {
        native_single(service(ctx)?.delete_one(&auth(ctx), &id).await)
    }

    async fn delete_all(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Option<Vec<Option<Product>>>> {
        native_many(service(ctx)?.delete_all(&auth(ctx)).await)
    }
}

/// Build the schema around `service`; per-request [`AuthContext`]s are attached by the handler
pub fn build_schema(service: ProductService, mode: ErrorMode) -> CatalogSchema {
    match mode {
        ErrorMode::Envelope => CatalogSchema::Envelope(
            Schema::build(QueryRoot, MutationRoot, EmptySubscription)
                .data(service)
                .finish(),
        ),
        ErrorMode::Native => CatalogSchema::Native(
            Schema::build(NativeQueryRoot, NativeMutationRoot, EmptySubscription)
                .data(service)
                .finish(),
        ),
    }
}
