//! HTTP binding for the catalog schema

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::auth::AccessPolicy;
use crate::schema::CatalogSchema;

pub const GRAPHQL_PATH: &str = "/graphql";

#[derive(Clone)]
pub struct GraphQLState {
    schema: CatalogSchema,
    policy: Arc<AccessPolicy>,
}

/// Executes a GraphQL document with the caller's [`AuthContext`](crate::AuthContext)
async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let auth = state.policy.authorize(&headers);
    state
        .schema
        .execute(request.into_inner().data(auth))
        .await
        .into()
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

/// `POST /graphql` executes documents, `GET /graphql` serves GraphiQL
pub fn router(schema: CatalogSchema, policy: AccessPolicy) -> Router {
    let state = GraphQLState {
        schema,
        policy: Arc::new(policy),
    };

    Router::new()
        .route(GRAPHQL_PATH, get(graphiql).post(graphql_handler))
        .with_state(state)
}
