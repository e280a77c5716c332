use async_graphql::{ErrorExtensions, SimpleObject};
use serde::Serialize;

use crate::auth::UNAUTHORIZED_MESSAGE;
use crate::error::ProductError;

/// Error code carried by every envelope
pub const ENVELOPE_ERR: i32 = -1;

/// Uniform failure value returned by resolvers instead of a raw fault.
///
/// Serializes as `{"err": -1, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SimpleObject)]
#[graphql(name = "ErrorEnvelope")]
pub struct Envelope {
    pub err: i32,
    pub message: String,
}

/// Resolver result: the domain value or an [`Envelope`]
pub type Outcome<T> = Result<T, Envelope>;

impl Envelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            err: ENVELOPE_ERR,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(UNAUTHORIZED_MESSAGE)
    }

    /// GraphQL error with `extensions: { err: -1 }`
    pub fn to_graphql_error(&self) -> async_graphql::Error {
        let err = self.err;
        async_graphql::Error::new(self.message.clone()).extend_with(|_, e| e.set("err", err))
    }
}

impl From<ProductError> for Envelope {
    fn from(err: ProductError) -> Self {
        Self::new(err.to_string())
    }
}
