//! Mutation access control
//!
//! An [`AccessPolicy`] is fixed at startup. Each request is turned into an
//! [`AuthContext`] that the mutating resolvers receive as an argument.

use axum::http::{header, HeaderMap};
use core_config::{env_bool_or, env_optional, ConfigError, FromEnv};
use subtle::ConstantTimeEq;

/// Message reported when a mutation is denied
pub const UNAUTHORIZED_MESSAGE: &str = "ruta no autorizada";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessConfig {
    /// Master switch; `false` denies every mutation
    pub admin: bool,
    /// When set, mutations also need `Authorization: Bearer <token>`
    pub admin_token: Option<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin: true,
            admin_token: None,
        }
    }
}

impl FromEnv for AccessConfig {
    /// Reads CATALOG_ADMIN (default: true) and CATALOG_ADMIN_TOKEN (optional)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            admin: env_bool_or("CATALOG_ADMIN", true)?,
            admin_token: env_optional("CATALOG_ADMIN_TOKEN"),
        })
    }
}

/// Per-request authorization decision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthContext {
    admin: bool,
}

impl AuthContext {
    pub fn admin() -> Self {
        Self { admin: true }
    }

    pub fn anonymous() -> Self {
        Self { admin: false }
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

#[derive(Clone, Debug)]
pub struct AccessPolicy {
    config: AccessConfig,
}

impl AccessPolicy {
    pub fn new(config: AccessConfig) -> Self {
        Self { config }
    }

    pub fn allow_all() -> Self {
        Self::new(AccessConfig::default())
    }

    pub fn deny_all() -> Self {
        Self::new(AccessConfig {
            admin: false,
            admin_token: None,
        })
    }

    pub fn requires_token(&self) -> bool {
        self.config.admin && self.config.admin_token.is_some()
    }

    /// Decide whether the request carrying `headers` may mutate the catalog
    pub fn authorize(&self, headers: &HeaderMap) -> AuthContext {
        if !self.config.admin {
            return AuthContext::anonymous();
        }

        match self.config.admin_token {
            None => AuthContext::admin(),
            Some(ref expected) => match bearer_token(headers) {
                Some(presented) if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) => {
                    AuthContext::admin()
                }
                _ => AuthContext::anonymous(),
            },
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}
