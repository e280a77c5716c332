//! Configuration for Products API

use core_config::{
    app_info,
    server::{CorsConfig, ServerConfig},
    AppInfo, FromEnv,
};
use domain_products::{AccessConfig, ErrorMode, StoreConfig};

pub use core_config::Environment;

/// Application configuration
///
/// Provider-specific settings (file path, MongoDB, Firestore) are read by the
/// selected provider's factory, so only the chosen backend's variables are required.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub store: StoreConfig,
    pub access: AccessConfig,
    pub error_mode: ErrorMode,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            cors: CorsConfig::from_env()?,
            store: StoreConfig::from_env()?,
            access: AccessConfig::from_env()?,
            error_mode: ErrorMode::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_products::StoreKind;

    const VARS: [&str; 8] = [
        "APP_ENV",
        "HOST",
        "PORT",
        "CORS_ALLOWED_ORIGIN",
        "DB",
        "CATALOG_ADMIN",
        "CATALOG_ADMIN_TOKEN",
        "GRAPHQL_NATIVE_ERRORS",
    ];

    fn with_env<F: FnOnce()>(set: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = VARS
            .iter()
            .map(|key| {
                let value = set.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_defaults_with_only_db_set() {
        with_env(&[("DB", "memory")], || {
            let config = Config::from_env().unwrap();

            assert_eq!(config.app.name, "products_api");
            assert_eq!(config.environment, Environment::Development);
            assert_eq!(config.server.address(), "0.0.0.0:8080");
            assert!(!config.cors.is_enabled());
            assert_eq!(config.store.kind, StoreKind::Memory);
            assert_eq!(config.access, AccessConfig::default());
            assert_eq!(config.error_mode, ErrorMode::Envelope);
        });
    }

    #[test]
    fn test_full_configuration() {
        with_env(
            &[
                ("APP_ENV", "production"),
                ("PORT", "4000"),
                ("CORS_ALLOWED_ORIGIN", "https://shop.example.com"),
                ("DB", "Archivo"),
                ("CATALOG_ADMIN_TOKEN", "s3cret"),
                ("GRAPHQL_NATIVE_ERRORS", "1"),
            ],
            || {
                let config = Config::from_env().unwrap();

                assert!(config.environment.is_production());
                assert_eq!(config.server.port, 4000);
                assert!(config.cors.is_enabled());
                assert_eq!(config.store.kind, StoreKind::Archivo);
                assert_eq!(config.access.admin_token.as_deref(), Some("s3cret"));
                assert_eq!(config.error_mode, ErrorMode::Native);
            },
        );
    }

    #[test]
    fn test_missing_db_is_an_error() {
        with_env(&[], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("DB"));
        });
    }

    #[test]
    fn test_unknown_db_token_names_the_token() {
        with_env(&[("DB", "postgres")], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("postgres"));
        });
    }
}
