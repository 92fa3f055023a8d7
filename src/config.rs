use std::env;

use crate::db::Dialect;
use crate::errors::AppError;
use crate::repositories::{ContextLifetime, RepositoryMode};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub dialect: Dialect,
    pub repository_mode: RepositoryMode,
    pub context_lifetime: ContextLifetime,
    pub bind_address: String,
    pub build_tenant_databases: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("DATABASE_URL must be set".to_string()))?;

        let dialect = match lookup("DATABASE_DIALECT") {
            Some(value) => value.parse()?,
            None => Dialect::from_connection_string(&database_url)?,
        };

        let repository_mode = match lookup("DEPARTMENT_REPOSITORY_MODE") {
            Some(value) => value.parse()?,
            None => RepositoryMode::default(),
        };

        let context_lifetime = match lookup("ORM_CONTEXT_LIFETIME") {
            Some(value) => value.parse()?,
            None => ContextLifetime::default(),
        };

        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let build_tenant_databases = match lookup("BUILD_TENANT_DATABASES") {
            Some(value) => parse_flag(&value)?,
            None => false,
        };

        Ok(Self {
            database_url,
            dialect,
            repository_mode,
            context_lifetime,
            bind_address,
            build_tenant_databases,
        })
    }
}

fn parse_flag(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Configuration(format!(
            "BUILD_TENANT_DATABASES must be a boolean, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "sqlite://hr.db")])).unwrap();
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert_eq!(config.repository_mode, RepositoryMode::Orm);
        assert_eq!(config.context_lifetime, ContextLifetime::Transient);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert!(!config.build_tenant_databases);
    }

    #[test]
    fn explicit_selectors_override_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/hr"),
            ("DEPARTMENT_REPOSITORY_MODE", "micro-orm"),
            ("ORM_CONTEXT_LIFETIME", "shared"),
            ("BIND_ADDRESS", "0.0.0.0:9000"),
            ("BUILD_TENANT_DATABASES", "true"),
        ]))
        .unwrap();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.repository_mode, RepositoryMode::MicroOrm);
        assert_eq!(config.context_lifetime, ContextLifetime::Shared);
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert!(config.build_tenant_databases);
    }

    #[test]
    fn missing_url_or_bad_selector_is_fatal() {
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&[])),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "sqlite://hr.db"),
                ("DEPARTMENT_REPOSITORY_MODE", "entity-framework"),
            ])),
            Err(AppError::Configuration(_))
        ));
    }
}
