//! Department data access.
//!
//! [`DepartmentRepository`] is the single capability the rest of the crate
//! depends on. Three interchangeable implementations are provided and picked
//! at composition time through [`RepositoryMode`]:
//!
//! - [`DepartmentRepositoryRawSql`]: hand-written statements, explicit binds,
//!   manual row mapping.
//! - [`DepartmentRepositoryMicroOrm`]: generated placeholders and
//!   `FromRow`-derived mapping.
//! - [`DepartmentRepositoryOrm`]: sea-orm entity, no change tracking on reads.
//!
//! All three are expected to be observably identical.

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::Dialect;
use crate::errors::AppError;
use crate::models::{Department, PagedResult, SortOrder};

pub mod micro_orm;
pub mod orm;
pub mod raw_sql;

pub use micro_orm::DepartmentRepositoryMicroOrm;
pub use orm::{ContextLifetime, DepartmentContextFactory, DepartmentRepositoryOrm};
pub use raw_sql::DepartmentRepositoryRawSql;

pub(crate) const INSERT_FAILED: &str = "Failed to insert Department. No ID was returned.";

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// Inserts `department`; the store assigns `id`, `created_at` is stamped
    /// with the current UTC time.
    async fn add(&self, department: Department) -> Result<Department, AppError>;

    /// Every department, newest identity first.
    async fn get_all(&self) -> Result<Vec<Department>, AppError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Department>, AppError>;

    /// Writes `active` and `name` only. Returns whether a row was affected.
    async fn update(&self, department: &Department) -> Result<bool, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Zero-based page of departments whose name contains `search_query`
    /// (all departments when the query is blank).
    async fn search(
        &self,
        page_index: u32,
        page_size: u32,
        search_query: &str,
        sort_order: SortOrder,
    ) -> Result<PagedResult<Department>, AppError>;

    /// Same strategy, routed to another database (a tenant listed in the
    /// master's registry). The handle opens its own connection per call.
    fn for_tenant(&self, connection_string: &str) -> Result<Arc<dyn DepartmentRepository>, AppError>;
}

/// Which repository implementation gets registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepositoryMode {
    RawSql,
    MicroOrm,
    #[default]
    Orm,
}

impl FromStr for RepositoryMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "raw-sql" | "rawsql" | "sql" => Ok(RepositoryMode::RawSql),
            "micro-orm" | "microorm" => Ok(RepositoryMode::MicroOrm),
            "orm" => Ok(RepositoryMode::Orm),
            other => Err(AppError::Configuration(format!(
                "Invalid repository mode '{}'. Supported modes: raw-sql, micro-orm, orm.",
                other
            ))),
        }
    }
}

/// Rejects a blank override or one pointing at a different engine than the
/// default connection.
pub(crate) fn check_tenant_connection_string(connection_string: &str, dialect: Dialect) -> Result<(), AppError> {
    if connection_string.trim().is_empty() {
        return Err(AppError::Configuration(
            "Tenant connection string must not be empty.".to_string(),
        ));
    }

    let tenant_dialect = Dialect::from_connection_string(connection_string)?;
    if tenant_dialect != dialect {
        return Err(AppError::Configuration(format!(
            "Tenant connection string is {} but the department module is configured for {}.",
            tenant_dialect, dialect
        )));
    }
    Ok(())
}

pub(crate) fn page_bounds(page_index: u32, page_size: u32) -> (i64, i64) {
    let offset = i64::from(page_index).saturating_mul(i64::from(page_size));
    (offset, i64::from(page_size))
}
