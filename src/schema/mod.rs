//! Idempotent creation and reconciliation of the `departments` table.
//!
//! For each target database: create the table when it is missing, otherwise
//! add any missing column (never dropping, reordering, or rewriting), then
//! seed two default rows when the table is empty. The master database is
//! handled by [`DepartmentsTableBuilder::build_master_database`]; tenant
//! databases listed in the master's `tenants` table by
//! [`DepartmentsTableBuilder::build_tenant_databases`], where one tenant's
//! failure never stops the others.

use log::{error, info, warn};

use crate::db::{database_label, on_connection, Dialect, StoreConnection};
use crate::errors::AppError;

pub mod postgres;
pub mod sqlite;

pub const SEED_NAMES: [&str; 2] = ["Initial Department 1", "Initial Department 2"];
pub const SEED_CREATED_BY: &str = "System";

/// What a single reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub table_created: bool,
    pub columns_added: Vec<&'static str>,
    pub seeded_rows: u64,
}

#[derive(Debug)]
pub struct TenantOutcome {
    /// Loggable database label, never the raw connection string.
    pub tenant: String,
    pub outcome: Result<SchemaReport, AppError>,
}

pub struct DepartmentsTableBuilder {
    master_connection_string: String,
    dialect: Dialect,
}

impl DepartmentsTableBuilder {
    pub fn new(master_connection_string: impl Into<String>, dialect: Dialect) -> Result<Self, AppError> {
        let master_connection_string = master_connection_string.into();
        if master_connection_string.trim().is_empty() {
            return Err(AppError::Configuration(
                "Master connection string is not configured.".to_string(),
            ));
        }

        Ok(Self {
            master_connection_string,
            dialect,
        })
    }

    pub async fn build_master_database(&self) -> Result<SchemaReport, AppError> {
        let db_name = database_label(&self.master_connection_string);

        match self.ensure_departments_table(&self.master_connection_string).await {
            Ok(report) => {
                info!("Departments table processed (master DB: {}): {:?}", db_name, report);
                Ok(report)
            }
            Err(err) => {
                error!("Error processing master DB {}: {}", db_name, err);
                Err(err)
            }
        }
    }

    /// Reconciles every tenant database. Only a failure to read the tenant
    /// registry itself is returned as an error.
    pub async fn build_tenant_databases(&self) -> Result<Vec<TenantOutcome>, AppError> {
        let tenant_connection_strings = self.tenant_connection_strings().await?;
        let mut outcomes = Vec::with_capacity(tenant_connection_strings.len());

        for connection_string in &tenant_connection_strings {
            let tenant = database_label(connection_string);
            let outcome = self.ensure_departments_table(connection_string).await;

            match &outcome {
                Ok(report) => info!("Departments table processed (tenant DB: {}): {:?}", tenant, report),
                Err(err) => error!("Error processing tenant DB {}: {}", tenant, err),
            }

            outcomes.push(TenantOutcome { tenant, outcome });
        }

        Ok(outcomes)
    }

    pub async fn tenant_connection_strings(&self) -> Result<Vec<String>, AppError> {
        let mut conn = StoreConnection::open(self.dialect, &self.master_connection_string).await?;

        let rows: Vec<Option<String>> = on_connection!(conn, |c, Db| {
            sqlx::query_scalar("SELECT connection_string FROM tenants")
                .fetch_all(&mut *c)
                .await?
        });
        conn.close().await?;

        Ok(rows
            .into_iter()
            .flatten()
            .filter(|connection_string| !connection_string.trim().is_empty())
            .collect())
    }

    pub async fn ensure_departments_table(&self, connection_string: &str) -> Result<SchemaReport, AppError> {
        let mut conn = StoreConnection::open(self.dialect, connection_string).await?;

        let report = match &mut conn {
            StoreConnection::Postgres(c) => postgres::ensure_departments_table(c).await?,
            StoreConnection::Sqlite(c) => sqlite::ensure_departments_table(c).await?,
        };
        conn.close().await?;

        Ok(report)
    }

    /// Startup entry point. Never fails: every error is logged and startup
    /// continues.
    pub async fn run(master_connection_string: &str, dialect: Dialect, for_master: bool) {
        let builder = match DepartmentsTableBuilder::new(master_connection_string, dialect) {
            Ok(builder) => builder,
            Err(err) => {
                error!("Error while processing Departments table: {}", err);
                return;
            }
        };

        if for_master {
            // Already logged by build_master_database.
            let _ = builder.build_master_database().await;
            return;
        }

        match builder.build_tenant_databases().await {
            Ok(outcomes) => {
                let failed = outcomes.iter().filter(|o| o.outcome.is_err()).count();
                if failed > 0 {
                    warn!(
                        "Departments table failed on {} of {} tenant databases",
                        failed,
                        outcomes.len()
                    );
                }
            }
            Err(err) => error!("Error while reading tenant registry: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_master_connection_string() {
        let err = DepartmentsTableBuilder::new("", Dialect::Sqlite).err();
        assert!(matches!(err, Some(AppError::Configuration(_))));
    }
}
