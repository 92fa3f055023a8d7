//! Wires the department module into an actix-web application.

use actix_web::web;
use log::info;
use std::sync::Arc;

use crate::db::Dialect;
use crate::errors::AppError;
use crate::handlers;
use crate::repositories::{
    ContextLifetime, DepartmentContextFactory, DepartmentRepository, DepartmentRepositoryMicroOrm,
    DepartmentRepositoryOrm, DepartmentRepositoryRawSql, RepositoryMode,
};

/// The registered department services, cloned into every actix worker.
#[derive(Clone)]
pub struct DepartmentServices {
    repository: web::Data<dyn DepartmentRepository>,
    mode: RepositoryMode,
}

impl DepartmentServices {
    pub fn repository(&self) -> Arc<dyn DepartmentRepository> {
        self.repository.clone().into_inner()
    }

    pub fn mode(&self) -> RepositoryMode {
        self.mode
    }

    /// The registered strategy, routed to a tenant database.
    pub fn tenant_repository(&self, connection_string: &str) -> Result<Arc<dyn DepartmentRepository>, AppError> {
        self.repository.for_tenant(connection_string)
    }

    /// Installs the repository as `web::Data<dyn DepartmentRepository>` and
    /// mounts the export endpoint.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.repository.clone()).service(
            web::resource("/api/DepartmentExport/Excel")
                .route(web::get().to(handlers::department_export::export_to_excel)),
        );
    }
}

/// Builds the repository selected by `mode`.
///
/// Fails when the connection string is blank or does not belong to
/// `dialect`. `lifetime` only matters for [`RepositoryMode::Orm`].
pub fn add_department_services(
    connection_string: &str,
    mode: RepositoryMode,
    dialect: Dialect,
    lifetime: ContextLifetime,
) -> Result<DepartmentServices, AppError> {
    if connection_string.trim().is_empty() {
        return Err(AppError::Configuration(
            "Connection string for the department module is not configured.".to_string(),
        ));
    }

    let inferred = Dialect::from_connection_string(connection_string)?;
    if inferred != dialect {
        return Err(AppError::Configuration(format!(
            "Unsupported dialect '{}' for a {} connection string. Supported: postgres, sqlite.",
            dialect, inferred
        )));
    }

    let repository: Arc<dyn DepartmentRepository> = match mode {
        RepositoryMode::RawSql => Arc::new(DepartmentRepositoryRawSql::new(connection_string, dialect)),
        RepositoryMode::MicroOrm => Arc::new(DepartmentRepositoryMicroOrm::new(connection_string, dialect)),
        RepositoryMode::Orm => {
            let factory = DepartmentContextFactory::new(connection_string, lifetime)?;
            info!("ORM context lifetime: {:?}", factory.lifetime());
            Arc::new(DepartmentRepositoryOrm::new(factory))
        }
    };

    info!("Department repository registered (mode: {:?}, dialect: {})", mode, dialect);

    Ok(DepartmentServices {
        repository: web::Data::from(repository),
        mode,
    })
}
