use async_trait::async_trait;
use chrono::Utc;
use log::{debug, LevelFilter};
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Unchanged,
};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{check_tenant_connection_string, page_bounds, DepartmentRepository, INSERT_FAILED};
use crate::db::Dialect;
use crate::entities::departments;
use crate::errors::AppError;
use crate::models::department::{like_pattern, search_term};
use crate::models::{Department, PagedResult, SortOrder};

/// How long an ORM connection lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextLifetime {
    /// A new connection per repository call.
    #[default]
    Transient,
    /// One connection, opened on first use and reused afterwards.
    Shared,
}

impl FromStr for ContextLifetime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transient" => Ok(ContextLifetime::Transient),
            "shared" | "singleton" | "scoped" => Ok(ContextLifetime::Shared),
            other => Err(AppError::Configuration(format!(
                "Unsupported ORM context lifetime '{}'. Supported: transient, shared.",
                other
            ))),
        }
    }
}

/// Hands out sea-orm connections according to a [`ContextLifetime`].
pub struct DepartmentContextFactory {
    connection_string: String,
    lifetime: ContextLifetime,
    shared: OnceCell<DatabaseConnection>,
}

impl DepartmentContextFactory {
    pub fn new(connection_string: impl Into<String>, lifetime: ContextLifetime) -> Result<Self, AppError> {
        let connection_string = connection_string.into();
        if connection_string.trim().is_empty() {
            return Err(AppError::Configuration(
                "Connection string must not be null or empty.".to_string(),
            ));
        }

        Ok(Self {
            connection_string,
            lifetime,
            shared: OnceCell::new(),
        })
    }

    pub fn lifetime(&self) -> ContextLifetime {
        self.lifetime
    }

    pub fn dialect(&self) -> Result<Dialect, AppError> {
        Dialect::from_connection_string(&self.connection_string)
    }

    pub async fn create_context(&self) -> Result<DatabaseConnection, AppError> {
        let db = match self.lifetime {
            ContextLifetime::Transient => self.connect(1).await?,
            ContextLifetime::Shared => self
                .shared
                .get_or_try_init(|| self.connect(10))
                .await?
                .clone(),
        };
        Ok(db)
    }

    async fn connect(&self, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
        let mut options = ConnectOptions::new(self.connection_string.clone());
        options
            .max_connections(max_connections)
            .sqlx_logging_level(LevelFilter::Debug);
        Database::connect(options).await
    }
}

/// sea-orm backed repository. Reads come back as plain models; writes go
/// through an `ActiveModel` that only marks the columns being changed.
pub struct DepartmentRepositoryOrm {
    factory: DepartmentContextFactory,
}

impl DepartmentRepositoryOrm {
    pub fn new(factory: DepartmentContextFactory) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl DepartmentRepository for DepartmentRepositoryOrm {
    async fn add(&self, department: Department) -> Result<Department, AppError> {
        let db = self.factory.create_context().await?;

        let active_model = departments::ActiveModel {
            id: NotSet,
            active: Set(Some(department.active.unwrap_or(true))),
            created_at: Set(Some(Utc::now())),
            created_by: Set(department.created_by),
            name: Set(department.name),
        };

        let model = active_model.insert(&db).await.map_err(|err| match err {
            DbErr::RecordNotInserted => AppError::InvalidOperation(INSERT_FAILED.to_string()),
            other => AppError::from(other),
        })?;

        debug!("Department {} added (orm)", model.id);
        Ok(model.into())
    }

    async fn get_all(&self) -> Result<Vec<Department>, AppError> {
        let db = self.factory.create_context().await?;

        let models = departments::Entity::find()
            .order_by_desc(departments::Column::Id)
            .all(&db)
            .await?;
        Ok(models.into_iter().map(Department::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Department>, AppError> {
        let db = self.factory.create_context().await?;

        let model = departments::Entity::find_by_id(id).one(&db).await?;
        Ok(model.map(Department::from))
    }

    async fn update(&self, department: &Department) -> Result<bool, AppError> {
        let db = self.factory.create_context().await?;

        // Attached without a prior load: only active/name are marked dirty.
        let active_model = departments::ActiveModel {
            id: Unchanged(department.id),
            active: Set(Some(department.active.unwrap_or(true))),
            created_at: NotSet,
            created_by: NotSet,
            name: Set(department.name.clone()),
        };

        let result = departments::Entity::update_many()
            .set(active_model)
            .filter(departments::Column::Id.eq(department.id))
            .exec(&db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let db = self.factory.create_context().await?;

        let result = departments::Entity::delete_by_id(id).exec(&db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn search(
        &self,
        page_index: u32,
        page_size: u32,
        search_query: &str,
        sort_order: SortOrder,
    ) -> Result<PagedResult<Department>, AppError> {
        let db = self.factory.create_context().await?;
        let (offset, limit) = page_bounds(page_index, page_size);

        let mut query = departments::Entity::find();
        if let Some(term) = search_term(search_query) {
            query = query.filter(
                departments::Column::Name.like(LikeExpr::new(like_pattern(term)).escape('\\')),
            );
        }

        let total_count = query.clone().count(&db).await?;

        let query = match sort_order {
            SortOrder::Newest => query.order_by_desc(departments::Column::Id),
            SortOrder::Name => query
                .order_by_asc(departments::Column::Name)
                .order_by_desc(departments::Column::Id),
            SortOrder::NameDesc => query
                .order_by_desc(departments::Column::Name)
                .order_by_desc(departments::Column::Id),
        };

        let models = query
            .offset(offset as u64)
            .limit(limit as u64)
            .all(&db)
            .await?;

        Ok(PagedResult::new(
            models.into_iter().map(Department::from).collect(),
            total_count as i64,
        ))
    }

    /// Tenant handles always connect per call, whatever the default lifetime.
    fn for_tenant(&self, connection_string: &str) -> Result<Arc<dyn DepartmentRepository>, AppError> {
        check_tenant_connection_string(connection_string, self.factory.dialect()?)?;
        let factory = DepartmentContextFactory::new(connection_string, ContextLifetime::Transient)?;
        Ok(Arc::new(DepartmentRepositoryOrm::new(factory)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_lifetime_parses_selectors() {
        assert_eq!("Transient".parse::<ContextLifetime>().unwrap(), ContextLifetime::Transient);
        assert_eq!("singleton".parse::<ContextLifetime>().unwrap(), ContextLifetime::Shared);
        assert!("forever".parse::<ContextLifetime>().is_err());
    }

    #[test]
    fn tenant_handle_rejects_a_foreign_dialect() {
        let factory = DepartmentContextFactory::new("sqlite://master.db", ContextLifetime::Shared).unwrap();
        assert_eq!(factory.dialect().unwrap(), Dialect::Sqlite);
        assert_eq!(factory.lifetime(), ContextLifetime::Shared);

        let repository = DepartmentRepositoryOrm::new(factory);
        assert!(repository.for_tenant("sqlite://tenant_a.db").is_ok());
        assert!(matches!(
            repository.for_tenant("postgres://localhost/tenant_a"),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn factory_rejects_blank_connection_string() {
        let err = DepartmentContextFactory::new("  ", ContextLifetime::Transient).err();
        assert!(matches!(err, Some(AppError::Configuration(_))));
    }
}
