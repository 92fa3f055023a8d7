use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sqlx::QueryBuilder;
use std::sync::Arc;

use super::{check_tenant_connection_string, page_bounds, DepartmentRepository, INSERT_FAILED};
use crate::db::{on_connection, Dialect, StoreConnection};
use crate::errors::AppError;
use crate::models::department::{like_pattern, search_term};
use crate::models::{Department, PagedResult, SortOrder};

const SELECT_COLUMNS: &str = "SELECT id, active, created_at, created_by, name FROM departments";
const RETURNING_COLUMNS: &str = " RETURNING id, active, created_at, created_by, name";

/// Same statements as the raw variant, but placeholders come from
/// `QueryBuilder::push_bind` and rows are mapped by `FromRow`.
pub struct DepartmentRepositoryMicroOrm {
    connection_string: String,
    dialect: Dialect,
}

impl DepartmentRepositoryMicroOrm {
    pub fn new(connection_string: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            connection_string: connection_string.into(),
            dialect,
        }
    }

    async fn connect(&self) -> Result<StoreConnection, AppError> {
        StoreConnection::open(self.dialect, &self.connection_string).await
    }
}

#[async_trait]
impl DepartmentRepository for DepartmentRepositoryMicroOrm {
    async fn add(&self, department: Department) -> Result<Department, AppError> {
        let mut conn = self.connect().await?;
        let active = department.active.unwrap_or(true);

        let inserted: Option<Department> = on_connection!(conn, |c, Db| {
            let mut query_builder: QueryBuilder<'_, Db> =
                QueryBuilder::new("INSERT INTO departments (active, created_at, created_by, name) ");
            query_builder.push_values(std::iter::once(&department), |mut row, d| {
                row.push_bind(active)
                    .push_bind(Utc::now())
                    .push_bind(d.created_by.clone())
                    .push_bind(d.name.clone());
            });
            query_builder.push(RETURNING_COLUMNS);
            query_builder
                .build_query_as::<Department>()
                .fetch_optional(&mut *c)
                .await?
        });

        let inserted = inserted.ok_or_else(|| AppError::InvalidOperation(INSERT_FAILED.to_string()))?;
        debug!("Department {} added (micro orm)", inserted.id);
        Ok(inserted)
    }

    async fn get_all(&self) -> Result<Vec<Department>, AppError> {
        let mut conn = self.connect().await?;

        let departments = on_connection!(conn, |c, Db| {
            let mut query_builder: QueryBuilder<'_, Db> = QueryBuilder::new(SELECT_COLUMNS);
            query_builder.push(" ORDER BY id DESC");
            query_builder
                .build_query_as::<Department>()
                .fetch_all(&mut *c)
                .await?
        });
        Ok(departments)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Department>, AppError> {
        let mut conn = self.connect().await?;

        let department = on_connection!(conn, |c, Db| {
            let mut query_builder: QueryBuilder<'_, Db> = QueryBuilder::new(SELECT_COLUMNS);
            query_builder.push(" WHERE id = ").push_bind(id);
            query_builder
                .build_query_as::<Department>()
                .fetch_optional(&mut *c)
                .await?
        });
        Ok(department)
    }

    async fn update(&self, department: &Department) -> Result<bool, AppError> {
        let mut conn = self.connect().await?;

        let affected = on_connection!(conn, |c, Db| {
            let mut query_builder: QueryBuilder<'_, Db> = QueryBuilder::new("UPDATE departments SET active = ");
            query_builder
                .push_bind(department.active.unwrap_or(true))
                .push(", name = ")
                .push_bind(department.name.clone())
                .push(" WHERE id = ")
                .push_bind(department.id);
            query_builder.build().execute(&mut *c).await?.rows_affected()
        });
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut conn = self.connect().await?;

        let affected = on_connection!(conn, |c, Db| {
            let mut query_builder: QueryBuilder<'_, Db> = QueryBuilder::new("DELETE FROM departments WHERE id = ");
            query_builder.push_bind(id);
            query_builder.build().execute(&mut *c).await?.rows_affected()
        });
        Ok(affected > 0)
    }

    async fn search(
        &self,
        page_index: u32,
        page_size: u32,
        search_query: &str,
        sort_order: SortOrder,
    ) -> Result<PagedResult<Department>, AppError> {
        let mut conn = self.connect().await?;
        let (offset, limit) = page_bounds(page_index, page_size);
        let pattern = search_term(search_query).map(like_pattern);

        let (items, total_count) = on_connection!(conn, |c, Db| {
            let mut count_builder: QueryBuilder<'_, Db> = QueryBuilder::new("SELECT COUNT(*) FROM departments");
            if let Some(pattern) = &pattern {
                count_builder
                    .push(" WHERE name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            let total_count: i64 = count_builder
                .build_query_scalar()
                .fetch_one(&mut *c)
                .await?;

            let mut page_builder: QueryBuilder<'_, Db> = QueryBuilder::new(SELECT_COLUMNS);
            if let Some(pattern) = &pattern {
                page_builder
                    .push(" WHERE name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            page_builder
                .push(" ORDER BY ")
                .push(sort_order.order_by())
                .push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(offset);
            let items = page_builder
                .build_query_as::<Department>()
                .fetch_all(&mut *c)
                .await?;

            (items, total_count)
        });

        Ok(PagedResult::new(items, total_count))
    }

    fn for_tenant(&self, connection_string: &str) -> Result<Arc<dyn DepartmentRepository>, AppError> {
        check_tenant_connection_string(connection_string, self.dialect)?;
        Ok(Arc::new(DepartmentRepositoryMicroOrm::new(connection_string, self.dialect)))
    }
}
