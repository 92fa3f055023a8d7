use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{ColumnIndex, Decode, Row, Type};
use std::sync::Arc;

use super::{check_tenant_connection_string, page_bounds, DepartmentRepository, INSERT_FAILED};
use crate::db::{on_connection, Dialect, StoreConnection};
use crate::errors::AppError;
use crate::models::department::{like_pattern, search_term};
use crate::models::{Department, PagedResult, SortOrder};

const SELECT_COLUMNS: &str = "SELECT id, active, created_at, created_by, name FROM departments";

/// Statements written out by hand, parameters bound one by one and rows
/// mapped column by column.
pub struct DepartmentRepositoryRawSql {
    connection_string: String,
    dialect: Dialect,
}

impl DepartmentRepositoryRawSql {
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

fn read_department<'r, R>(row: &'r R) -> Result<Department, sqlx::Error>
where
    R: Row,
    &'r str: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    bool: Decode<'r, R::Database> + Type<R::Database>,
    DateTime<Utc>: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
{
    Ok(Department {
        id: row.try_get("id")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        name: row.try_get("name")?,
    })
}

#[async_trait]
impl DepartmentRepository for DepartmentRepositoryRawSql {
    async fn add(&self, mut department: Department) -> Result<Department, AppError> {
        let mut conn = self.connect().await?;
        let active = department.active.unwrap_or(true);
        let created_at = Utc::now();

        let inserted: Option<(i64, Option<DateTime<Utc>>)> = on_connection!(conn, |c, Db| {
            match sqlx::query(
                "INSERT INTO departments (active, created_at, created_by, name) VALUES ($1, $2, $3, $4) \
                 RETURNING id, created_at",
            )
            .bind(active)
            .bind(created_at)
            .bind(department.created_by.as_deref())
            .bind(department.name.as_deref())
            .fetch_optional(&mut *c)
            .await?
            {
                Some(row) => Some((row.try_get("id")?, row.try_get("created_at")?)),
                None => None,
            }
        });

        let (id, created_at) =
            inserted.ok_or_else(|| AppError::InvalidOperation(INSERT_FAILED.to_string()))?;

        department.id = id;
        department.active = Some(active);
        department.created_at = created_at;
        debug!("Department {} added (raw sql)", id);
        Ok(department)
    }

    async fn get_all(&self) -> Result<Vec<Department>, AppError> {
        let mut conn = self.connect().await?;
        let sql = format!("{} ORDER BY id DESC", SELECT_COLUMNS);

        let departments = on_connection!(conn, |c, Db| {
            let rows = sqlx::query(&sql).fetch_all(&mut *c).await?;
            rows.iter()
                .map(|row| read_department(row))
                .collect::<Result<Vec<_>, sqlx::Error>>()?
        });
        Ok(departments)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Department>, AppError> {
        let mut conn = self.connect().await?;
        let sql = format!("{} WHERE id = $1", SELECT_COLUMNS);

        let department = on_connection!(conn, |c, Db| {
            match sqlx::query(&sql).bind(id).fetch_optional(&mut *c).await? {
                Some(row) => Some(read_department(&row)?),
                None => None,
            }
        });
        Ok(department)
    }

    async fn update(&self, department: &Department) -> Result<bool, AppError> {
        let mut conn = self.connect().await?;

        let affected = on_connection!(conn, |c, Db| {
            sqlx::query("UPDATE departments SET active = $1, name = $2 WHERE id = $3")
                .bind(department.active.unwrap_or(true))
                .bind(department.name.as_deref())
                .bind(department.id)
                .execute(&mut *c)
                .await?
                .rows_affected()
        });
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut conn = self.connect().await?;

        let affected = on_connection!(conn, |c, Db| {
            sqlx::query("DELETE FROM departments WHERE id = $1")
                .bind(id)
                .execute(&mut *c)
                .await?
                .rows_affected()
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

        let (count_sql, page_sql) = match pattern {
            Some(_) => (
                "SELECT COUNT(*) FROM departments WHERE name LIKE $1 ESCAPE '\\'".to_string(),
                format!(
                    "{} WHERE name LIKE $1 ESCAPE '\\' ORDER BY {} LIMIT $2 OFFSET $3",
                    SELECT_COLUMNS,
                    sort_order.order_by()
                ),
            ),
            None => (
                "SELECT COUNT(*) FROM departments".to_string(),
                format!(
                    "{} ORDER BY {} LIMIT $1 OFFSET $2",
                    SELECT_COLUMNS,
                    sort_order.order_by()
                ),
            ),
        };

        let (items, total_count) = on_connection!(conn, |c, Db| {
            let (total_count, rows) = match pattern.as_deref() {
                Some(pattern) => {
                    let total_count: i64 = sqlx::query_scalar(&count_sql)
                        .bind(pattern)
                        .fetch_one(&mut *c)
                        .await?;
                    let rows = sqlx::query(&page_sql)
                        .bind(pattern)
                        .bind(limit)
                        .bind(offset)
                        .fetch_all(&mut *c)
                        .await?;
                    (total_count, rows)
                }
                None => {
                    let total_count: i64 = sqlx::query_scalar(&count_sql).fetch_one(&mut *c).await?;
                    let rows = sqlx::query(&page_sql)
                        .bind(limit)
                        .bind(offset)
                        .fetch_all(&mut *c)
                        .await?;
                    (total_count, rows)
                }
            };
            let items = rows
                .iter()
                .map(|row| read_department(row))
                .collect::<Result<Vec<_>, sqlx::Error>>()?;
            (items, total_count)
        });

        Ok(PagedResult::new(items, total_count))
    }

    fn for_tenant(&self, connection_string: &str) -> Result<Arc<dyn DepartmentRepository>, AppError> {
        check_tenant_connection_string(connection_string, self.dialect)?;
        Ok(Arc::new(DepartmentRepositoryRawSql::new(connection_string, self.dialect)))
    }
}
