use log::info;
use sqlx::PgConnection;

use super::{SchemaReport, SEED_CREATED_BY, SEED_NAMES};
use crate::errors::AppError;

const CREATE_TABLE: &str = r#"
    CREATE TABLE departments (
        id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
        active BOOLEAN NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NULL DEFAULT CURRENT_TIMESTAMP,
        created_by VARCHAR(255) NULL,
        name TEXT NULL
    )"#;

const EXPECTED_COLUMNS: [(&str, &str); 4] = [
    ("active", "BOOLEAN NULL DEFAULT TRUE"),
    ("created_at", "TIMESTAMPTZ NULL DEFAULT CURRENT_TIMESTAMP"),
    ("created_by", "VARCHAR(255) NULL"),
    ("name", "TEXT NULL"),
];

pub async fn ensure_departments_table(conn: &mut PgConnection) -> Result<SchemaReport, AppError> {
    let mut report = SchemaReport::default();

    let table_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_name = 'departments'",
    )
    .fetch_one(&mut *conn)
    .await?;

    if table_count == 0 {
        sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
        report.table_created = true;
        info!("Departments table created.");
    } else {
        for (column, definition) in EXPECTED_COLUMNS {
            let column_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = 'departments' AND column_name = $1",
            )
            .bind(column)
            .fetch_one(&mut *conn)
            .await?;

            if column_count == 0 {
                sqlx::query(&format!("ALTER TABLE departments ADD COLUMN {} {}", column, definition))
                    .execute(&mut *conn)
                    .await?;
                report.columns_added.push(column);
                info!("Column added: {} ({})", column, definition);
            }
        }
    }

    let row_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments")
        .fetch_one(&mut *conn)
        .await?;

    if row_count == 0 {
        report.seeded_rows = sqlx::query(
            "INSERT INTO departments (active, created_at, created_by, name) VALUES \
             (TRUE, CURRENT_TIMESTAMP, $1, $2), \
             (TRUE, CURRENT_TIMESTAMP, $1, $3)",
        )
        .bind(SEED_CREATED_BY)
        .bind(SEED_NAMES[0])
        .bind(SEED_NAMES[1])
        .execute(&mut *conn)
        .await?
        .rows_affected();
        info!("Seeded {} default departments.", report.seeded_rows);
    }

    Ok(report)
}
