use log::info;
use sqlx::{Row, SqliteConnection};

use super::{SchemaReport, SEED_CREATED_BY, SEED_NAMES};
use crate::errors::AppError;

const CREATE_TABLE: &str = r#"
    CREATE TABLE departments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        active INTEGER DEFAULT 1,
        created_at TEXT DEFAULT (datetime('now')),
        created_by TEXT,
        name TEXT
    )"#;

// SQLite refuses non-constant defaults in ADD COLUMN, so a created_at added
// after the fact carries no default.
const EXPECTED_COLUMNS: [(&str, &str); 4] = [
    ("active", "INTEGER DEFAULT 1"),
    ("created_at", "TEXT"),
    ("created_by", "TEXT"),
    ("name", "TEXT"),
];

pub async fn ensure_departments_table(conn: &mut SqliteConnection) -> Result<SchemaReport, AppError> {
    let mut report = SchemaReport::default();

    let table_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'departments'",
    )
    .fetch_one(&mut *conn)
    .await?;

    if table_count == 0 {
        sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
        report.table_created = true;
        info!("Departments table created.");
    } else {
        let existing: Vec<String> = sqlx::query("PRAGMA table_info(departments)")
            .fetch_all(&mut *conn)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<_, _>>()?;

        for (column, definition) in EXPECTED_COLUMNS {
            if existing.iter().any(|name| name.eq_ignore_ascii_case(column)) {
                continue;
            }

            sqlx::query(&format!("ALTER TABLE departments ADD COLUMN {} {}", column, definition))
                .execute(&mut *conn)
                .await?;
            report.columns_added.push(column);
            info!("Column added: {} ({})", column, definition);
        }
    }

    let row_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments")
        .fetch_one(&mut *conn)
        .await?;

    if row_count == 0 {
        report.seeded_rows = sqlx::query(
            "INSERT INTO departments (active, created_at, created_by, name) VALUES \
             (1, datetime('now'), $1, $2), \
             (1, datetime('now'), $1, $3)",
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
