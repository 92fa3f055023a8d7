#![allow(dead_code)]

use std::sync::Arc;

use department_management::db::Dialect;
use department_management::{
    add_department_services, ContextLifetime, DepartmentRepository, DepartmentsTableBuilder,
    RepositoryMode,
};
use sqlx::{Connection, SqliteConnection};
use tempfile::TempDir;

pub const ALL_MODES: [RepositoryMode; 3] = [
    RepositoryMode::RawSql,
    RepositoryMode::MicroOrm,
    RepositoryMode::Orm,
];

/// A SQLite database file living in its own temporary directory.
pub struct TestDb {
    pub dir: TempDir,
    pub url: String,
}

impl TestDb {
    pub fn new() -> Self {
        Self::named("departments.db")
    }

    pub fn named(file_name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let url = sqlite_url(&dir, file_name);
        Self { dir, url }
    }

    pub fn sibling(&self, file_name: &str) -> String {
        sqlite_url(&self.dir, file_name)
    }

    pub fn table_builder(&self) -> DepartmentsTableBuilder {
        DepartmentsTableBuilder::new(self.url.clone(), Dialect::Sqlite).expect("table builder")
    }

    pub async fn connect(&self) -> SqliteConnection {
        SqliteConnection::connect(&self.url).await.expect("connect to test db")
    }

    pub async fn execute(&self, sql: &str) {
        let mut conn = self.connect().await;
        sqlx::raw_sql(sql).execute(&mut conn).await.expect("execute test sql");
    }

    pub async fn scalar(&self, sql: &str) -> i64 {
        let mut conn = self.connect().await;
        sqlx::query_scalar(sql).fetch_one(&mut conn).await.expect("scalar query")
    }

    pub async fn column_names(&self) -> Vec<String> {
        let mut conn = self.connect().await;
        sqlx::query_scalar("SELECT name FROM pragma_table_info('departments') ORDER BY cid")
            .fetch_all(&mut conn)
            .await
            .expect("table info")
    }
}

pub fn sqlite_url(dir: &TempDir, file_name: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join(file_name).display())
}

/// Database with the departments table in place but no rows.
pub async fn empty_store() -> TestDb {
    let db = TestDb::new();
    db.table_builder()
        .build_master_database()
        .await
        .expect("build master database");
    db.execute("DELETE FROM departments").await;
    db
}

pub fn repository(db: &TestDb, mode: RepositoryMode) -> Arc<dyn DepartmentRepository> {
    add_department_services(&db.url, mode, Dialect::Sqlite, ContextLifetime::Transient)
        .expect("register department services")
        .repository()
}
