use sqlx::{Connection, PgConnection, SqliteConnection};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Relational engines the department module knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Infers the dialect from the connection string scheme.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, AppError> {
        let scheme = connection_string
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();

        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(AppError::Configuration(format!(
                "Cannot infer database dialect from connection string scheme '{}'. Supported: postgres, sqlite.",
                scheme
            ))),
        }
    }
}

impl FromStr for Dialect {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(AppError::Configuration(format!(
                "Unsupported database dialect '{}'. Supported: postgres, sqlite.",
                other
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// A single, unpooled connection opened for one unit of work.
///
/// Dropping the value closes the underlying connection, so early returns
/// through `?` release it as well.
pub enum StoreConnection {
    Postgres(PgConnection),
    Sqlite(SqliteConnection),
}

impl StoreConnection {
    pub async fn open(dialect: Dialect, connection_string: &str) -> Result<Self, AppError> {
        let conn = match dialect {
            Dialect::Postgres => StoreConnection::Postgres(PgConnection::connect(connection_string).await?),
            Dialect::Sqlite => StoreConnection::Sqlite(SqliteConnection::connect(connection_string).await?),
        };
        Ok(conn)
    }

    pub async fn close(self) -> Result<(), AppError> {
        match self {
            StoreConnection::Postgres(conn) => conn.close().await?,
            StoreConnection::Sqlite(conn) => conn.close().await?,
        }
        Ok(())
    }
}

/// Runs `$body` against whichever driver connection `$conn` holds.
///
/// `$c` is bound to `&mut PgConnection` or `&mut SqliteConnection` and `$db`
/// names the matching `sqlx::Database`, so the same statement text compiles
/// once per driver. Both arms must evaluate to the same type.
macro_rules! on_connection {
    ($conn:expr, |$c:ident, $db:ident| $body:expr) => {
        match &mut $conn {
            $crate::db::StoreConnection::Postgres($c) => {
                #[allow(dead_code)]
                type $db = sqlx::Postgres;
                $body
            }
            $crate::db::StoreConnection::Sqlite($c) => {
                #[allow(dead_code)]
                type $db = sqlx::Sqlite;
                $body
            }
        }
    };
}

pub(crate) use on_connection;

/// Name of the database a connection string points at, safe to log.
pub fn database_label(connection_string: &str) -> String {
    let without_query = connection_string
        .split_once('?')
        .map_or(connection_string, |(head, _)| head);
    let without_scheme = without_query
        .split_once("://")
        .or_else(|| without_query.split_once(':'))
        .map_or(without_query, |(_, rest)| rest);

    without_scheme
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("<unknown>")
        .to_string()
}
