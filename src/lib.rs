pub mod db;
pub mod config;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod registration;
pub mod repositories;
pub mod schema;

pub use errors::AppError;
pub use models::{Department, PagedResult, SortOrder};
pub use registration::{add_department_services, DepartmentServices};
pub use repositories::{ContextLifetime, DepartmentRepository, RepositoryMode};
pub use schema::DepartmentsTableBuilder;
