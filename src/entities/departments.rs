use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::Department;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub active: Option<bool>,
    pub created_at: Option<ChronoDateTimeUtc>,
    pub created_by: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Department {
    fn from(model: Model) -> Self {
        Department {
            id: model.id,
            active: model.active,
            created_at: model.created_at,
            created_by: model.created_by,
            name: model.name,
        }
    }
}
