//! Vehicle entity (the plate registry)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Plate as registered
    pub license_plate: String,

    /// Comparison form of `license_plate`, indexed for exact and prefix lookups
    pub normalized_plate: String,

    /// Owner
    pub user_id: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parking::Entity")]
    Parkings,
}

impl Related<super::parking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parkings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
