//! Parking session entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parkings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub vehicle_id: i32,
    pub user_id: i32,

    pub check_in_time: DateTimeUtc,

    /// NULL while the session is open
    #[sea_orm(nullable)]
    pub check_out_time: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub check_in_image: Option<String>,

    #[sea_orm(nullable)]
    pub check_out_image: Option<String>,

    /// parked, pending_checkout, checked_out
    pub status: String,

    pub is_check_out_confirmed: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id",
        on_delete = "Cascade"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
