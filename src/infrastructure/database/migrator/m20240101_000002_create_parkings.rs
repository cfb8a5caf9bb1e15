//! Create parkings table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_vehicles::Vehicles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Parkings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Parkings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Parkings::VehicleId).integer().not_null())
                    .col(ColumnDef::new(Parkings::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Parkings::CheckInTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Parkings::CheckOutTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Parkings::CheckInImage).string())
                    .col(ColumnDef::new(Parkings::CheckOutImage).string())
                    .col(
                        ColumnDef::new(Parkings::Status)
                            .string()
                            .not_null()
                            .default("parked"),
                    )
                    .col(
                        ColumnDef::new(Parkings::IsCheckOutConfirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Parkings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Parkings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parkings_vehicle")
                            .from(Parkings::Table, Parkings::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parkings_user")
                    .table(Parkings::Table)
                    .col(Parkings::UserId)
                    .to_owned(),
            )
            .await?;

        // At most one open session per vehicle. sea-query has no partial
        // index builder, so this one is raw SQL.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_parkings_open_vehicle \
                 ON parkings (vehicle_id) WHERE check_out_time IS NULL",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Parkings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Parkings {
    Table,
    Id,
    VehicleId,
    UserId,
    CheckInTime,
    CheckOutTime,
    CheckInImage,
    CheckOutImage,
    Status,
    IsCheckOutConfirmed,
    CreatedAt,
    UpdatedAt,
}
