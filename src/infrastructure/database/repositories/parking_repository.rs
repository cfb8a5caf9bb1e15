//! SeaORM implementation of SessionStore

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, UpdateResult,
};
use tracing::debug;

use crate::domain::{
    CheckOut, DomainError, DomainResult, NewParkingSession, ParkingSession, ParkingStatus,
    SessionStore,
};
use crate::infrastructure::database::entities::parking;

use super::db_err;

pub struct SeaOrmSessionStore {
    db: DatabaseConnection,
}

impl SeaOrmSessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(p: parking::Model) -> ParkingSession {
    ParkingSession {
        id: p.id,
        vehicle_id: p.vehicle_id,
        user_id: p.user_id,
        check_in_time: p.check_in_time,
        check_out_time: p.check_out_time,
        check_in_image: p.check_in_image,
        check_out_image: p.check_out_image,
        is_check_out_confirmed: p.is_check_out_confirmed,
        // Unknown labels fall back to the flags.
        status: ParkingStatus::from_str(&p.status).unwrap_or_else(|| {
            ParkingSession::status_for(p.check_out_time.is_none(), p.is_check_out_confirmed)
        }),
    }
}

/// The partial unique index on open sessions turns a lost check-in race
/// into a constraint violation.
fn insert_err(vehicle_id: i32, e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::Conflict(format!(
            "vehicle {} already has an open session",
            vehicle_id
        )),
        _ => db_err(e),
    }
}

#[async_trait]
impl SessionStore for SeaOrmSessionStore {
    async fn find_open(&self, vehicle_id: i32) -> DomainResult<Option<ParkingSession>> {
        let model = parking::Entity::find()
            .filter(parking::Column::VehicleId.eq(vehicle_id))
            .filter(parking::Column::CheckOutTime.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSession>> {
        let model = parking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn create_open(&self, new: NewParkingSession) -> DomainResult<ParkingSession> {
        debug!("Opening parking session for vehicle {}", new.vehicle_id);
        let now = Utc::now();
        let vehicle_id = new.vehicle_id;
        let model = parking::ActiveModel {
            id: NotSet,
            vehicle_id: Set(new.vehicle_id),
            user_id: Set(new.user_id),
            check_in_time: Set(new.check_in_time),
            check_out_time: Set(None),
            check_in_image: Set(new.check_in_image),
            check_out_image: Set(None),
            status: Set(ParkingStatus::Parked.as_str().to_string()),
            is_check_out_confirmed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model
            .insert(&self.db)
            .await
            .map_err(|e| insert_err(vehicle_id, e))?;
        Ok(model_to_domain(saved))
    }

    async fn close_open(&self, id: i32, checkout: CheckOut) -> DomainResult<Option<ParkingSession>> {
        debug!("Closing parking session {}", id);

        let result: UpdateResult = parking::Entity::update_many()
            .col_expr(
                parking::Column::CheckOutTime,
                Expr::value(Some(checkout.check_out_time)),
            )
            .col_expr(
                parking::Column::CheckOutImage,
                Expr::value(checkout.check_out_image),
            )
            .col_expr(
                parking::Column::Status,
                Expr::value(ParkingStatus::CheckedOut.as_str()),
            )
            .col_expr(parking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(parking::Column::Id.eq(id))
            .filter(parking::Column::CheckOutTime.is_null())
            .filter(parking::Column::IsCheckOutConfirmed.eq(true))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn confirm_checkout(
        &self,
        vehicle_id: i32,
        user_id: i32,
    ) -> DomainResult<Option<ParkingSession>> {
        debug!(
            "Confirming check-out: vehicle={}, user={}",
            vehicle_id, user_id
        );

        let open = parking::Entity::find()
            .filter(parking::Column::VehicleId.eq(vehicle_id))
            .filter(parking::Column::UserId.eq(user_id))
            .filter(parking::Column::CheckOutTime.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        let Some(open) = open else {
            return Ok(None);
        };

        let result: UpdateResult = parking::Entity::update_many()
            .col_expr(parking::Column::IsCheckOutConfirmed, Expr::value(true))
            .col_expr(
                parking::Column::Status,
                Expr::value(ParkingStatus::PendingCheckout.as_str()),
            )
            .col_expr(parking::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(parking::Column::Id.eq(open.id))
            .filter(parking::Column::CheckOutTime.is_null())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        // Re-read by ID: a close racing in after the update still returns
        // the row this confirmation wrote.
        self.find_by_id(open.id).await
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<ParkingSession>> {
        let models = parking::Entity::find()
            .filter(parking::Column::UserId.eq(user_id))
            .order_by_desc(parking::Column::CheckInTime)
            .order_by_desc(parking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingSession>> {
        let models = parking::Entity::find()
            .order_by_desc(parking::Column::CheckInTime)
            .order_by_desc(parking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
