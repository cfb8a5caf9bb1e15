//! SeaORM implementation of PlateRegistry

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::domain::{DomainError, DomainResult, Plate, PlateRegistry};
use crate::infrastructure::database::entities::vehicle;

use super::db_err;

pub struct SeaOrmPlateRegistry {
    db: DatabaseConnection,
}

impl SeaOrmPlateRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(v: vehicle::Model) -> Plate {
    let plate = Plate::new(v.id, v.license_plate, v.user_id);
    match v.name {
        Some(name) => plate.with_name(name),
        None => plate,
    }
}

fn not_found(id: i32) -> DomainError {
    DomainError::NotFound {
        entity: "Vehicle",
        field: "id",
        value: id.to_string(),
    }
}

#[async_trait]
impl PlateRegistry for SeaOrmPlateRegistry {
    async fn list_plates(&self) -> DomainResult<Vec<Plate>> {
        let models = vehicle::Entity::find()
            .order_by_asc(vehicle::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_exact(&self, normalized_plate: &str) -> DomainResult<Option<Plate>> {
        let model = vehicle::Entity::find()
            .filter(vehicle::Column::NormalizedPlate.eq(normalized_plate))
            .order_by_asc(vehicle::Column::Id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn list_by_first_char(&self, first: char) -> DomainResult<Vec<Plate>> {
        // Normalized plates are plain alphanumerics, so no LIKE escaping is needed.
        let models = vehicle::Entity::find()
            .filter(vehicle::Column::NormalizedPlate.starts_with(first.to_string()))
            .order_by_asc(vehicle::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Plate>> {
        let model = vehicle::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn save(&self, plate: Plate) -> DomainResult<Plate> {
        debug!("Registering vehicle plate: {}", plate.raw_plate());
        let now = Utc::now();
        let model = vehicle::ActiveModel {
            id: NotSet,
            name: Set(plate.name.clone()),
            license_plate: Set(plate.raw_plate().to_string()),
            normalized_plate: Set(plate.normalized_plate().to_string()),
            user_id: Set(plate.owner_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(saved))
    }

    async fn update(&self, plate: Plate) -> DomainResult<()> {
        debug!("Updating vehicle: {}", plate.id);

        let existing = vehicle::Entity::find_by_id(plate.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(existing) = existing else {
            return Err(not_found(plate.id));
        };

        let mut active: vehicle::ActiveModel = existing.into();
        active.name = Set(plate.name.clone());
        active.license_plate = Set(plate.raw_plate().to_string());
        active.normalized_plate = Set(plate.normalized_plate().to_string());
        active.user_id = Set(plate.owner_id);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
