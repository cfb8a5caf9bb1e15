//! SeaORM session store and plate registry against a real SQLite file.

use chrono::{Duration, Utc};
use tempfile::TempDir;

use parking_lpr::domain::{
    CheckOut, DomainError, NewParkingSession, ParkingStatus, Plate, RepositoryProvider,
};
use parking_lpr::infrastructure::{
    init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider,
};

async fn setup() -> (TempDir, SeaOrmRepositoryProvider) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parking.db");
    let config = DatabaseConfig::sqlite(path.to_str().unwrap());
    let db = init_database(&config).await.unwrap();
    run_migrations(&db).await.unwrap();
    (dir, SeaOrmRepositoryProvider::new(db))
}

fn new_session(vehicle_id: i32, user_id: i32) -> NewParkingSession {
    NewParkingSession {
        vehicle_id,
        user_id,
        check_in_time: Utc::now(),
        check_in_image: Some("in.jpg".to_string()),
    }
}

fn checkout() -> CheckOut {
    CheckOut {
        check_out_time: Utc::now(),
        check_out_image: Some("out.jpg".to_string()),
    }
}

#[tokio::test]
async fn registry_stores_normalized_plates() {
    let (_dir, repos) = setup().await;
    let saved = repos
        .plates()
        .save(Plate::new(0, "b 1234-xyz", 7).with_name("Blue Avanza"))
        .await
        .unwrap();
    assert!(saved.id > 0);
    assert_eq!(saved.normalized_plate(), "B1234XYZ");

    let found = repos.plates().find_exact("B1234XYZ").await.unwrap().unwrap();
    assert_eq!(found.id, saved.id);
    assert_eq!(found.owner_id, 7);
    assert_eq!(found.name.as_deref(), Some("Blue Avanza"));

    assert!(repos.plates().find_exact("B1234XY").await.unwrap().is_none());
}

#[tokio::test]
async fn registry_update_replaces_plate() {
    let (_dir, repos) = setup().await;
    let mut plate = repos.plates().save(Plate::new(0, "D 1 AB", 1)).await.unwrap();

    plate.set_raw_plate("D 2 AB");
    repos.plates().update(plate.clone()).await.unwrap();
    let reloaded = repos.plates().find_by_id(plate.id).await.unwrap().unwrap();
    assert_eq!(reloaded.normalized_plate(), "D2AB");
    assert!(repos.plates().find_exact("D1AB").await.unwrap().is_none());

    assert!(repos.plates().update(Plate::new(999, "X1", 1)).await.is_err());
}

#[tokio::test]
async fn registry_lists_by_first_character() {
    let (_dir, repos) = setup().await;
    for raw in ["B1111AA", "B2222BB", "D3333CC"] {
        repos.plates().save(Plate::new(0, raw, 1)).await.unwrap();
    }

    let b_plates = repos.plates().list_by_first_char('B').await.unwrap();
    assert_eq!(b_plates.len(), 2);
    assert!(b_plates.iter().all(|p| p.normalized_plate().starts_with('B')));

    assert_eq!(repos.plates().list_plates().await.unwrap().len(), 3);
    assert!(repos.plates().list_by_first_char('Z').await.unwrap().is_empty());
}

#[tokio::test]
async fn second_open_session_is_a_conflict() {
    let (_dir, repos) = setup().await;
    let plate = repos.plates().save(Plate::new(0, "B1234XYZ", 3)).await.unwrap();

    let first = repos.sessions().create_open(new_session(plate.id, 3)).await.unwrap();
    assert_eq!(first.status, ParkingStatus::Parked);

    let err = repos
        .sessions()
        .create_open(new_session(plate.id, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn close_is_conditional_on_confirmation_and_open_state() {
    let (_dir, repos) = setup().await;
    let plate = repos.plates().save(Plate::new(0, "B1234XYZ", 3)).await.unwrap();
    let session = repos.sessions().create_open(new_session(plate.id, 3)).await.unwrap();

    // Not confirmed yet
    assert!(repos.sessions().close_open(session.id, checkout()).await.unwrap().is_none());

    // Wrong owner cannot confirm
    assert!(repos.sessions().confirm_checkout(plate.id, 99).await.unwrap().is_none());

    let confirmed = repos.sessions().confirm_checkout(plate.id, 3).await.unwrap().unwrap();
    assert!(confirmed.is_check_out_confirmed);
    assert_eq!(confirmed.status, ParkingStatus::PendingCheckout);

    let closed = repos.sessions().close_open(session.id, checkout()).await.unwrap().unwrap();
    assert_eq!(closed.status, ParkingStatus::CheckedOut);
    assert!(closed.check_out_time.is_some());
    assert_eq!(closed.check_out_image.as_deref(), Some("out.jpg"));

    // Second close finds nothing to close
    assert!(repos.sessions().close_open(session.id, checkout()).await.unwrap().is_none());
    assert!(repos.sessions().find_open(plate.id).await.unwrap().is_none());

    // Closed session frees the vehicle for a new cycle
    let next = repos.sessions().create_open(new_session(plate.id, 3)).await.unwrap();
    assert_ne!(next.id, session.id);
}

#[tokio::test]
async fn user_history_is_newest_first() {
    let (_dir, repos) = setup().await;
    let a = repos.plates().save(Plate::new(0, "A1", 5)).await.unwrap();
    let b = repos.plates().save(Plate::new(0, "B1", 5)).await.unwrap();
    let c = repos.plates().save(Plate::new(0, "C1", 6)).await.unwrap();

    let mut older = new_session(a.id, 5);
    older.check_in_time = Utc::now() - Duration::hours(3);
    repos.sessions().create_open(older).await.unwrap();
    repos.sessions().create_open(new_session(b.id, 5)).await.unwrap();
    repos.sessions().create_open(new_session(c.id, 6)).await.unwrap();

    let history = repos.sessions().find_by_user(5).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].vehicle_id, b.id);
    assert_eq!(history[1].vehicle_id, a.id);

    assert_eq!(repos.sessions().find_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn confirmation_returns_the_row_it_wrote() {
    let (_dir, repos) = setup().await;
    let plate = repos.plates().save(Plate::new(0, "B1234XYZ", 3)).await.unwrap();
    let first = repos.sessions().create_open(new_session(plate.id, 3)).await.unwrap();

    let confirmed = repos.sessions().confirm_checkout(plate.id, 3).await.unwrap().unwrap();
    assert_eq!(confirmed.id, first.id);
    repos.sessions().close_open(first.id, checkout()).await.unwrap().unwrap();

    // A later cycle is confirmed on its own row, the closed one is untouched
    let second = repos.sessions().create_open(new_session(plate.id, 3)).await.unwrap();
    let confirmed = repos.sessions().confirm_checkout(plate.id, 3).await.unwrap().unwrap();
    assert_eq!(confirmed.id, second.id);
    assert_eq!(confirmed.status, ParkingStatus::PendingCheckout);

    let closed = repos.sessions().find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(closed.status, ParkingStatus::CheckedOut);

    // Confirming twice is harmless and still reports the open row
    let again = repos.sessions().confirm_checkout(plate.id, 3).await.unwrap().unwrap();
    assert_eq!(again.id, second.id);
}
