//! Parking state resolution
//!
//! Turns a matched plate into a check-in, a gated check-out, or an alert to
//! the owner, and exposes the owner-side confirmation step.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use super::outcome::{DateRange, EventOutcome, ParkingEvent, ParkingStatistics, SessionDetails};
use crate::domain::{
    AlertType, CheckOut, DomainError, DomainResult, NewParkingSession, Notification, Notifier,
    ParkingSession, Plate, RepositoryProvider,
};
use crate::matching::{normalize, MatchCandidate, MatchEngine, MatchResult, MatchStrategy, ScanScope};
use crate::shared::{PaginatedResult, PaginationParams};

/// Sessions open longer than this count as expired.
pub const DEFAULT_EXPIRY_HOURS: i64 = 24;

pub struct ParkingService {
    repos: Arc<dyn RepositoryProvider>,
    engine: MatchEngine,
    notifier: Arc<dyn Notifier>,
    expiry: Duration,
}

impl ParkingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            engine: MatchEngine::new(repos.clone(), ScanScope::default()),
            repos,
            notifier,
            expiry: Duration::hours(DEFAULT_EXPIRY_HOURS),
        }
    }

    pub fn with_scan_scope(mut self, scope: ScanScope) -> Self {
        self.engine = MatchEngine::new(self.repos.clone(), scope);
        self
    }

    pub fn with_expiry_hours(mut self, hours: i64) -> Self {
        self.expiry = Duration::hours(hours);
        self
    }

    /// Record one camera event.
    ///
    /// A vehicle without an open session is checked in. A vehicle with an
    /// open session is checked out if the owner confirmed, otherwise the
    /// owner is alerted and the session stays open.
    pub async fn record_event(&self, event: ParkingEvent) -> DomainResult<EventOutcome> {
        let result = self.resolve(event).await;
        let label = match &result {
            Ok(outcome) => outcome.as_str(),
            Err(e) => e.kind(),
        };
        metrics::counter!("parking_events_total", "outcome" => label).increment(1);
        result
    }

    async fn resolve(&self, event: ParkingEvent) -> DomainResult<EventOutcome> {
        info!(
            ocr = event.ocr_text.as_str(),
            confidence = ?event.confidence,
            strategy = event.strategy.name(),
            "Parking event received"
        );

        let matched = self
            .engine
            .find(&event.ocr_text, event.strategy)
            .await?
            .into_unique()?;
        let vehicle_id = matched.plate.id;

        let Some(open) = self.repos.sessions().find_open(vehicle_id).await? else {
            return self.check_in(matched, event.image_ref).await;
        };

        if !open.is_check_out_confirmed {
            self.alert(Notification::to_user(
                open.user_id,
                AlertType::CheckOutConfirmationRequired,
                "Check-out confirmation required",
                format!(
                    "Vehicle {} is at the exit. Confirm the check-out to leave.",
                    matched.plate.raw_plate()
                ),
                json!({
                    "vehicle_id": vehicle_id,
                    "parking_id": open.id,
                    "license_plate": matched.plate.raw_plate(),
                    "distance": matched.distance,
                }),
            ))
            .await;

            info!(
                vehicle_id,
                parking_id = open.id,
                "Check-out pending owner confirmation"
            );
            return Ok(EventOutcome::PendingConfirmation {
                session: open,
                matched,
            });
        }

        let checkout = CheckOut {
            check_out_time: Utc::now(),
            check_out_image: event.image_ref,
        };
        let Some(closed) = self.repos.sessions().close_open(open.id, checkout).await? else {
            // Another event closed it between the lookup and the update.
            warn!(vehicle_id, parking_id = open.id, "Check-out lost to a concurrent event");
            return Err(DomainError::NoActiveSession { vehicle_id });
        };

        info!(vehicle_id, parking_id = closed.id, "Vehicle checked out");
        self.alert(Notification::to_user(
            closed.user_id,
            AlertType::VehicleCheckedOut,
            "Vehicle checked out",
            format!("Vehicle {} has left the parking.", matched.plate.raw_plate()),
            json!({ "vehicle_id": vehicle_id, "parking_id": closed.id }),
        ))
        .await;

        Ok(EventOutcome::CheckedOut {
            session: closed,
            matched,
        })
    }

    async fn check_in(
        &self,
        matched: MatchCandidate,
        image_ref: Option<String>,
    ) -> DomainResult<EventOutcome> {
        let session = self
            .repos
            .sessions()
            .create_open(NewParkingSession {
                vehicle_id: matched.plate.id,
                user_id: matched.plate.owner_id,
                check_in_time: Utc::now(),
                check_in_image: image_ref,
            })
            .await?;

        info!(
            vehicle_id = session.vehicle_id,
            parking_id = session.id,
            "Vehicle checked in"
        );
        self.alert(Notification::to_user(
            session.user_id,
            AlertType::VehicleCheckedIn,
            "Vehicle checked in",
            format!("Vehicle {} has entered the parking.", matched.plate.raw_plate()),
            json!({ "vehicle_id": session.vehicle_id, "parking_id": session.id }),
        ))
        .await;

        Ok(EventOutcome::CheckedIn { session, matched })
    }

    /// Notification failures never change the outcome of an event.
    async fn alert(&self, notification: Notification) {
        let alert = notification.alert.as_str();
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(alert, error = %e, "Failed to deliver notification");
        }
    }

    /// Owner confirms the vehicle may leave.
    pub async fn confirm_pending_checkout(
        &self,
        vehicle_id: i32,
        user_id: i32,
    ) -> DomainResult<ParkingSession> {
        let session = self
            .repos
            .sessions()
            .confirm_checkout(vehicle_id, user_id)
            .await?
            .ok_or(DomainError::NoActiveSession { vehicle_id })?;
        info!(vehicle_id, user_id, parking_id = session.id, "Check-out confirmed");
        Ok(session)
    }

    /// Confirmation addressed by plate text instead of vehicle ID.
    pub async fn confirm_checkout_for_plate(
        &self,
        plate_text: &str,
        user_id: i32,
    ) -> DomainResult<ParkingSession> {
        let vehicle_id = self.exact_vehicle_id(plate_text).await?;
        self.confirm_pending_checkout(vehicle_id, user_id).await
    }

    /// Whether the vehicle with this plate has an open session.
    pub async fn is_checked_in(&self, plate_text: &str) -> DomainResult<bool> {
        let vehicle_id = self.exact_vehicle_id(plate_text).await?;
        Ok(self.repos.sessions().find_open(vehicle_id).await?.is_some())
    }

    /// Run a strategy against the registry without touching sessions.
    pub async fn verify_plate(
        &self,
        plate_text: &str,
        strategy: MatchStrategy,
    ) -> DomainResult<MatchResult> {
        self.engine.find(plate_text, strategy).await
    }

    pub async fn session_details(&self, id: i32) -> DomainResult<SessionDetails> {
        let session = self
            .repos
            .sessions()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "ParkingSession",
                field: "id",
                value: id.to_string(),
            })?;
        let plate = self.repos.plates().find_by_id(session.vehicle_id).await?;
        Ok(SessionDetails::new(session, plate, Utc::now(), self.expiry))
    }

    /// A user's sessions, newest check-in first.
    pub async fn list_user_sessions(
        &self,
        user_id: i32,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<ParkingSession>> {
        let sessions = self.repos.sessions().find_by_user(user_id).await?;
        Ok(PaginatedResult::from_all(sessions, params))
    }

    /// Register a vehicle. An entry with the same normalized plate is
    /// updated to the given owner and name instead of duplicated.
    pub async fn register_plate(
        &self,
        raw_plate: &str,
        owner_id: i32,
        name: Option<String>,
    ) -> DomainResult<Plate> {
        let mut plate = Plate::new(0, raw_plate, owner_id);
        plate.name = name;
        if !plate.is_matchable() {
            return Err(DomainError::InvalidInput(format!(
                "plate text {:?} has no letters or digits",
                raw_plate
            )));
        }

        let registry = self.repos.plates();
        match registry.find_exact(plate.normalized_plate()).await? {
            None => {
                let saved = registry.save(plate).await?;
                info!(vehicle_id = saved.id, plate = saved.raw_plate(), owner_id, "Vehicle registered");
                Ok(saved)
            }
            Some(existing)
                if existing.owner_id == plate.owner_id
                    && existing.name == plate.name
                    && existing.raw_plate() == plate.raw_plate() =>
            {
                Ok(existing)
            }
            Some(existing) => {
                plate.id = existing.id;
                registry.update(plate.clone()).await?;
                info!(vehicle_id = plate.id, plate = plate.raw_plate(), owner_id, "Vehicle updated");
                Ok(plate)
            }
        }
    }

    /// Counts and distributions; `range` limits the summary counts.
    pub async fn statistics(&self, range: DateRange) -> DomainResult<ParkingStatistics> {
        let sessions = self.repos.sessions().find_all().await?;
        Ok(ParkingStatistics::compute(
            &sessions,
            Utc::now(),
            self.expiry,
            range,
        ))
    }

    async fn exact_vehicle_id(&self, plate_text: &str) -> DomainResult<i32> {
        let normalized = normalize(plate_text);
        if normalized.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "plate text {:?} has no letters or digits",
                plate_text
            )));
        }
        self.repos
            .plates()
            .find_exact(&normalized)
            .await?
            .map(|p| p.id)
            .ok_or(DomainError::VehicleNotFound {
                closest_distance: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{ParkingStatus, Plate, Recipient};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn alerts(&self, alert: AlertType) -> Vec<Notification> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.alert == alert)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) -> DomainResult<()> {
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _notification: Notification) -> DomainResult<()> {
            Err(DomainError::Persistence("push gateway down".into()))
        }
    }

    fn setup() -> (Arc<InMemoryRepositoryProvider>, Arc<RecordingNotifier>, ParkingService) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        repos.insert_plate(Plate::new(1, "B 1234 XYZ", 10));
        repos.insert_plate(Plate::new(2, "B1111AA", 20));
        repos.insert_plate(Plate::new(3, "B1111AB", 30));
        let notifier = Arc::new(RecordingNotifier::default());
        let service = ParkingService::new(repos.clone(), notifier.clone());
        (repos, notifier, service)
    }

    fn bounded(text: &str) -> ParkingEvent {
        ParkingEvent::new(text, MatchStrategy::BoundedDistance(2))
    }

    #[tokio::test]
    async fn first_sighting_checks_in() {
        let (repos, _, service) = setup();
        let outcome = service
            .record_event(bounded("B1234XY2").with_image("in.jpg"))
            .await
            .unwrap();

        let EventOutcome::CheckedIn { session, matched } = outcome else {
            panic!("expected check-in");
        };
        assert_eq!(matched.plate.id, 1);
        assert_eq!(matched.distance, 1);
        assert_eq!(session.user_id, 10);
        assert_eq!(session.check_in_image.as_deref(), Some("in.jpg"));
        assert_eq!(session.status, ParkingStatus::Parked);
        assert!(repos.sessions().find_open(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unconfirmed_exit_alerts_owner_and_keeps_session_open() {
        let (repos, notifier, service) = setup();
        service.record_event(bounded("B1234XYZ")).await.unwrap();

        let outcome = service.record_event(bounded("B1234XYZ")).await.unwrap();
        assert_eq!(outcome.as_str(), "pending_confirmation");
        assert!(outcome.session().is_open());

        let alerts = notifier.alerts(AlertType::CheckOutConfirmationRequired);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].recipient, Recipient::User(10));
        assert!(repos.sessions().find_open(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn confirmed_exit_closes_session() {
        let (repos, _, service) = setup();
        service.record_event(bounded("B1234XYZ")).await.unwrap();
        let confirmed = service.confirm_pending_checkout(1, 10).await.unwrap();
        assert_eq!(confirmed.status, ParkingStatus::PendingCheckout);

        let outcome = service
            .record_event(bounded("B1234XYZ").with_image("out.jpg"))
            .await
            .unwrap();
        let EventOutcome::CheckedOut { session, .. } = outcome else {
            panic!("expected check-out");
        };
        assert!(session.check_out_time.is_some());
        assert_eq!(session.check_out_image.as_deref(), Some("out.jpg"));
        assert_eq!(session.status, ParkingStatus::CheckedOut);
        assert!(repos.sessions().find_open(1).await.unwrap().is_none());

        // Next sighting starts a new cycle.
        let next = service.record_event(bounded("B1234XYZ")).await.unwrap();
        assert_eq!(next.as_str(), "check_in");
        assert_ne!(next.session().id, session.id);
    }

    #[tokio::test]
    async fn ambiguous_match_changes_nothing() {
        let (repos, notifier, service) = setup();
        let err = service
            .record_event(ParkingEvent::new("B1111AX", MatchStrategy::BoundedDistance(1)))
            .await
            .unwrap_err();

        let DomainError::AmbiguousMatch { candidates, distance } = err else {
            panic!("expected ambiguity");
        };
        assert_eq!(distance, 1);
        let ids: Vec<i32> = candidates.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(repos.sessions().find_all().await.unwrap().is_empty());
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_plate_reports_closest_distance() {
        let (repos, _, service) = setup();
        let err = service.record_event(bounded("B9999QQQ")).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::VehicleNotFound {
                closest_distance: Some(d)
            } if d > 2
        ));
        assert!(repos.sessions().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unusable_text_is_invalid_input() {
        let (_, _, service) = setup();
        let err = service.record_event(bounded(" -- ")).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn threshold_strategy_drives_check_in() {
        let (_, _, service) = setup();
        let outcome = service
            .record_event(ParkingEvent::new("B1234XYZ", MatchStrategy::Threshold(0.7)))
            .await
            .unwrap();
        assert_eq!(outcome.matched().plate.id, 1);
        assert_eq!(outcome.matched().distance, 0);
    }

    #[tokio::test]
    async fn confirm_without_open_session_fails() {
        let (_, _, service) = setup();
        let err = service.confirm_pending_checkout(1, 10).await.unwrap_err();
        assert!(matches!(err, DomainError::NoActiveSession { vehicle_id: 1 }));
    }

    #[tokio::test]
    async fn confirm_by_another_user_fails() {
        let (_, _, service) = setup();
        service.record_event(bounded("B1234XYZ")).await.unwrap();
        let err = service.confirm_pending_checkout(1, 99).await.unwrap_err();
        assert!(matches!(err, DomainError::NoActiveSession { .. }));
    }

    #[tokio::test]
    async fn confirm_by_plate_and_check_in_status() {
        let (_, _, service) = setup();
        assert!(!service.is_checked_in("b-1234-xyz").await.unwrap());

        service.record_event(bounded("B1234XYZ")).await.unwrap();
        assert!(service.is_checked_in("b-1234-xyz").await.unwrap());

        let session = service
            .confirm_checkout_for_plate("b 1234 xyz", 10)
            .await
            .unwrap();
        assert!(session.is_check_out_confirmed);

        let err = service.is_checked_in("Z0000").await.unwrap_err();
        assert!(matches!(err, DomainError::VehicleNotFound { .. }));
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_event() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        repos.insert_plate(Plate::new(1, "B1234XYZ", 10));
        let service = ParkingService::new(repos.clone(), Arc::new(FailingNotifier));

        service.record_event(bounded("B1234XYZ")).await.unwrap();
        let outcome = service.record_event(bounded("B1234XYZ")).await.unwrap();
        assert_eq!(outcome.as_str(), "pending_confirmation");
    }

    #[tokio::test]
    async fn concurrent_checkouts_close_once() {
        let (repos, _, service) = setup();
        let service = Arc::new(service);
        service.record_event(bounded("B1234XYZ")).await.unwrap();
        service.confirm_pending_checkout(1, 10).await.unwrap();

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.record_event(bounded("B1234XYZ")).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.record_event(bounded("B1234XYZ")).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        let checked_out = results
            .iter()
            .filter(|r| matches!(r, Ok(EventOutcome::CheckedOut { .. })))
            .count();
        assert_eq!(checked_out, 1);
        // The loser either lost the close race or saw the closed session
        // and started a new cycle.
        assert!(results.iter().all(|r| matches!(
            r,
            Ok(EventOutcome::CheckedOut { .. })
                | Ok(EventOutcome::CheckedIn { .. })
                | Err(DomainError::NoActiveSession { .. })
        )));

        let open = repos
            .sessions()
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_open())
            .count();
        assert!(open <= 1);
    }

    #[tokio::test]
    async fn concurrent_check_ins_open_one_session() {
        let (repos, _, service) = setup();
        let service = Arc::new(service);

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.record_event(bounded("B1234XYZ")).await })
            })
            .collect();
        for task in tasks {
            // Losers see a conflict or the winner's open session.
            let _ = task.await.unwrap();
        }

        let open = repos
            .sessions()
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_open())
            .count();
        assert_eq!(open, 1);
    }

    #[tokio::test]
    async fn details_history_and_statistics() {
        let (repos, _, service) = setup();
        let old = repos
            .sessions()
            .create_open(NewParkingSession {
                vehicle_id: 2,
                user_id: 20,
                check_in_time: Utc::now() - Duration::hours(30),
                check_in_image: None,
            })
            .await
            .unwrap();
        service.record_event(bounded("B1234XYZ")).await.unwrap();

        let details = service.session_details(old.id).await.unwrap();
        assert!(details.is_active);
        assert!(details.is_expired);
        assert_eq!(details.plate.map(|p| p.id), Some(2));

        let missing = service.session_details(999).await.unwrap_err();
        assert_eq!(missing.kind(), "not_found");

        let page = service
            .list_user_sessions(20, PaginationParams::new(1, 5))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, old.id);

        let stats = service.statistics(DateRange::default()).await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.active_records, 2);
        assert_eq!(stats.expired_records, 1);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.top_users.len(), 2);
        assert_eq!(stats.hourly_distribution.iter().sum::<u64>(), 1);

        // The 30 hour old check-in falls on an earlier day
        let today = DateRange::new(Some(Utc::now().date_naive()), None).unwrap();
        let stats = service.statistics(today).await.unwrap();
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.expired_records, 0);
    }

    #[tokio::test]
    async fn register_plate_adds_then_updates() {
        let (repos, _, service) = setup();

        let added = service
            .register_plate("d 77 qq", 40, Some("Van".to_string()))
            .await
            .unwrap();
        assert_eq!(added.normalized_plate(), "D77QQ");
        assert!(added.id > 3);

        // Same vehicle again: nothing new is stored
        let again = service
            .register_plate("d 77 qq", 40, Some("Van".to_string()))
            .await
            .unwrap();
        assert_eq!(again.id, added.id);
        assert_eq!(repos.plates().list_plates().await.unwrap().len(), 4);

        // Different spelling and owner of the same plate updates in place
        let moved = service.register_plate("D77-QQ", 41, None).await.unwrap();
        assert_eq!(moved.id, added.id);
        let stored = repos.plates().find_by_id(added.id).await.unwrap().unwrap();
        assert_eq!(stored.owner_id, 41);
        assert_eq!(stored.name, None);
        assert_eq!(repos.plates().list_plates().await.unwrap().len(), 4);

        let err = service.register_plate(" - ", 1, None).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        // A registered plate is matchable right away
        let outcome = service.record_event(bounded("D77QQ")).await.unwrap();
        assert_eq!(outcome.matched().plate.id, added.id);
    }
}
