//! Results of parking operations

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};

use crate::domain::{DomainError, DomainResult, ParkingSession, Plate};
use crate::matching::{MatchCandidate, MatchStrategy};

/// One camera observation of a plate
#[derive(Debug, Clone)]
pub struct ParkingEvent {
    /// Plate text as read by OCR
    pub ocr_text: String,
    /// OCR confidence in `[0, 1]`; logged, not used for matching
    pub confidence: Option<f64>,
    pub strategy: MatchStrategy,
    /// Reference to the captured image
    pub image_ref: Option<String>,
}

impl ParkingEvent {
    pub fn new(ocr_text: impl Into<String>, strategy: MatchStrategy) -> Self {
        Self {
            ocr_text: ocr_text.into(),
            confidence: None,
            strategy,
            image_ref: None,
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// Successful result of recording an event.
///
/// Everything that is not one of these (no match, ambiguity, bad input,
/// storage failure) is returned as a `DomainError`.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    CheckedIn {
        session: ParkingSession,
        matched: MatchCandidate,
    },
    CheckedOut {
        session: ParkingSession,
        matched: MatchCandidate,
    },
    /// The vehicle is leaving but the owner has not confirmed; the session
    /// stays open and the owner was alerted.
    PendingConfirmation {
        session: ParkingSession,
        matched: MatchCandidate,
    },
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckedIn { .. } => "check_in",
            Self::CheckedOut { .. } => "checked_out",
            Self::PendingConfirmation { .. } => "pending_confirmation",
        }
    }

    pub fn session(&self) -> &ParkingSession {
        match self {
            Self::CheckedIn { session, .. }
            | Self::CheckedOut { session, .. }
            | Self::PendingConfirmation { session, .. } => session,
        }
    }

    pub fn matched(&self) -> &MatchCandidate {
        match self {
            Self::CheckedIn { matched, .. }
            | Self::CheckedOut { matched, .. }
            | Self::PendingConfirmation { matched, .. } => matched,
        }
    }
}

/// Length of a closed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDuration {
    pub total_minutes: i64,
    pub total_hours: i64,
    /// e.g. "0 days, 2 hours, 15 minutes"
    pub human_readable: String,
}

impl SessionDuration {
    pub fn from_duration(d: Duration) -> Self {
        let total_minutes = d.num_minutes();
        Self {
            total_minutes,
            total_hours: d.num_hours(),
            human_readable: format!(
                "{} days, {} hours, {} minutes",
                d.num_days(),
                d.num_hours() % 24,
                total_minutes % 60
            ),
        }
    }
}

/// A session with derived timing facts
#[derive(Debug, Clone)]
pub struct SessionDetails {
    pub session: ParkingSession,
    pub plate: Option<Plate>,
    /// Only set once the session is closed
    pub duration: Option<SessionDuration>,
    pub is_active: bool,
    pub is_expired: bool,
}

impl SessionDetails {
    pub fn new(
        session: ParkingSession,
        plate: Option<Plate>,
        now: DateTime<Utc>,
        expiry: Duration,
    ) -> Self {
        Self {
            duration: session.duration().map(SessionDuration::from_duration),
            is_active: session.is_open(),
            is_expired: session.is_expired(now, expiry),
            session,
            plate,
        }
    }
}

/// Inclusive check-in date window; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> DomainResult<Self> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(DomainError::Validation(format!(
                    "date_from {} is after date_to {}",
                    f, t
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from.map_or(true, |f| day >= f) && self.to.map_or(true, |t| day <= t)
    }
}

/// Check-ins on one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Sessions recorded for one vehicle owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCount {
    pub user_id: i32,
    pub parking_count: u64,
}

pub const DAILY_WINDOW_DAYS: i64 = 7;
pub const TOP_USERS: usize = 5;

/// Session counts and check-in distributions.
///
/// The summary counts honour the date range. The distributions always
/// look back from `now`: hourly over the last 24 hours, daily over the
/// last [`DAILY_WINDOW_DAYS`] days. `top_users` ranks all sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingStatistics {
    pub total_records: u64,
    pub active_records: u64,
    pub completed_records: u64,
    /// Open longer than the expiry window
    pub expired_records: u64,
    /// Completed share in percent, two decimals
    pub completion_rate: f64,
    /// Check-ins per hour of day (UTC), index 0 is midnight
    pub hourly_distribution: [u64; 24],
    /// Oldest day first, days without check-ins included
    pub daily_distribution: Vec<DailyCount>,
    /// Most sessions first, ties by lower user ID
    pub top_users: Vec<UserCount>,
}

impl ParkingStatistics {
    pub fn compute(
        sessions: &[ParkingSession],
        now: DateTime<Utc>,
        expiry: Duration,
        range: DateRange,
    ) -> Self {
        let in_range: Vec<&ParkingSession> = sessions
            .iter()
            .filter(|s| range.contains(s.check_in_time))
            .collect();

        let total_records = in_range.len() as u64;
        let active_records = in_range.iter().filter(|s| s.is_open()).count() as u64;
        let expired_records = in_range
            .iter()
            .filter(|s| s.is_expired(now, expiry))
            .count() as u64;
        let completed_records = total_records - active_records;
        let completion_rate = if total_records == 0 {
            0.0
        } else {
            (completed_records as f64 / total_records as f64 * 10_000.0).round() / 100.0
        };

        let mut hourly_distribution = [0u64; 24];
        let day_ago = now - Duration::hours(24);
        for s in sessions
            .iter()
            .filter(|s| s.check_in_time > day_ago && s.check_in_time <= now)
        {
            hourly_distribution[s.check_in_time.hour() as usize] += 1;
        }

        let today = now.date_naive();
        let mut daily_distribution: Vec<DailyCount> = (0..DAILY_WINDOW_DAYS)
            .rev()
            .map(|back| DailyCount {
                date: today - Duration::days(back),
                count: 0,
            })
            .collect();
        for s in sessions {
            let day = s.check_in_time.date_naive();
            if let Some(slot) = daily_distribution.iter_mut().find(|d| d.date == day) {
                slot.count += 1;
            }
        }

        let mut per_user: HashMap<i32, u64> = HashMap::new();
        for s in sessions {
            *per_user.entry(s.user_id).or_default() += 1;
        }
        let mut top_users: Vec<UserCount> = per_user
            .into_iter()
            .map(|(user_id, parking_count)| UserCount {
                user_id,
                parking_count,
            })
            .collect();
        top_users.sort_by(|a, b| {
            b.parking_count
                .cmp(&a.parking_count)
                .then(a.user_id.cmp(&b.user_id))
        });
        top_users.truncate(TOP_USERS);

        Self {
            total_records,
            active_records,
            completed_records,
            expired_records,
            completion_rate,
            hourly_distribution,
            daily_distribution,
            top_users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CheckOut, NewParkingSession};

    fn session(id: i32, hours_ago: i64, closed: bool) -> ParkingSession {
        let now = Utc::now();
        let mut s = ParkingSession::open(
            id,
            NewParkingSession {
                vehicle_id: id,
                user_id: 1,
                check_in_time: now - Duration::hours(hours_ago),
                check_in_image: None,
            },
        );
        if closed {
            s.confirm_checkout();
            s.close(CheckOut {
                check_out_time: now,
                check_out_image: None,
            });
        }
        s
    }

    #[test]
    fn duration_formatting() {
        let d = SessionDuration::from_duration(Duration::minutes(26 * 60 + 15));
        assert_eq!(d.total_minutes, 1575);
        assert_eq!(d.total_hours, 26);
        assert_eq!(d.human_readable, "1 days, 2 hours, 15 minutes");
    }

    #[test]
    fn details_for_open_and_closed_sessions() {
        let now = Utc::now();
        let open = SessionDetails::new(session(1, 30, false), None, now, Duration::hours(24));
        assert!(open.is_active);
        assert!(open.is_expired);
        assert!(open.duration.is_none());

        let closed = SessionDetails::new(session(2, 30, true), None, now, Duration::hours(24));
        assert!(!closed.is_active);
        assert!(!closed.is_expired);
        assert_eq!(closed.duration.map(|d| d.total_hours), Some(30));
    }

    #[test]
    fn statistics_counts_and_rate() {
        let sessions = vec![
            session(1, 1, true),
            session(2, 2, false),
            session(3, 48, false),
        ];
        let stats = ParkingStatistics::compute(
            &sessions,
            Utc::now(),
            Duration::hours(24),
            DateRange::default(),
        );
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.active_records, 2);
        assert_eq!(stats.completed_records, 1);
        assert_eq!(stats.expired_records, 1);
        assert_eq!(stats.completion_rate, 33.33);
    }

    #[test]
    fn statistics_of_nothing() {
        let stats = ParkingStatistics::compute(
            &[],
            Utc::now(),
            Duration::hours(24),
            DateRange::default(),
        );
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.hourly_distribution, [0; 24]);
        assert_eq!(stats.daily_distribution.len(), 7);
        assert!(stats.top_users.is_empty());
    }

    fn checked_in(id: i32, user_id: i32, at: DateTime<Utc>) -> ParkingSession {
        ParkingSession::open(
            id,
            NewParkingSession {
                vehicle_id: id,
                user_id,
                check_in_time: at,
                check_in_image: None,
            },
        )
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_limits_summary_counts() {
        let now = utc(2024, 3, 10, 12);
        let sessions = vec![
            checked_in(1, 1, utc(2024, 3, 1, 9)),
            checked_in(2, 1, utc(2024, 3, 5, 9)),
            checked_in(3, 2, utc(2024, 3, 9, 23)),
        ];
        let range = DateRange::new(Some(date(2024, 3, 5)), Some(date(2024, 3, 9))).unwrap();
        let stats = ParkingStatistics::compute(&sessions, now, Duration::hours(24), range);
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.active_records, 2);
        // Only session 2 is both in range and open past the expiry window
        assert_eq!(stats.expired_records, 1);

        let from_only = DateRange::new(Some(date(2024, 3, 6)), None).unwrap();
        let stats = ParkingStatistics::compute(&sessions, now, Duration::hours(24), from_only);
        assert_eq!(stats.total_records, 1);
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let err = DateRange::new(Some(date(2024, 3, 9)), Some(date(2024, 3, 1))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn hourly_and_daily_distributions() {
        let now = utc(2024, 3, 10, 12);
        let sessions = vec![
            checked_in(1, 1, utc(2024, 3, 10, 8)),
            checked_in(2, 2, utc(2024, 3, 10, 8)),
            checked_in(3, 3, utc(2024, 3, 9, 20)),
            // Older than 24h: daily only
            checked_in(4, 4, utc(2024, 3, 8, 8)),
            // Outside both windows
            checked_in(5, 5, utc(2024, 2, 1, 8)),
        ];
        let stats =
            ParkingStatistics::compute(&sessions, now, Duration::hours(24), DateRange::default());

        assert_eq!(stats.hourly_distribution[8], 2);
        assert_eq!(stats.hourly_distribution[20], 1);
        assert_eq!(stats.hourly_distribution.iter().sum::<u64>(), 3);

        let days: Vec<(NaiveDate, u64)> = stats
            .daily_distribution
            .iter()
            .map(|d| (d.date, d.count))
            .collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], (date(2024, 3, 4), 0));
        assert_eq!(days[4], (date(2024, 3, 8), 1));
        assert_eq!(days[5], (date(2024, 3, 9), 1));
        assert_eq!(days[6], (date(2024, 3, 10), 2));
    }

    #[test]
    fn top_users_ranked_and_capped() {
        let now = utc(2024, 3, 10, 12);
        let mut sessions = Vec::new();
        let mut id = 0;
        // user 7 has 3 sessions, users 1..=6 have 1 or 2
        for (user, count) in [(7, 3), (3, 2), (2, 2), (1, 1), (4, 1), (5, 1), (6, 1)] {
            for _ in 0..count {
                id += 1;
                sessions.push(checked_in(id, user, now - Duration::days(30)));
            }
        }
        let stats =
            ParkingStatistics::compute(&sessions, now, Duration::hours(24), DateRange::default());
        let ranked: Vec<(i32, u64)> = stats
            .top_users
            .iter()
            .map(|u| (u.user_id, u.parking_count))
            .collect();
        assert_eq!(ranked, vec![(7, 3), (2, 2), (3, 2), (1, 1), (4, 1)]);
    }
}
