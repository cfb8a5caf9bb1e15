//! Parking session domain entity

use chrono::{DateTime, Duration, Utc};

/// Lifecycle status of a parking session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkingStatus {
    /// Checked in, owner has not confirmed leaving
    Parked,
    /// Owner confirmed; waiting for the exit camera to close the session
    PendingCheckout,
    /// Closed
    CheckedOut,
}

impl ParkingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parked => "parked",
            Self::PendingCheckout => "pending_checkout",
            Self::CheckedOut => "checked_out",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "parked" => Some(Self::Parked),
            "pending_checkout" => Some(Self::PendingCheckout),
            "checked_out" => Some(Self::CheckedOut),
            _ => None,
        }
    }
}

/// Data needed to open a session (check-in)
#[derive(Debug, Clone)]
pub struct NewParkingSession {
    pub vehicle_id: i32,
    pub user_id: i32,
    pub check_in_time: DateTime<Utc>,
    pub check_in_image: Option<String>,
}

/// Data written when a session is closed (check-out)
#[derive(Debug, Clone)]
pub struct CheckOut {
    pub check_out_time: DateTime<Utc>,
    pub check_out_image: Option<String>,
}

/// One check-in/check-out cycle of a vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingSession {
    pub id: i32,
    pub vehicle_id: i32,
    pub user_id: i32,
    pub check_in_time: DateTime<Utc>,
    /// `None` while the session is open
    pub check_out_time: Option<DateTime<Utc>>,
    pub check_in_image: Option<String>,
    pub check_out_image: Option<String>,
    pub is_check_out_confirmed: bool,
    pub status: ParkingStatus,
}

impl ParkingSession {
    pub fn open(id: i32, new: NewParkingSession) -> Self {
        Self {
            id,
            vehicle_id: new.vehicle_id,
            user_id: new.user_id,
            check_in_time: new.check_in_time,
            check_out_time: None,
            check_in_image: new.check_in_image,
            check_out_image: None,
            is_check_out_confirmed: false,
            status: ParkingStatus::Parked,
        }
    }

    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }

    pub fn confirm_checkout(&mut self) {
        self.is_check_out_confirmed = true;
        self.status = Self::status_for(self.is_open(), true);
    }

    pub fn close(&mut self, checkout: CheckOut) {
        self.check_out_time = Some(checkout.check_out_time);
        self.check_out_image = checkout.check_out_image;
        self.status = ParkingStatus::CheckedOut;
    }

    /// Status implied by the open flag and the confirmation flag.
    pub fn status_for(open: bool, confirmed: bool) -> ParkingStatus {
        match (open, confirmed) {
            (false, _) => ParkingStatus::CheckedOut,
            (true, true) => ParkingStatus::PendingCheckout,
            (true, false) => ParkingStatus::Parked,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.check_out_time.map(|out| out - self.check_in_time)
    }

    /// Open for longer than `expiry` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        self.is_open() && now - self.check_in_time > expiry
    }
}
