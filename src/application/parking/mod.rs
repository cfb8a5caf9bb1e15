//! Parking use cases: event recording, owner confirmation, reporting

pub mod outcome;
pub mod service;

pub use outcome::{
    DailyCount, DateRange, EventOutcome, ParkingEvent, ParkingStatistics, SessionDetails,
    SessionDuration, UserCount,
};
pub use service::{ParkingService, DEFAULT_EXPIRY_HOURS};
