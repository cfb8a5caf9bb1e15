pub mod events;
pub mod parking;

pub use events::{create_event_bus, EventBus, EventMessage, EventSubscriber, SharedEventBus};
pub use parking::{
    DailyCount, DateRange, EventOutcome, ParkingEvent, ParkingService, ParkingStatistics,
    SessionDetails, SessionDuration, UserCount,
};
