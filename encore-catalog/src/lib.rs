pub mod availability;
pub mod event;
pub mod pricing;

pub use availability::{check_request, remaining_capacity, AvailabilityError, Capacity};
pub use event::{BookingKind, Event, EventRepository, EventRpcError, OrganizerSchedule};
pub use pricing::{FeePolicy, PriceBreakdown};
