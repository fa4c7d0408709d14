pub mod flow;
pub mod models;
pub mod orchestrator;
pub mod reservation;

#[cfg(test)]
pub(crate) mod testutil;

pub use flow::{BookingFlow, FlowError};
pub use models::{generate_booking_code, BookingOutcome, BookingRequest};
pub use orchestrator::{PaymentAttempt, PaymentContext, PaymentPhase, RedirectReturn, SandboxGateway};
pub use reservation::{slots_for_date, ReservationError, ReservationFlow, ReservationRequest};
