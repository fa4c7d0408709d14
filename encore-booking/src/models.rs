use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::orchestrator::PaymentContext;
use encore_core::booking::Booking;

/// One attempt to book `quantity` units of an event.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub event_id: Uuid,
    pub quantity: i32,
    pub context: PaymentContext,
}

/// Terminal result of a booking attempt surfaced to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BookingOutcome {
    Confirmed {
        booking: Booking,
        event_title: String,
        quantity: i32,
    },
    /// Redirect context: the caller completes payment against the client
    /// secret and returns via the payment-return URL.
    PaymentPending {
        intent_id: String,
        client_secret: String,
    },
    /// User dismissed the payment sheet. Not an error; nothing was charged
    /// and no booking exists.
    Canceled,
}

/// Six-digit display code for support reference. Uniformly random;
/// collisions are tolerated, uniqueness is not enforced here.
pub fn generate_booking_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    code.to_string()
}
