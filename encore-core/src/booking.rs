use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle status. This core only ever writes `Confirmed`;
/// cancelled rows may exist in the table from other surfaces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// A confirmed reservation of `quantity` units against an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub price_paid_per_item: f64,
    pub total_price_paid: f64,
    pub booking_fee_paid: f64,
    pub status: BookingStatus,
    /// Six numeric digits, display/support reference only.
    pub booking_code: String,
    pub checked_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub price_paid_per_item: f64,
    pub total_price_paid: f64,
    pub booking_fee_paid: f64,
    pub booking_code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingWriteError {
    #[error("a booking for this event already exists")]
    Duplicate,

    #[error("insufficient capacity: {remaining} remaining")]
    CapacityExceeded { remaining: i64 },

    #[error("booking write failed: {0}")]
    Store(String),
}
