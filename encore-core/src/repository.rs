use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingWriteError, NewBooking};
use encore_shared::models::profile::MusicProfile;
use encore_shared::models::usage::{BookingUsageEvent, ImpressionUsageEvent};

/// Repository trait for booking reads and writes
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert one CONFIRMED row. A uniqueness violation maps to
    /// `BookingWriteError::Duplicate`.
    async fn insert_confirmed(&self, new: &NewBooking) -> Result<Booking, BookingWriteError>;

    /// Insert one CONFIRMED row with the capacity limit enforced inside a
    /// single transaction. `limit` of `None` means unlimited.
    async fn insert_confirmed_checked(
        &self,
        new: &NewBooking,
        limit: Option<i64>,
    ) -> Result<Booking, BookingWriteError>;

    /// Sum of quantities across all CONFIRMED bookings for an event.
    async fn confirmed_quantity(
        &self,
        event_id: Uuid,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>>;

    async fn bookings_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for user music-preference records
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn music_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<MusicProfile>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Best-effort usage metering. Callers never block on these and never
/// propagate their failures.
#[async_trait]
pub trait UsageReporter: Send + Sync {
    async fn report_booking_usage(&self, event: BookingUsageEvent) -> Result<(), String>;

    async fn report_impression_usage(&self, event: ImpressionUsageEvent) -> Result<(), String>;
}
