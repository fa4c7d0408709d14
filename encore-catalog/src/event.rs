use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an event can be booked, if at all
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingKind {
    Ticketed,
    Reservation,
    InfoOnly,
}

/// An organized activity as published in the catalog. Read-only to the
/// booking core; organizers create and edit these elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub location_text: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub poster_urls: Vec<String>,
    pub tags_genres: Vec<String>,
    pub tags_artists: Vec<String>,
    pub tags_songs: Vec<String>,
    pub booking_kind: BookingKind,
    /// Base price per ticket; 0 means free, None means no price applies.
    pub ticket_price: Option<f64>,
    pub pass_fee_to_user: bool,
    pub max_tickets: Option<i32>,
    pub max_reservations: Option<i32>,
}

impl Event {
    /// The capacity field governed by the booking kind. `InfoOnly` events
    /// are never bookable, which reads as a hard limit of zero.
    pub fn capacity_limit(&self) -> Option<i64> {
        match self.booking_kind {
            BookingKind::Ticketed => self.max_tickets.map(i64::from),
            BookingKind::Reservation => self.max_reservations.map(i64::from),
            BookingKind::InfoOnly => Some(0),
        }
    }

    pub fn is_bookable(&self) -> bool {
        !matches!(self.booking_kind, BookingKind::InfoOnly)
    }
}

/// One open/close range for a weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningRange {
    pub weekday: Weekday,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

/// Weekly opening hours, blocked dates and seating capacity for a venue
/// that takes daily reservations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerSchedule {
    pub organizer_id: Uuid,
    pub venue_name: String,
    pub venue_image: Option<String>,
    pub seating_capacity: i32,
    pub weekly_hours: Vec<OpeningRange>,
    pub unavailable_dates: Vec<NaiveDate>,
}

impl OrganizerSchedule {
    pub fn ranges_for(&self, weekday: Weekday) -> impl Iterator<Item = &OpeningRange> {
        self.weekly_hours.iter().filter(move |r| r.weekday == weekday)
    }

    pub fn is_date_blocked(&self, date: NaiveDate) -> bool {
        self.unavailable_dates.contains(&date)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventRpcError {
    /// The required server-side function is not installed. No user retry
    /// can fix this; surface a distinct contact-support message.
    #[error("required backend function is not installed")]
    BackendMissing,

    #[error("event store call failed: {0}")]
    Store(String),
}

/// Repository trait for event catalog access
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn upcoming_events(
        &self,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>>;

    async fn event_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Event>, Box<dyn std::error::Error + Send + Sync>>;

    /// Candidate events for personalized ranking, selected server-side.
    async fn recommended_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>>;

    /// Fallback candidate set: events in the user's country.
    async fn events_by_user_country(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>>;

    async fn organizer_schedule(
        &self,
        organizer_id: Uuid,
    ) -> Result<Option<OrganizerSchedule>, Box<dyn std::error::Error + Send + Sync>>;

    /// Idempotent get-or-create of the synthetic per-day reservation event
    /// for (organizer, date).
    async fn get_or_create_daily_reservation_event(
        &self,
        organizer_id: Uuid,
        date: NaiveDate,
        capacity: i32,
        name: &str,
        image: Option<&str>,
    ) -> Result<Event, EventRpcError>;
}
