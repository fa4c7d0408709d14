use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{generate_booking_code, BookingOutcome};
use encore_catalog::event::{EventRepository, EventRpcError, OrganizerSchedule};
use encore_core::booking::{BookingWriteError, NewBooking};
use encore_core::repository::{BookingRepository, UsageReporter};
use encore_core::session::SessionUser;
use encore_shared::models::usage::BookingUsageEvent;
use encore_store::app_config::BusinessRules;

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("this venue does not take reservations")]
    UnknownOrganizer,

    #[error("the selected date is not available")]
    DateUnavailable,

    #[error("the selected time is not available")]
    SlotUnavailable,

    #[error("party size must be at least 1")]
    InvalidPartySize,

    #[error("only {remaining} spots remaining for this date")]
    Insufficient { remaining: i64 },

    #[error("you already have a reservation for this date")]
    Duplicate,

    /// The reservation backend is not installed on this database. No user
    /// retry can fix it; surface a contact-support message with this code.
    #[error("reservations are temporarily unavailable, please contact support (ref RSV-42883)")]
    BackendMissing,

    #[error("reservation failed: {0}")]
    Store(String),
}

/// Expand one date's opening hours into bookable times. Slots sit on the
/// interval grid, the last slot strictly before close; when `date` is today,
/// times at or before `now` are dropped. A weekday with no configured hours
/// yields nothing.
pub fn slots_for_date(
    schedule: &OrganizerSchedule,
    date: NaiveDate,
    now: DateTime<Utc>,
    interval_minutes: u32,
) -> Vec<NaiveTime> {
    let interval = interval_minutes.max(1);
    let mut slots = Vec::new();

    for range in schedule.ranges_for(date.weekday()) {
        let mut slot = match align_to_grid(range.open, interval) {
            Some(t) => t,
            None => continue,
        };
        while slot < range.close {
            slots.push(slot);
            let (next, wrapped) = slot.overflowing_add_signed(Duration::minutes(i64::from(interval)));
            if wrapped != 0 {
                break;
            }
            slot = next;
        }
    }

    if date == now.date_naive() {
        let current = now.time();
        slots.retain(|slot| *slot > current);
    }

    slots.sort();
    slots.dedup();
    slots
}

/// Round a time up onto the interval grid (09:15 -> 09:30 for 30 minutes).
fn align_to_grid(time: NaiveTime, interval_minutes: u32) -> Option<NaiveTime> {
    use chrono::Timelike;

    let total = time.hour() * 60 + time.minute();
    let mut aligned = total;
    if time.second() > 0 || total % interval_minutes != 0 {
        aligned = (total / interval_minutes + 1) * interval_minutes;
    }
    if aligned >= 24 * 60 {
        return None;
    }
    NaiveTime::from_hms_opt(aligned / 60, aligned % 60, 0)
}

/// Is the date inside the selectable window and not blocked by the venue?
pub fn date_selectable(
    schedule: &OrganizerSchedule,
    date: NaiveDate,
    today: NaiveDate,
    window_days: i64,
) -> bool {
    date >= today && date <= today + Duration::days(window_days) && !schedule.is_date_blocked(date)
}

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub organizer_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub guests: i32,
}

/// Daily-reservation specialization: resolves the synthetic per-day event
/// and reuses the free-path confirmation step.
pub struct ReservationFlow {
    events: Arc<dyn EventRepository>,
    bookings: Arc<dyn BookingRepository>,
    usage: Arc<dyn UsageReporter>,
    rules: BusinessRules,
}

impl ReservationFlow {
    pub fn new(
        events: Arc<dyn EventRepository>,
        bookings: Arc<dyn BookingRepository>,
        usage: Arc<dyn UsageReporter>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            events,
            bookings,
            usage,
            rules,
        }
    }

    pub async fn reserve(
        &self,
        session: Option<&SessionUser>,
        request: &ReservationRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingOutcome, ReservationError> {
        let Some(session) = session else {
            return Err(ReservationError::AuthenticationRequired);
        };
        if request.guests < 1 {
            return Err(ReservationError::InvalidPartySize);
        }

        // 1. Venue schedule
        let schedule = self
            .events
            .organizer_schedule(request.organizer_id)
            .await
            .map_err(|e| ReservationError::Store(e.to_string()))?
            .ok_or(ReservationError::UnknownOrganizer)?;

        // 2. Date window and slot validation
        let today = now.date_naive();
        if !date_selectable(&schedule, request.date, today, self.rules.reservation_window_days) {
            return Err(ReservationError::DateUnavailable);
        }
        let slots = slots_for_date(&schedule, request.date, now, self.rules.slot_interval_minutes);
        if !slots.contains(&request.time) {
            return Err(ReservationError::SlotUnavailable);
        }

        // 3. Resolve the synthetic per-day event
        let event = self
            .events
            .get_or_create_daily_reservation_event(
                request.organizer_id,
                request.date,
                schedule.seating_capacity,
                &schedule.venue_name,
                schedule.venue_image.as_deref(),
            )
            .await
            .map_err(|err| match err {
                EventRpcError::BackendMissing => {
                    warn!(
                        "Daily reservation function missing for organizer {}",
                        request.organizer_id
                    );
                    ReservationError::BackendMissing
                }
                EventRpcError::Store(detail) => ReservationError::Store(detail),
            })?;

        // 4. Capacity against the confirmed sum for the day
        let capacity = i64::from(schedule.seating_capacity);
        let confirmed = self
            .bookings
            .confirmed_quantity(event.id)
            .await
            .map_err(|e| ReservationError::Store(e.to_string()))?;
        if confirmed + i64::from(request.guests) > capacity {
            return Err(ReservationError::Insufficient {
                remaining: (capacity - confirmed).max(0),
            });
        }

        // 5. Reservations are always free; write through the guarded path
        let new = NewBooking {
            event_id: event.id,
            user_id: session.user_id,
            quantity: request.guests,
            price_paid_per_item: 0.0,
            total_price_paid: 0.0,
            booking_fee_paid: 0.0,
            booking_code: generate_booking_code(),
        };
        let booking = self
            .bookings
            .insert_confirmed_checked(&new, Some(capacity))
            .await
            .map_err(|err| match err {
                BookingWriteError::Duplicate => ReservationError::Duplicate,
                BookingWriteError::CapacityExceeded { remaining } => {
                    ReservationError::Insufficient { remaining }
                }
                BookingWriteError::Store(detail) => ReservationError::Store(detail),
            })?;

        info!(
            "Reservation confirmed: {} guests at {} on {} {}",
            request.guests, schedule.venue_name, request.date, request.time
        );

        let reporter = self.usage.clone();
        let payload = BookingUsageEvent {
            event_id: event.id,
            organizer_id: Some(request.organizer_id),
            booking_id: booking.id,
            quantity: booking.quantity,
            timestamp: Utc::now().timestamp(),
        };
        tokio::spawn(async move {
            if let Err(err) = reporter.report_booking_usage(payload).await {
                warn!("Booking usage report failed: {}", err);
            }
        });

        Ok(BookingOutcome::Confirmed {
            booking,
            event_title: event.title.clone(),
            quantity: request.guests,
        })
    }
}
