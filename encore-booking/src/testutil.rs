use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use encore_catalog::event::{
    BookingKind, Event, EventRepository, EventRpcError, OrganizerSchedule,
};
use encore_core::booking::{Booking, BookingStatus, BookingWriteError, NewBooking};
use encore_core::payment::{PaymentGateway, PaymentIntent, PaymentStatus, SheetOutcome};
use encore_core::repository::{BookingRepository, UsageReporter};
use encore_shared::models::usage::{BookingUsageEvent, ImpressionUsageEvent};
use encore_store::app_config::BusinessRules;

pub fn test_rules() -> BusinessRules {
    BusinessRules {
        booking_fee: 0.50,
        pass_fee_default: true,
        merchant_display_name: "Encore".to_string(),
        reservation_window_days: 28,
        slot_interval_minutes: 30,
        settlement_currency: "SGD".to_string(),
    }
}

pub fn base_event(kind: BookingKind) -> Event {
    Event {
        id: Uuid::new_v4(),
        organizer_id: Uuid::new_v4(),
        title: "Friday Sessions".to_string(),
        description: Some("Live electronic showcase".to_string()),
        starts_at: Utc.with_ymd_and_hms(2026, 9, 12, 20, 0, 0).unwrap(),
        location_text: Some("Warehouse 9".to_string()),
        country: Some("Singapore".to_string()),
        city: Some("Singapore".to_string()),
        poster_urls: vec![],
        tags_genres: vec![],
        tags_artists: vec![],
        tags_songs: vec![],
        booking_kind: kind,
        ticket_price: None,
        pass_fee_to_user: true,
        max_tickets: None,
        max_reservations: None,
    }
}

pub fn ticketed_event(price: f64, max_tickets: Option<i32>) -> Event {
    let mut event = base_event(BookingKind::Ticketed);
    event.ticket_price = Some(price);
    event.max_tickets = max_tickets;
    event
}

pub fn reservation_event(max_reservations: Option<i32>) -> Event {
    let mut event = base_event(BookingKind::Reservation);
    event.ticket_price = Some(0.0);
    event.max_reservations = max_reservations;
    event
}

#[derive(Default)]
pub struct MemoryEvents {
    pub events: Mutex<HashMap<Uuid, Event>>,
    pub schedule: Mutex<Option<OrganizerSchedule>>,
    pub backend_missing: AtomicBool,
    daily: Mutex<HashMap<(Uuid, NaiveDate), Uuid>>,
}

impl MemoryEvents {
    pub fn with_event(event: Event) -> Arc<Self> {
        let repo = Self::default();
        repo.events.lock().unwrap().insert(event.id, event);
        Arc::new(repo)
    }

    pub fn with_schedule(schedule: OrganizerSchedule) -> Arc<Self> {
        let repo = Self::default();
        *repo.schedule.lock().unwrap() = Some(schedule);
        Arc::new(repo)
    }
}

#[async_trait]
impl EventRepository for MemoryEvents {
    async fn upcoming_events(
        &self,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.events.lock().unwrap().values().cloned().collect())
    }

    async fn event_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Event>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.events.lock().unwrap().get(&id).cloned())
    }

    async fn recommended_for_user(
        &self,
        _user_id: Uuid,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>> {
        self.upcoming_events().await
    }

    async fn events_by_user_country(
        &self,
        _user_id: Uuid,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>> {
        self.upcoming_events().await
    }

    async fn organizer_schedule(
        &self,
        organizer_id: Uuid,
    ) -> Result<Option<OrganizerSchedule>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .schedule
            .lock()
            .unwrap()
            .clone()
            .filter(|s| s.organizer_id == organizer_id))
    }

    async fn get_or_create_daily_reservation_event(
        &self,
        organizer_id: Uuid,
        date: NaiveDate,
        capacity: i32,
        name: &str,
        image: Option<&str>,
    ) -> Result<Event, EventRpcError> {
        if self.backend_missing.load(Ordering::SeqCst) {
            return Err(EventRpcError::BackendMissing);
        }

        let mut daily = self.daily.lock().unwrap();
        let mut events = self.events.lock().unwrap();
        if let Some(existing) = daily.get(&(organizer_id, date)) {
            return Ok(events.get(existing).cloned().unwrap());
        }

        let mut event = base_event(BookingKind::Reservation);
        event.organizer_id = organizer_id;
        event.title = name.to_string();
        event.ticket_price = Some(0.0);
        event.max_reservations = Some(capacity);
        event.poster_urls = image.map(|i| vec![i.to_string()]).unwrap_or_default();
        daily.insert((organizer_id, date), event.id);
        events.insert(event.id, event.clone());
        Ok(event)
    }
}

#[derive(Default)]
pub struct MemoryBookings {
    pub rows: Mutex<Vec<Booking>>,
    pub fail_next_insert: AtomicBool,
    pub read_gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryBookings {
    fn make_booking(new: &NewBooking) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            user_id: new.user_id,
            quantity: new.quantity,
            price_paid_per_item: new.price_paid_per_item,
            total_price_paid: new.total_price_paid,
            booking_fee_paid: new.booking_fee_paid,
            status: BookingStatus::Confirmed,
            booking_code: new.booking_code.clone(),
            checked_in: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn insert(
        &self,
        new: &NewBooking,
        limit: Option<Option<i64>>,
    ) -> Result<Booking, BookingWriteError> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(BookingWriteError::Store("connection reset by peer".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|b| b.event_id == new.event_id && b.user_id == new.user_id)
        {
            return Err(BookingWriteError::Duplicate);
        }

        if let Some(Some(limit)) = limit {
            let confirmed: i64 = rows
                .iter()
                .filter(|b| b.event_id == new.event_id && b.status == BookingStatus::Confirmed)
                .map(|b| i64::from(b.quantity))
                .sum();
            let remaining = if limit == 0 { 0 } else { limit - confirmed };
            if i64::from(new.quantity) > remaining {
                return Err(BookingWriteError::CapacityExceeded {
                    remaining: remaining.max(0),
                });
            }
        }

        let booking = Self::make_booking(new);
        rows.push(booking.clone());
        Ok(booking)
    }

    pub fn seed(&self, event_id: Uuid, quantity: i32) {
        let new = NewBooking {
            event_id,
            user_id: Uuid::new_v4(),
            quantity,
            price_paid_per_item: 0.0,
            total_price_paid: 0.0,
            booking_fee_paid: 0.0,
            booking_code: "000000".to_string(),
        };
        self.insert(&new, None).unwrap();
    }
}

#[async_trait]
impl BookingRepository for MemoryBookings {
    async fn insert_confirmed(&self, new: &NewBooking) -> Result<Booking, BookingWriteError> {
        self.insert(new, None)
    }

    async fn insert_confirmed_checked(
        &self,
        new: &NewBooking,
        limit: Option<i64>,
    ) -> Result<Booking, BookingWriteError> {
        self.insert(new, Some(limit))
    }

    async fn confirmed_quantity(
        &self,
        event_id: Uuid,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        let gate = self.read_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.event_id == event_id && b.status == BookingStatus::Confirmed)
            .map(|b| i64::from(b.quantity))
            .sum())
    }

    async fn bookings_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct CountingReporter {
    pub booking_reports: AtomicUsize,
    pub impression_reports: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl UsageReporter for CountingReporter {
    async fn report_booking_usage(&self, _event: BookingUsageEvent) -> Result<(), String> {
        self.booking_reports.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err("broker unavailable".to_string());
        }
        Ok(())
    }

    async fn report_impression_usage(&self, _event: ImpressionUsageEvent) -> Result<(), String> {
        self.impression_reports.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err("broker unavailable".to_string());
        }
        Ok(())
    }
}

pub struct ScriptedGateway {
    pub intents: Mutex<HashMap<String, PaymentIntent>>,
    pub sheet: Mutex<SheetOutcome>,
    pub fail_intent: AtomicBool,
    pub intent_status: Mutex<PaymentStatus>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            intents: Mutex::new(HashMap::new()),
            sheet: Mutex::new(SheetOutcome::Completed),
            fail_intent: AtomicBool::new(false),
            intent_status: Mutex::new(PaymentStatus::Succeeded),
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_intent(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_intent.load(Ordering::SeqCst) {
            return Err("payment service unavailable".into());
        }
        let intent = PaymentIntent {
            id: format!("pi_test_{}", Uuid::new_v4().simple()),
            event_id,
            user_id,
            quantity,
            amount,
            currency: currency.to_string(),
            status: PaymentStatus::RequiresPaymentMethod,
            client_secret: Some(format!("secret_test_{}", Uuid::new_v4().simple())),
            created_at: Utc::now(),
        };
        self.intents
            .lock()
            .unwrap()
            .insert(intent.id.clone(), intent.clone());
        Ok(intent)
    }

    async fn get_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        let mut intent = self
            .intents
            .lock()
            .unwrap()
            .get(intent_id)
            .cloned()
            .ok_or("no such intent")?;
        intent.status = self.intent_status.lock().unwrap().clone();
        Ok(intent)
    }

    async fn present_sheet(
        &self,
        _client_secret: &str,
        _merchant_display_name: &str,
    ) -> Result<SheetOutcome, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.sheet.lock().unwrap().clone())
    }
}
