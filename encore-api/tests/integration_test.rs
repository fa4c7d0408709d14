use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use chrono::{NaiveDate, TimeZone, Utc};
use tower::ServiceExt;
use uuid::Uuid;

use encore_api::{app, state::{AppState, AuthConfig}};
use encore_catalog::event::{
    BookingKind, Event, EventRepository, EventRpcError, OrganizerSchedule,
};
use encore_core::booking::{Booking, BookingStatus, BookingWriteError, NewBooking};
use encore_core::currency::CurrencyConverter;
use encore_core::payment::{PaymentGateway, PaymentIntent, PaymentStatus, SheetOutcome};
use encore_core::repository::{BookingRepository, ProfileRepository, UsageReporter};
use encore_shared::models::profile::MusicProfile;
use encore_shared::models::usage::{BookingUsageEvent, ImpressionUsageEvent};
use encore_store::app_config::{BusinessRules, ScoringConfig};

const TEST_SECRET: &str = "integration-test-secret";

// ============================================================================
// Mock collaborators
// ============================================================================

#[derive(Default)]
struct MockEvents {
    events: Mutex<HashMap<Uuid, Event>>,
}

impl MockEvents {
    fn insert(&self, event: Event) {
        self.events.lock().unwrap().insert(event.id, event);
    }
}

#[async_trait]
impl EventRepository for MockEvents {
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
        _organizer_id: Uuid,
    ) -> Result<Option<OrganizerSchedule>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(None)
    }

    async fn get_or_create_daily_reservation_event(
        &self,
        _organizer_id: Uuid,
        _date: NaiveDate,
        _capacity: i32,
        _name: &str,
        _image: Option<&str>,
    ) -> Result<Event, EventRpcError> {
        Err(EventRpcError::BackendMissing)
    }
}

#[derive(Default)]
struct MockBookings {
    rows: Mutex<Vec<Booking>>,
}

impl MockBookings {
    fn insert(&self, new: &NewBooking) -> Result<Booking, BookingWriteError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|b| b.event_id == new.event_id && b.user_id == new.user_id)
        {
            return Err(BookingWriteError::Duplicate);
        }
        let now = Utc::now();
        let booking = Booking {
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
        };
        rows.push(booking.clone());
        Ok(booking)
    }
}

#[async_trait]
impl BookingRepository for MockBookings {
    async fn insert_confirmed(&self, new: &NewBooking) -> Result<Booking, BookingWriteError> {
        self.insert(new)
    }

    async fn insert_confirmed_checked(
        &self,
        new: &NewBooking,
        _limit: Option<i64>,
    ) -> Result<Booking, BookingWriteError> {
        self.insert(new)
    }

    async fn confirmed_quantity(
        &self,
        event_id: Uuid,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.event_id == event_id)
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

struct MockProfiles;

#[async_trait]
impl ProfileRepository for MockProfiles {
    async fn music_profile(
        &self,
        _user_id: Uuid,
    ) -> Result<Option<MusicProfile>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Some(MusicProfile {
            favorite_artists: Some("Daft Punk".to_string()),
            ..Default::default()
        }))
    }
}

struct MockGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            intents: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        let intent = PaymentIntent {
            id: format!("pi_it_{}", Uuid::new_v4().simple()),
            event_id,
            user_id,
            quantity,
            amount,
            currency: currency.to_string(),
            status: PaymentStatus::RequiresPaymentMethod,
            client_secret: Some(format!("secret_it_{}", Uuid::new_v4().simple())),
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
        intent.status = PaymentStatus::Succeeded;
        Ok(intent)
    }

    async fn present_sheet(
        &self,
        _client_secret: &str,
        _merchant_display_name: &str,
    ) -> Result<SheetOutcome, Box<dyn std::error::Error + Send + Sync>> {
        Ok(SheetOutcome::Completed)
    }
}

struct MockReporter;

#[async_trait]
impl UsageReporter for MockReporter {
    async fn report_booking_usage(&self, _event: BookingUsageEvent) -> Result<(), String> {
        Ok(())
    }

    async fn report_impression_usage(&self, _event: ImpressionUsageEvent) -> Result<(), String> {
        Ok(())
    }
}

/// Converter that always fails, exercising the keep-the-amount fallback.
struct FailingConverter;

#[async_trait]
impl CurrencyConverter for FailingConverter {
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        if from.eq_ignore_ascii_case(to) {
            return Some(amount);
        }
        None
    }
}

// ============================================================================
// Harness
// ============================================================================

fn ticketed_event() -> Event {
    Event {
        id: Uuid::new_v4(),
        organizer_id: Uuid::new_v4(),
        title: "Friday Sessions".to_string(),
        description: Some("Live electronic showcase".to_string()),
        starts_at: Utc.with_ymd_and_hms(2027, 3, 6, 20, 0, 0).unwrap(),
        location_text: Some("Warehouse 9".to_string()),
        country: Some("Singapore".to_string()),
        city: Some("Singapore".to_string()),
        poster_urls: vec![],
        tags_genres: vec!["House".to_string()],
        tags_artists: vec!["Daft Punk".to_string()],
        tags_songs: vec![],
        booking_kind: BookingKind::Ticketed,
        ticket_price: Some(10.0),
        pass_fee_to_user: true,
        max_tickets: Some(100),
        max_reservations: None,
    }
}

struct Harness {
    events: Arc<MockEvents>,
    bookings: Arc<MockBookings>,
    state: AppState,
}

fn harness() -> Harness {
    let events = Arc::new(MockEvents::default());
    let bookings = Arc::new(MockBookings::default());
    let state = AppState {
        events: events.clone(),
        bookings: bookings.clone(),
        profiles: Arc::new(MockProfiles),
        gateway: Arc::new(MockGateway::new()),
        usage: Arc::new(MockReporter),
        converter: Arc::new(FailingConverter),
        auth: AuthConfig {
            secret: TEST_SECRET.to_string(),
            expiration: 3600,
        },
        business_rules: BusinessRules {
            booking_fee: 0.50,
            pass_fee_default: true,
            merchant_display_name: "Encore".to_string(),
            reservation_window_days: 28,
            slot_interval_minutes: 30,
            settlement_currency: "SGD".to_string(),
        },
        scoring: ScoringConfig::default(),
        active_attempts: Arc::new(tokio::sync::Mutex::new(HashSet::new())),
    };
    Harness {
        events,
        bookings,
        state,
    }
}

fn bearer_token(user_id: Uuid) -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        role: String,
        exp: usize,
    }
    let claims = Claims {
        sub: user_id.to_string(),
        role: "USER".to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_event_listing_is_public_and_priced() {
    let h = harness();
    h.events.insert(ticketed_event());

    let response = app(h.state)
        .oneshot(Request::builder().uri("/v1/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let listed = json.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    // Singapore event, 10.00 base + 0.50 pass-through fee
    assert_eq!(listed[0]["currency"], "SGD");
    assert_eq!(listed[0]["price_display"], "S$10.50");
}

#[tokio::test]
async fn test_booking_requires_authentication() {
    let h = harness();
    let event = ticketed_event();
    let event_id = event.id;
    h.events.insert(event);

    let body = serde_json::json!({
        "event_id": event_id,
        "quantity": 1,
        "context": "embedded_sheet",
    });
    let response = app(h.state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bookings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(h.bookings.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_paid_booking_round_trip_with_embedded_sheet() {
    let h = harness();
    let event = ticketed_event();
    let event_id = event.id;
    h.events.insert(event);
    let user_id = Uuid::new_v4();

    let body = serde_json::json!({
        "event_id": event_id,
        "quantity": 2,
        "context": "embedded_sheet",
    });
    let response = app(h.state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bookings")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", bearer_token(user_id)))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["outcome"], "confirmed");
    assert!(json["message"].as_str().unwrap().contains("Friday Sessions"));
    assert_eq!(json["navigation"]["reset_to"].as_array().unwrap().len(), 2);

    let rows = h.bookings.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_price_paid, 21.0);
}

#[tokio::test]
async fn test_redirect_payment_return_finalizes_and_strips_parameters() {
    let h = harness();
    let event = ticketed_event();
    let event_id = event.id;
    h.events.insert(event);
    let user_id = Uuid::new_v4();
    let token = bearer_token(user_id);
    let router = app(h.state);

    // 1. Start a redirect-context booking: payment stays pending
    let body = serde_json::json!({
        "event_id": event_id,
        "quantity": 1,
        "context": "redirect",
    });
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/bookings")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["outcome"], "payment_pending");
    let intent_id = json["intent_id"].as_str().unwrap().to_string();
    assert!(h.bookings.rows.lock().unwrap().is_empty());

    // 2. Arrive back with the provider parameters: booking is created and
    // the response strips them by redirecting to the bare path
    let uri = format!(
        "/v1/bookings/payment-return?payment_success=true&payment_intent={}",
        intent_id
    );
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/v1/bookings");
    assert_eq!(h.bookings.rows.lock().unwrap().len(), 1);

    // 3. Replaying the same stale parameters does not create a second row
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(h.bookings.rows.lock().unwrap().len(), 1);

    // 4. A reload of the stripped URL has nothing to finalize
    let response = router
        .oneshot(
            Request::builder()
                .uri("/v1/bookings/payment-return")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(h.bookings.rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_recommended_events_rank_profile_matches_first() {
    let h = harness();
    let hit = ticketed_event();
    let hit_id = hit.id;
    let mut miss = ticketed_event();
    miss.title = "Jazz Evening".to_string();
    miss.description = Some("Standards quartet".to_string());
    miss.tags_artists = vec!["Bill Evans Trio".to_string()];
    miss.tags_genres = vec!["Jazz".to_string()];
    h.events.insert(miss);
    h.events.insert(hit);

    let response = app(h.state)
        .oneshot(
            Request::builder()
                .uri("/v1/events/recommended")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", bearer_token(Uuid::new_v4())),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let listed = json.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    // The profile's favorite artist is tagged on the first event
    assert_eq!(listed[0]["id"], hit_id.to_string());
}

#[tokio::test]
async fn test_pricing_keeps_unconverted_amount_when_conversion_fails() {
    let h = harness();
    let event = ticketed_event();
    let event_id = event.id;
    h.events.insert(event);

    let uri = format!("/v1/events/{}/pricing?quantity=2&currency=EUR", event_id);
    let response = app(h.state)
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["currency"], "SGD");
    assert_eq!(json["total"], 21.0);
    // Conversion failed; the unconverted amount is kept rather than blocking
    assert_eq!(json["display_currency"], "EUR");
    assert_eq!(json["display_total"], 21.0);
}
