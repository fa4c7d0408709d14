use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use encore_catalog::event::{BookingKind, Event};
use encore_catalog::pricing::FeePolicy;
use encore_core::currency::{currency_for_country, format_price};
use encore_core::session::SessionUser;
use encore_reco::{EventScorer, TasteProfile};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub images: Vec<String>,
    pub genres: Vec<String>,
    pub artists: Vec<String>,
    pub booking_kind: BookingKind,
    pub currency: String,
    pub price_display: String,
    pub price_per_item: Option<f64>,
    pub fee_per_item: f64,
    pub max_tickets: Option<i32>,
    pub max_reservations: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct EventPricingResponse {
    pub event_id: Uuid,
    pub quantity: i32,
    pub currency: String,
    pub total: Option<f64>,
    pub total_display: Option<String>,
    pub display_currency: String,
    /// Total in the requested display currency. Falls back to the
    /// unconverted amount when the conversion service is unavailable.
    pub display_total: Option<f64>,
    pub display_total_formatted: Option<String>,
}

fn to_response(event: Event, policy: &FeePolicy) -> EventResponse {
    let currency = event
        .country
        .as_deref()
        .map(currency_for_country)
        .unwrap_or("USD")
        .to_string();
    let breakdown = policy.breakdown(event.ticket_price, event.pass_fee_to_user, 1);

    let price_display = match event.booking_kind {
        BookingKind::Ticketed => match breakdown.total {
            Some(total) if total > 0.0 => format_price(total, &currency),
            Some(_) => "Free".to_string(),
            None => "Price N/A".to_string(),
        },
        BookingKind::Reservation => "Reservations".to_string(),
        BookingKind::InfoOnly => "Info Only".to_string(),
    };

    EventResponse {
        id: event.id,
        title: event.title,
        description: event.description,
        starts_at: event.starts_at,
        venue: event.location_text,
        country: event.country,
        city: event.city,
        images: event.poster_urls,
        genres: event.tags_genres,
        artists: event.tags_artists,
        booking_kind: event.booking_kind,
        currency,
        price_display,
        price_per_item: breakdown.price_per_item,
        fee_per_item: breakdown.fee_per_item,
        max_tickets: event.max_tickets,
        max_reservations: event.max_reservations,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/events
/// Upcoming events with display pricing
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state
        .events
        .upcoming_events()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let policy = FeePolicy {
        booking_fee: state.business_rules.booking_fee,
    };
    Ok(Json(events.into_iter().map(|e| to_response(e, &policy)).collect()))
}

/// GET /v1/events/recommended
/// Personalized ranking over the server-selected candidate set
pub async fn recommended_events(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    // 1. Candidate events; fall back to the country selection if the
    // recommendation function is unavailable
    let mut candidates = match state.events.recommended_for_user(session.user_id).await {
        Ok(events) => events,
        Err(err) => {
            warn!("Recommended-events call failed, falling back to country list: {}", err);
            state
                .events
                .events_by_user_country(session.user_id)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?
        }
    };

    // 2. Build the taste profile; a missing profile scores zero everywhere
    let taste = state
        .profiles
        .music_profile(session.user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .map(|p| TasteProfile::from_music_profile(&p))
        .unwrap_or_default();

    // 3. Rank; the scorer reports the impression best-effort
    let scorer = EventScorer::new(state.scoring.clone(), Some(state.usage.clone()));
    scorer.rank(&mut candidates, &taste, Some(session.user_id)).await;

    let policy = FeePolicy {
        booking_fee: state.business_rules.booking_fee,
    };
    Ok(Json(candidates.into_iter().map(|e| to_response(e, &policy)).collect()))
}

#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub currency: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// GET /v1/events/{event_id}/pricing
/// Charge total for a quantity, optionally shown in another currency.
/// Conversion is best-effort: on failure the unconverted amount is kept.
pub async fn event_pricing(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<EventPricingResponse>, AppError> {
    if query.quantity < 1 {
        return Err(AppError::ValidationError("quantity must be at least 1".to_string()));
    }

    let event = state
        .events
        .event_by_id(event_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("event not found".to_string()))?;

    let currency = event
        .country
        .as_deref()
        .map(currency_for_country)
        .unwrap_or("USD")
        .to_string();
    let policy = FeePolicy {
        booking_fee: state.business_rules.booking_fee,
    };
    let breakdown = policy.breakdown(event.ticket_price, event.pass_fee_to_user, query.quantity);

    let display_currency = query
        .currency
        .map(|c| c.to_uppercase())
        .unwrap_or_else(|| currency.clone());

    let display_total = match breakdown.total {
        Some(total) => Some(
            state
                .converter
                .convert(total, &currency, &display_currency)
                .await
                .unwrap_or(total),
        ),
        None => None,
    };

    Ok(Json(EventPricingResponse {
        event_id,
        quantity: query.quantity,
        total_display: breakdown.total.map(|t| format_price(t, &currency)),
        total: breakdown.total,
        currency,
        display_total_formatted: display_total.map(|t| format_price(t, &display_currency)),
        display_total,
        display_currency,
    }))
}
