use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bookings::{outcome_response, ConfirmBookingResponse};
use crate::error::AppError;
use crate::state::AppState;
use encore_booking::reservation::{
    date_selectable, slots_for_date, ReservationFlow, ReservationRequest,
};
use encore_core::session::SessionUser;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub selectable: bool,
    pub slots: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub organizer_id: Uuid,
    pub date: NaiveDate,
    /// Slot time as HH:MM
    pub time: String,
    pub guests: i32,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/organizers/{organizer_id}/slots?date=YYYY-MM-DD
/// Bookable times for one date at one venue
pub async fn organizer_slots(
    State(state): State<AppState>,
    Path(organizer_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let schedule = state
        .events
        .organizer_schedule(organizer_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("venue not found".to_string()))?;

    let now = Utc::now();
    let selectable = date_selectable(
        &schedule,
        query.date,
        now.date_naive(),
        state.business_rules.reservation_window_days,
    );
    let slots = if selectable {
        slots_for_date(&schedule, query.date, now, state.business_rules.slot_interval_minutes)
    } else {
        Vec::new()
    };

    Ok(Json(SlotsResponse {
        date: query.date,
        selectable,
        slots: slots.iter().map(|t| t.format("%H:%M").to_string()).collect(),
    }))
}

/// POST /v1/reservations
/// Book a daily reservation slot; always free, same confirmation shape as
/// the booking flow
pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<Json<ConfirmBookingResponse>, AppError> {
    let time = NaiveTime::parse_from_str(&req.time, "%H:%M")
        .map_err(|_| AppError::ValidationError("time must be HH:MM".to_string()))?;

    let flow = ReservationFlow::new(
        state.events.clone(),
        state.bookings.clone(),
        state.usage.clone(),
        state.business_rules.clone(),
    );
    let request = ReservationRequest {
        organizer_id: req.organizer_id,
        date: req.date,
        time,
        guests: req.guests,
    };
    let outcome = flow.reserve(Some(&session), &request, Utc::now()).await?;

    Ok(Json(outcome_response(outcome)))
}
