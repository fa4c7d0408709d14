use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use encore_booking::flow::{BookingFlow, FlowError};
use encore_booking::models::{BookingOutcome, BookingRequest};
use encore_booking::orchestrator::{PaymentContext, RedirectReturn};
use encore_core::booking::Booking;
use encore_core::session::SessionUser;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ConfirmBookingRequest {
    pub event_id: Uuid,
    pub quantity: i32,
    pub context: PaymentContext,
}

/// Two-level post-booking history: tab root plus the bookings list, so back
/// navigation cannot land inside the finished flow.
#[derive(Debug, Serialize)]
pub struct NavigationReset {
    pub reset_to: Vec<String>,
}

fn bookings_navigation() -> NavigationReset {
    NavigationReset {
        reset_to: vec!["home".to_string(), "bookings".to_string()],
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmBookingResponse {
    #[serde(flatten)]
    pub outcome: BookingOutcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationReset>,
}

pub(crate) fn outcome_response(outcome: BookingOutcome) -> ConfirmBookingResponse {
    let (message, navigation) = match &outcome {
        BookingOutcome::Confirmed {
            event_title,
            quantity,
            ..
        } => (
            format!(
                "Your booking for \"{}\" ({} spot(s)) is confirmed!",
                event_title, quantity
            ),
            Some(bookings_navigation()),
        ),
        BookingOutcome::PaymentPending { .. } => (
            "Complete your payment to finish the booking.".to_string(),
            None,
        ),
        BookingOutcome::Canceled => (
            "Payment canceled. You have not been charged.".to_string(),
            None,
        ),
    };

    ConfirmBookingResponse {
        outcome,
        message,
        navigation,
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn booking_flow(state: &AppState) -> BookingFlow {
    BookingFlow::new(
        state.events.clone(),
        state.bookings.clone(),
        state.gateway.clone(),
        state.usage.clone(),
        state.business_rules.clone(),
    )
}

/// POST /v1/bookings
/// Run one booking attempt for the authenticated user
pub async fn confirm_booking(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Json(req): Json<ConfirmBookingRequest>,
) -> Result<Json<ConfirmBookingResponse>, AppError> {
    // 1. Gate duplicate submissions across requests for this (user, event)
    let key = (session.user_id, req.event_id);
    {
        let mut active = state.active_attempts.lock().await;
        if !active.insert(key) {
            return Err(AppError::from(FlowError::AttemptInFlight));
        }
    }

    // 2. Drive the flow; always release the gate afterwards
    let request = BookingRequest {
        event_id: req.event_id,
        quantity: req.quantity,
        context: req.context,
    };
    let result = booking_flow(&state).confirm(Some(&session), &request).await;
    state.active_attempts.lock().await.remove(&key);

    let outcome = result?;
    info!(
        "Booking attempt for event {} by {} resolved: {:?}",
        req.event_id,
        session.user_id,
        std::mem::discriminant(&outcome)
    );
    Ok(Json(outcome_response(outcome)))
}

/// GET /v1/bookings
/// The authenticated user's bookings
pub async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state
        .bookings
        .bookings_for_user(session.user_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(bookings))
}

#[derive(Debug, Deserialize)]
pub struct PaymentReturnQuery {
    pub payment_success: Option<bool>,
    pub payment_intent: Option<String>,
}

const BOOKINGS_PATH: &str = "/v1/bookings";

/// GET /v1/bookings/payment-return
/// Landing point for the provider redirect. When both provider parameters
/// are present the booking is finalized exactly once, then the client is
/// redirected to the bare bookings path so the parameters are gone and a
/// refresh cannot re-trigger creation.
pub async fn payment_return(
    State(state): State<AppState>,
    Extension(session): Extension<SessionUser>,
    Query(query): Query<PaymentReturnQuery>,
) -> Result<Response, AppError> {
    let (Some(payment_success), Some(payment_intent)) =
        (query.payment_success, query.payment_intent)
    else {
        // No provider parameters: nothing to finalize
        return Ok(Redirect::to(BOOKINGS_PATH).into_response());
    };

    let ret = RedirectReturn {
        payment_success,
        payment_intent,
    };
    let outcome = booking_flow(&state)
        .finalize_redirect_return(Some(&session), &ret)
        .await;

    match outcome {
        Ok(_) => Ok(Redirect::to(BOOKINGS_PATH).into_response()),
        // The same stale parameters replayed after a successful write are a
        // duplicate, which still means the booking exists
        Err(FlowError::DuplicateBooking) => Ok(Redirect::to(BOOKINGS_PATH).into_response()),
        Err(err) => Err(err.into()),
    }
}
