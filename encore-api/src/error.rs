use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use encore_booking::flow::FlowError;
use encore_booking::reservation::ReservationError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    /// Provider-reported payment failure; the message is shown verbatim.
    PaymentError(String),
    /// A remote collaborator could not be reached; the attempt is over but
    /// nothing irreversible happened.
    UpstreamError(String),
    /// Severe, user-actionable failures (missing backend function, booking
    /// write after payment). The message carries the support reference and
    /// is passed through to the client.
    CriticalError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::PaymentError(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            AppError::UpstreamError(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::CriticalError(msg) => {
                tracing::error!("Critical failure surfaced to user: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        let message = err.to_string();
        match err {
            FlowError::AuthenticationRequired => AppError::AuthenticationError(message),
            FlowError::AttemptInFlight
            | FlowError::Capacity(_)
            | FlowError::DuplicateBooking => AppError::ConflictError(message),
            FlowError::NotBookable | FlowError::InvalidQuantity => {
                AppError::ValidationError(message)
            }
            FlowError::EventNotFound => AppError::NotFoundError(message),
            FlowError::AvailabilityCheck(_) | FlowError::IntentFetch => {
                AppError::UpstreamError(message)
            }
            FlowError::PaymentFailed(_) => AppError::PaymentError(message),
            FlowError::PostPaymentWrite { .. } => AppError::CriticalError(message),
            FlowError::Internal(detail) => AppError::InternalServerError(detail),
        }
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let message = err.to_string();
        match err {
            ReservationError::AuthenticationRequired => AppError::AuthenticationError(message),
            ReservationError::UnknownOrganizer => AppError::NotFoundError(message),
            ReservationError::DateUnavailable
            | ReservationError::SlotUnavailable
            | ReservationError::InvalidPartySize => AppError::ValidationError(message),
            ReservationError::Insufficient { .. } | ReservationError::Duplicate => {
                AppError::ConflictError(message)
            }
            ReservationError::BackendMissing => AppError::CriticalError(message),
            ReservationError::Store(detail) => AppError::InternalServerError(detail),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
