use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{generate_booking_code, BookingOutcome, BookingRequest};
use crate::orchestrator::{
    confirm_redirect_return, PaymentAttempt, PaymentResolution, RedirectReturn,
};
use encore_catalog::availability::{check_request, AvailabilityError};
use encore_catalog::event::{BookingKind, Event, EventRepository};
use encore_catalog::pricing::{FeePolicy, PriceBreakdown};
use encore_core::booking::{BookingWriteError, NewBooking};
use encore_core::currency::currency_for_country;
use encore_core::payment::PaymentGateway;
use encore_core::repository::{BookingRepository, UsageReporter};
use encore_core::session::SessionUser;
use encore_shared::models::usage::BookingUsageEvent;
use encore_store::app_config::BusinessRules;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("authentication required")]
    AuthenticationRequired,

    /// A second invocation while one attempt is in flight. A no-op, not a
    /// queued retry.
    #[error("another booking attempt is already in progress")]
    AttemptInFlight,

    #[error("this event does not take bookings")]
    NotBookable,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("event not found")]
    EventNotFound,

    #[error(transparent)]
    Capacity(#[from] AvailabilityError),

    #[error("could not check event availability, please try again")]
    AvailabilityCheck(String),

    #[error("could not initiate payment")]
    IntentFetch,

    #[error("payment failed: {0}")]
    PaymentFailed(String),

    #[error("you already have a booking for this event")]
    DuplicateBooking,

    /// The most severe case: money may have moved, the booking row does not
    /// exist. Never retried automatically.
    #[error("payment may already have been taken but the booking for event {event_id} could not be recorded; please contact support")]
    PostPaymentWrite { event_id: Uuid, detail: String },

    #[error("booking failed: {0}")]
    Internal(String),
}

/// Top-level controller for one booking attempt. Branches on free vs paid,
/// runs the availability check, delegates payment, writes the booking and
/// fires the usage report.
pub struct BookingFlow {
    events: Arc<dyn EventRepository>,
    bookings: Arc<dyn BookingRepository>,
    gateway: Arc<dyn PaymentGateway>,
    usage: Arc<dyn UsageReporter>,
    rules: BusinessRules,
    in_flight: AtomicBool,
}

impl BookingFlow {
    pub fn new(
        events: Arc<dyn EventRepository>,
        bookings: Arc<dyn BookingRepository>,
        gateway: Arc<dyn PaymentGateway>,
        usage: Arc<dyn UsageReporter>,
        rules: BusinessRules,
    ) -> Self {
        Self {
            events,
            bookings,
            gateway,
            usage,
            rules,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Entry point for one attempt. Requires an authenticated session and
    /// refuses re-entry while an attempt is in flight.
    pub async fn confirm(
        &self,
        session: Option<&SessionUser>,
        request: &BookingRequest,
    ) -> Result<BookingOutcome, FlowError> {
        let Some(session) = session else {
            return Err(FlowError::AuthenticationRequired);
        };
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(FlowError::AttemptInFlight);
        }

        let result = self.run(session, request).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run(
        &self,
        session: &SessionUser,
        request: &BookingRequest,
    ) -> Result<BookingOutcome, FlowError> {
        if request.quantity < 1 {
            return Err(FlowError::InvalidQuantity);
        }

        // 1. Load the event
        let event = self
            .events
            .event_by_id(request.event_id)
            .await
            .map_err(|e| FlowError::Internal(e.to_string()))?
            .ok_or(FlowError::EventNotFound)?;

        if !event.is_bookable() {
            return Err(FlowError::NotBookable);
        }

        // 2. Price the request and branch
        let policy = FeePolicy {
            booking_fee: self.rules.booking_fee,
        };
        let breakdown = policy.breakdown(event.ticket_price, event.pass_fee_to_user, request.quantity);
        let is_paid = event.booking_kind == BookingKind::Ticketed && breakdown.is_paid();

        info!(
            "Booking attempt: event {} user {} qty {} ({})",
            event.id,
            session.user_id,
            request.quantity,
            if is_paid { "paid" } else { "free" }
        );

        if is_paid {
            self.paid_booking(session, request, &event, &breakdown).await
        } else {
            self.free_booking(session, request, &event, &breakdown).await
        }
    }

    async fn free_booking(
        &self,
        session: &SessionUser,
        request: &BookingRequest,
        event: &Event,
        breakdown: &PriceBreakdown,
    ) -> Result<BookingOutcome, FlowError> {
        let limit = event.capacity_limit();

        // Fresh read immediately before the write
        let confirmed = self
            .bookings
            .confirmed_quantity(event.id)
            .await
            .map_err(|e| FlowError::AvailabilityCheck(e.to_string()))?;
        check_request(limit, confirmed, i64::from(request.quantity))?;

        let new = NewBooking {
            event_id: event.id,
            user_id: session.user_id,
            quantity: request.quantity,
            price_paid_per_item: breakdown.price_per_item.unwrap_or(0.0),
            total_price_paid: breakdown.total.unwrap_or(0.0),
            booking_fee_paid: breakdown.fee_total,
            booking_code: generate_booking_code(),
        };

        // The store re-checks the limit inside its transaction, so racing
        // confirmations cannot push the table past the limit
        let booking = self
            .bookings
            .insert_confirmed_checked(&new, limit)
            .await
            .map_err(|err| match err {
                BookingWriteError::Duplicate => FlowError::DuplicateBooking,
                BookingWriteError::CapacityExceeded { remaining } => {
                    if limit == Some(0) {
                        FlowError::Capacity(AvailabilityError::Closed)
                    } else {
                        FlowError::Capacity(AvailabilityError::Insufficient { remaining })
                    }
                }
                BookingWriteError::Store(detail) => FlowError::Internal(detail),
            })?;

        self.report_usage(event, booking.id, booking.quantity);

        Ok(BookingOutcome::Confirmed {
            booking,
            event_title: event.title.clone(),
            quantity: request.quantity,
        })
    }

    async fn paid_booking(
        &self,
        session: &SessionUser,
        request: &BookingRequest,
        event: &Event,
        breakdown: &PriceBreakdown,
    ) -> Result<BookingOutcome, FlowError> {
        // 1. Availability check before any money moves
        let confirmed = self
            .bookings
            .confirmed_quantity(event.id)
            .await
            .map_err(|e| FlowError::AvailabilityCheck(e.to_string()))?;
        check_request(event.capacity_limit(), confirmed, i64::from(request.quantity))?;

        // 2. Obtain the payment intent
        let total = breakdown.total.unwrap_or(0.0);
        let currency = event
            .country
            .as_deref()
            .map(currency_for_country)
            .unwrap_or("USD");
        let mut attempt = PaymentAttempt::new(self.gateway.clone(), request.context);
        attempt
            .fetch_intent(event.id, session.user_id, request.quantity, total, currency)
            .await?;

        // 3. Execute in the platform's context
        match attempt.execute(&self.rules.merchant_display_name).await {
            PaymentResolution::Pending {
                intent_id,
                client_secret,
            } => Ok(BookingOutcome::PaymentPending {
                intent_id,
                client_secret,
            }),
            PaymentResolution::Canceled => Ok(BookingOutcome::Canceled),
            PaymentResolution::Failed(message) => Err(FlowError::PaymentFailed(message)),
            PaymentResolution::Succeeded => {
                // 4. Money has moved; write the booking
                self.finalize_paid(session.user_id, event, request.quantity, breakdown)
                    .await
            }
        }
    }

    /// Booking write after a successful payment. Shared terminal step for
    /// the embedded sheet path and the redirect-return path. No capacity
    /// re-validation happens here; a sold-out race surfaces only through
    /// the table's uniqueness conflict handling.
    async fn finalize_paid(
        &self,
        user_id: Uuid,
        event: &Event,
        quantity: i32,
        breakdown: &PriceBreakdown,
    ) -> Result<BookingOutcome, FlowError> {
        let new = NewBooking {
            event_id: event.id,
            user_id,
            quantity,
            price_paid_per_item: breakdown.price_per_item.unwrap_or(0.0),
            total_price_paid: breakdown.total.unwrap_or(0.0),
            booking_fee_paid: breakdown.fee_total,
            booking_code: generate_booking_code(),
        };

        match self.bookings.insert_confirmed(&new).await {
            Ok(booking) => {
                self.report_usage(event, booking.id, booking.quantity);
                Ok(BookingOutcome::Confirmed {
                    booking,
                    event_title: event.title.clone(),
                    quantity,
                })
            }
            Err(BookingWriteError::Duplicate) => Err(FlowError::DuplicateBooking),
            Err(err) => Err(FlowError::PostPaymentWrite {
                event_id: event.id,
                detail: err.to_string(),
            }),
        }
    }

    /// Finalize an attempt that came back through the provider redirect.
    /// Verifies the returned parameters against the provider before writing
    /// anything; converges on the same write as the synchronous path.
    pub async fn finalize_redirect_return(
        &self,
        session: Option<&SessionUser>,
        ret: &RedirectReturn,
    ) -> Result<BookingOutcome, FlowError> {
        let Some(session) = session else {
            return Err(FlowError::AuthenticationRequired);
        };

        let intent = confirm_redirect_return(&self.gateway, ret).await?;
        if intent.user_id != session.user_id {
            return Err(FlowError::PaymentFailed(
                "payment could not be matched to this session".to_string(),
            ));
        }

        let event = self
            .events
            .event_by_id(intent.event_id)
            .await
            .map_err(|e| FlowError::Internal(e.to_string()))?
            .ok_or(FlowError::EventNotFound)?;

        let policy = FeePolicy {
            booking_fee: self.rules.booking_fee,
        };
        let breakdown = policy.breakdown(event.ticket_price, event.pass_fee_to_user, intent.quantity);

        self.finalize_paid(session.user_id, &event, intent.quantity, &breakdown)
            .await
    }

    /// Best-effort metering; failure is logged and never reaches the flow's
    /// error channel.
    fn report_usage(&self, event: &Event, booking_id: Uuid, quantity: i32) {
        let reporter = self.usage.clone();
        let payload = BookingUsageEvent {
            event_id: event.id,
            organizer_id: Some(event.organizer_id),
            booking_id,
            quantity,
            timestamp: Utc::now().timestamp(),
        };
        tokio::spawn(async move {
            if let Err(err) = reporter.report_booking_usage(payload).await {
                warn!("Booking usage report failed: {}", err);
            }
        });
    }
}
