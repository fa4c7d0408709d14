use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use encore_catalog::event::EventRepository;
use encore_core::currency::CurrencyConverter;
use encore_core::payment::PaymentGateway;
use encore_core::repository::{BookingRepository, ProfileRepository, UsageReporter};
use encore_store::app_config::{BusinessRules, ScoringConfig};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub usage: Arc<dyn UsageReporter>,
    pub converter: Arc<dyn CurrencyConverter>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    pub scoring: ScoringConfig,
    /// (user, event) pairs with a booking attempt in flight. A duplicate
    /// submission while one runs is a no-op, not a queued retry.
    pub active_attempts: Arc<Mutex<HashSet<(Uuid, Uuid)>>>,
}
