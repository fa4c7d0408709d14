use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String, // Provider's ID (e.g., pi_123)
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub client_secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of presenting the provider's embedded payment sheet.
///
/// A user-dismissed sheet is a distinct outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    Completed,
    Canceled,
    Failed(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent with the provider
    async fn create_intent(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>>;

    /// Retrieve intent status
    async fn get_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>>;

    /// Drive the embedded payment sheet for an intent
    async fn present_sheet(
        &self,
        client_secret: &str,
        merchant_display_name: &str,
    ) -> Result<SheetOutcome, Box<dyn std::error::Error + Send + Sync>>;
}
