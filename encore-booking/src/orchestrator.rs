use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::flow::FlowError;
use encore_core::payment::{PaymentGateway, PaymentIntent, PaymentStatus, SheetOutcome};

/// How this attempt's payment is executed. Chosen by the caller's platform
/// once at flow start and fixed for the life of the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentContext {
    /// Native-style modal sheet driven to a terminal outcome in one call.
    EmbeddedSheet,
    /// Browser-style inline form; confirmation may leave the page and come
    /// back through the payment-return URL.
    Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPhase {
    Idle,
    FetchingIntent,
    AwaitingPaymentMethod,
    Confirming,
    Succeeded,
    Failed,
    Canceled,
}

/// Resolution of one payment execution pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentResolution {
    Succeeded,
    Canceled,
    Failed(String),
    /// Redirect context only: hand the secret back and wait for the return.
    Pending { intent_id: String, client_secret: String },
}

/// Drives one payment attempt from intent fetch to a terminal phase.
pub struct PaymentAttempt {
    gateway: Arc<dyn PaymentGateway>,
    context: PaymentContext,
    phase: PaymentPhase,
    intent: Option<PaymentIntent>,
}

impl PaymentAttempt {
    pub fn new(gateway: Arc<dyn PaymentGateway>, context: PaymentContext) -> Self {
        Self {
            gateway,
            context,
            phase: PaymentPhase::Idle,
            intent: None,
        }
    }

    pub fn phase(&self) -> &PaymentPhase {
        &self.phase
    }

    pub fn intent(&self) -> Option<&PaymentIntent> {
        self.intent.as_ref()
    }

    /// Obtain the provider intent. Any failure, including a response with no
    /// client secret, lands in `Failed` without attempting presentation.
    pub async fn fetch_intent(
        &mut self,
        event_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        amount: f64,
        currency: &str,
    ) -> Result<(), FlowError> {
        self.phase = PaymentPhase::FetchingIntent;

        match self
            .gateway
            .create_intent(event_id, user_id, quantity, amount, currency)
            .await
        {
            Ok(intent) if intent.client_secret.is_some() => {
                self.intent = Some(intent);
                self.phase = PaymentPhase::AwaitingPaymentMethod;
                Ok(())
            }
            Ok(_) => {
                warn!("Payment intent for event {} arrived without a client secret", event_id);
                self.phase = PaymentPhase::Failed;
                Err(FlowError::IntentFetch)
            }
            Err(err) => {
                warn!("Payment intent creation failed for event {}: {}", event_id, err);
                self.phase = PaymentPhase::Failed;
                Err(FlowError::IntentFetch)
            }
        }
    }

    /// Execute the attempt in its context. Requires a fetched intent.
    pub async fn execute(&mut self, merchant_display_name: &str) -> PaymentResolution {
        let Some(intent) = self.intent.clone() else {
            self.phase = PaymentPhase::Failed;
            return PaymentResolution::Failed("no payment intent available".to_string());
        };
        let client_secret = intent.client_secret.clone().unwrap_or_default();

        match self.context {
            PaymentContext::EmbeddedSheet => {
                self.phase = PaymentPhase::Confirming;
                match self.gateway.present_sheet(&client_secret, merchant_display_name).await {
                    Ok(SheetOutcome::Completed) => {
                        self.phase = PaymentPhase::Succeeded;
                        PaymentResolution::Succeeded
                    }
                    Ok(SheetOutcome::Canceled) => {
                        // User dismissal, not an error
                        self.phase = PaymentPhase::Canceled;
                        PaymentResolution::Canceled
                    }
                    Ok(SheetOutcome::Failed(message)) => {
                        self.phase = PaymentPhase::Failed;
                        PaymentResolution::Failed(message)
                    }
                    Err(err) => {
                        self.phase = PaymentPhase::Failed;
                        PaymentResolution::Failed(err.to_string())
                    }
                }
            }
            PaymentContext::Redirect => {
                // The caller renders the inline form against the secret and
                // either confirms synchronously or comes back through the
                // payment-return URL.
                self.phase = PaymentPhase::AwaitingPaymentMethod;
                PaymentResolution::Pending {
                    intent_id: intent.id,
                    client_secret,
                }
            }
        }
    }
}

/// Query parameters carried back by the provider redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectReturn {
    pub payment_success: bool,
    pub payment_intent: String,
}

/// Redirect-return convergence: both parameters must be present and the
/// provider must report the intent as succeeded before any booking is
/// written. This is the same terminal transition as the synchronous path,
/// reached from a second entry point.
pub async fn confirm_redirect_return(
    gateway: &Arc<dyn PaymentGateway>,
    ret: &RedirectReturn,
) -> Result<PaymentIntent, FlowError> {
    if !ret.payment_success || ret.payment_intent.is_empty() {
        return Err(FlowError::PaymentFailed(
            "payment was not completed".to_string(),
        ));
    }

    let intent = gateway
        .get_intent(&ret.payment_intent)
        .await
        .map_err(|err| {
            warn!("Could not verify returned payment intent: {}", err);
            FlowError::PaymentFailed("payment status could not be verified".to_string())
        })?;

    if intent.status != PaymentStatus::Succeeded {
        return Err(FlowError::PaymentFailed(format!(
            "payment is not complete (status {:?})",
            intent.status
        )));
    }

    Ok(intent)
}

/// Deterministic gateway for development and tests. Created intents are
/// held in memory and always confirm; a client secret containing "decline"
/// fails the sheet, one containing "cancel" dismisses it.
#[derive(Default)]
pub struct SandboxGateway {
    intents: std::sync::Mutex<std::collections::HashMap<String, PaymentIntent>>,
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_intent(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        let intent = PaymentIntent {
            id: format!("sandbox_pi_{}", Uuid::new_v4().simple()),
            event_id,
            user_id,
            quantity,
            amount,
            currency: currency.to_string(),
            status: PaymentStatus::RequiresPaymentMethod,
            client_secret: Some(format!("sandbox_secret_{}", Uuid::new_v4().simple())),
            created_at: chrono::Utc::now(),
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
            .ok_or("no such payment intent")?;
        // Anything the sandbox issued confirms on the first look-up
        intent.status = PaymentStatus::Succeeded;
        Ok(intent)
    }

    async fn present_sheet(
        &self,
        client_secret: &str,
        _merchant_display_name: &str,
    ) -> Result<SheetOutcome, Box<dyn std::error::Error + Send + Sync>> {
        if client_secret.contains("decline") {
            return Ok(SheetOutcome::Failed("Your card was declined.".to_string()));
        }
        if client_secret.contains("cancel") {
            return Ok(SheetOutcome::Canceled);
        }
        Ok(SheetOutcome::Completed)
    }
}
