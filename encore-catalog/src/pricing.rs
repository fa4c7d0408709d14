use serde::{Deserialize, Serialize};

/// Per-transaction fee policy. The fee is charged on top of the base price
/// only when the organizer passes it through to the attendee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePolicy {
    pub booking_fee: f64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self { booking_fee: 0.50 }
    }
}

/// Computed charge amounts for one booking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Base price per unit; None when no price applies to the event.
    pub price_per_item: Option<f64>,
    /// Fee per unit; zero when the organizer absorbs it or the event is free.
    pub fee_per_item: f64,
    pub total: Option<f64>,
    pub fee_total: f64,
}

impl PriceBreakdown {
    pub fn is_paid(&self) -> bool {
        matches!(self.total, Some(t) if t > 0.0)
    }
}

impl FeePolicy {
    /// Breakdown for `quantity` units. Free tickets never carry a fee.
    pub fn breakdown(
        &self,
        ticket_price: Option<f64>,
        pass_fee_to_user: bool,
        quantity: i32,
    ) -> PriceBreakdown {
        let qty = f64::from(quantity.max(0));
        match ticket_price {
            None => PriceBreakdown {
                price_per_item: None,
                fee_per_item: 0.0,
                total: None,
                fee_total: 0.0,
            },
            Some(base) if base <= 0.0 => PriceBreakdown {
                price_per_item: Some(0.0),
                fee_per_item: 0.0,
                total: Some(0.0),
                fee_total: 0.0,
            },
            Some(base) => {
                let fee = if pass_fee_to_user { self.booking_fee } else { 0.0 };
                PriceBreakdown {
                    price_per_item: Some(base),
                    fee_per_item: fee,
                    total: Some((base + fee) * qty),
                    fee_total: fee * qty,
                }
            }
        }
    }
}
