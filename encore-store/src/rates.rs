use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use encore_core::currency::CurrencyConverter;

/// Conversion via the server-side `convert_currency` function, which owns
/// the rate table. Failures degrade to `None`; callers keep the unconverted
/// amount rather than blocking the flow.
pub struct DbCurrencyConverter {
    pool: PgPool,
}

impl DbCurrencyConverter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CurrencyConverter for DbCurrencyConverter {
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        if from.eq_ignore_ascii_case(to) {
            return Some(amount);
        }

        let result = sqlx::query_scalar::<_, f64>("SELECT convert_currency($1, $2, $3)")
            .bind(amount)
            .bind(from.to_uppercase())
            .bind(to.to_uppercase())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(converted) => Some(converted),
            Err(err) => {
                warn!("Currency conversion {} -> {} failed: {}", from, to, err);
                None
            }
        }
    }
}
