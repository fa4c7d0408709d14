use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay file/env business rules with rows from the `business_rules`
    /// table. Expected value format: {"value": <number/string/bool>}.
    pub async fn fetch_business_rules(
        &self,
        defaults: crate::app_config::BusinessRules,
    ) -> Result<crate::app_config::BusinessRules, sqlx::Error> {
        let rows = sqlx::query("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;

        for row in rows {
            let rule_key: String = row.get("rule_key");
            let rule_value: serde_json::Value = row.get("rule_value");

            if let Some(v) = rule_value.get("value") {
                match rule_key.as_str() {
                    "booking_fee" => {
                        if let Some(f) = v.as_f64() {
                            rules.booking_fee = f;
                        }
                    }
                    "pass_fee_default" => {
                        if let Some(b) = v.as_bool() {
                            rules.pass_fee_default = b;
                        }
                    }
                    "merchant_display_name" => {
                        if let Some(s) = v.as_str() {
                            rules.merchant_display_name = String::from(s);
                        }
                    }
                    "reservation_window_days" => {
                        if let Some(i) = v.as_i64() {
                            rules.reservation_window_days = i;
                        }
                    }
                    "slot_interval_minutes" => {
                        if let Some(u) = v.as_u64() {
                            rules.slot_interval_minutes = u as u32;
                        }
                    }
                    "settlement_currency" => {
                        if let Some(s) = v.as_str() {
                            rules.settlement_currency = String::from(s);
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(rules)
    }
}
