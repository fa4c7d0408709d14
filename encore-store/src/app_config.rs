use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    pub scoring: ScoringConfig,
}

/// Weights for the personalized event scorer.
#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    pub artist_weight: f64,
    pub genre_weight: f64,
    pub song_weight: f64,
    pub bio_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            artist_weight: 5.0,
            genre_weight: 2.0,
            song_weight: 1.0,
            bio_weight: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub booking_fee: f64,
    #[serde(default = "default_pass_fee")]
    pub pass_fee_default: bool,
    pub merchant_display_name: String,
    #[serde(default = "default_reservation_window")]
    pub reservation_window_days: i64,
    #[serde(default = "default_slot_interval")]
    pub slot_interval_minutes: u32,
    /// Settlement currency for organizers operating in several countries.
    pub settlement_currency: String,
}

fn default_pass_fee() -> bool {
    true
}

fn default_reservation_window() -> i64 {
    28
}

fn default_slot_interval() -> u32 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub usage_topic: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of ENCORE)
            // Eg.. `ENCORE_DEBUG=1` would set the `debug` key
            .add_source(config::Environment::with_prefix("ENCORE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
