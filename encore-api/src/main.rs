use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use encore_api::{app, state::{AppState, AuthConfig}};
use encore_booking::orchestrator::SandboxGateway;
use encore_store::{
    DbClient, DbCurrencyConverter, EventProducer, KafkaUsageReporter, PgBookingRepository,
    PgEventRepository, PgProfileRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = encore_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Encore API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Table-level overrides for the file/env business rules
    let business_rules = match db.fetch_business_rules(config.business_rules.clone()).await {
        Ok(rules) => rules,
        Err(err) => {
            tracing::warn!("Could not load business rules from the database: {}", err);
            config.business_rules.clone()
        }
    };

    // Kafka usage metering
    let producer = EventProducer::new(&config.kafka.brokers)
        .expect("Failed to create Kafka producer");
    let usage = Arc::new(KafkaUsageReporter::new(producer, &config.kafka.usage_topic));

    let state = AppState {
        events: Arc::new(PgEventRepository::new(db.pool.clone())),
        bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
        profiles: Arc::new(PgProfileRepository::new(db.pool.clone())),
        gateway: Arc::new(SandboxGateway::default()),
        usage,
        converter: Arc::new(DbCurrencyConverter::new(db.pool.clone())),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        business_rules,
        scoring: config.scoring.clone(),
        active_attempts: Arc::new(Mutex::new(HashSet::new())),
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
