pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod event_repo;
pub mod profile_repo;
pub mod rates;
pub mod usage;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use event_repo::PgEventRepository;
pub use profile_repo::PgProfileRepository;
pub use rates::DbCurrencyConverter;
pub use usage::{EventProducer, KafkaUsageReporter};
