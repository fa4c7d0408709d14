use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use encore_core::booking::{Booking, BookingStatus, BookingWriteError, NewBooking};
use encore_core::repository::BookingRepository;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    quantity: i32,
    price_paid_per_item: f64,
    total_price_paid: f64,
    booking_fee_paid: f64,
    status: String,
    booking_code: String,
    checked_in: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        let status = match row.status.as_str() {
            "CANCELLED" => BookingStatus::Cancelled,
            _ => BookingStatus::Confirmed,
        };
        Booking {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            quantity: row.quantity,
            price_paid_per_item: row.price_paid_per_item,
            total_price_paid: row.total_price_paid,
            booking_fee_paid: row.booking_fee_paid,
            status,
            booking_code: row.booking_code,
            checked_in: row.checked_in,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const INSERT_SQL: &str = r#"
INSERT INTO event_bookings
    (id, event_id, user_id, quantity, price_paid_per_item, total_price_paid,
     booking_fee_paid, status, booking_code, checked_in)
VALUES ($1, $2, $3, $4, $5, $6, $7, 'CONFIRMED', $8, FALSE)
RETURNING id, event_id, user_id, quantity, price_paid_per_item, total_price_paid,
          booking_fee_paid, status, booking_code, checked_in, created_at, updated_at
"#;

const SELECT_COLUMNS: &str = r#"
SELECT id, event_id, user_id, quantity, price_paid_per_item, total_price_paid,
       booking_fee_paid, status, booking_code, checked_in, created_at, updated_at
FROM event_bookings
"#;

fn map_write_error(err: sqlx::Error) -> BookingWriteError {
    if let sqlx::Error::Database(db_err) = &err {
        // unique_user_event_booking constraint
        if db_err.code().as_deref() == Some("23505") {
            return BookingWriteError::Duplicate;
        }
    }
    BookingWriteError::Store(err.to_string())
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_confirmed(&self, new: &NewBooking) -> Result<Booking, BookingWriteError> {
        let row = sqlx::query_as::<_, BookingRow>(INSERT_SQL)
            .bind(Uuid::new_v4())
            .bind(new.event_id)
            .bind(new.user_id)
            .bind(new.quantity)
            .bind(new.price_paid_per_item)
            .bind(new.total_price_paid)
            .bind(new.booking_fee_paid)
            .bind(&new.booking_code)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn insert_confirmed_checked(
        &self,
        new: &NewBooking,
        limit: Option<i64>,
    ) -> Result<Booking, BookingWriteError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BookingWriteError::Store(e.to_string()))?;

        // Serialize confirmations per event: concurrent writers queue on the
        // event row instead of racing the sum below.
        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(new.event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| BookingWriteError::Store(e.to_string()))?;

        let confirmed: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM event_bookings \
             WHERE event_id = $1 AND status = 'CONFIRMED'",
        )
        .bind(new.event_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| BookingWriteError::Store(e.to_string()))?;

        if let Some(limit) = limit {
            let remaining = if limit == 0 { 0 } else { limit - confirmed };
            if i64::from(new.quantity) > remaining {
                return Err(BookingWriteError::CapacityExceeded {
                    remaining: remaining.max(0),
                });
            }
        }

        let row = sqlx::query_as::<_, BookingRow>(INSERT_SQL)
            .bind(Uuid::new_v4())
            .bind(new.event_id)
            .bind(new.user_id)
            .bind(new.quantity)
            .bind(new.price_paid_per_item)
            .bind(new.total_price_paid)
            .bind(new.booking_fee_paid)
            .bind(&new.booking_code)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;

        tx.commit()
            .await
            .map_err(|e| BookingWriteError::Store(e.to_string()))?;

        Ok(row.into())
    }

    async fn confirmed_quantity(
        &self,
        event_id: Uuid,
    ) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM event_bookings \
             WHERE event_id = $1 AND status = 'CONFIRMED'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    async fn bookings_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!("{} WHERE user_id = $1 ORDER BY created_at DESC", SELECT_COLUMNS);
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}
