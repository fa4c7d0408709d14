use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use sqlx::PgPool;
use uuid::Uuid;

use encore_catalog::event::{
    BookingKind, Event, EventRepository, EventRpcError, OpeningRange, OrganizerSchedule,
};

pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    organizer_id: Uuid,
    title: String,
    description: Option<String>,
    starts_at: DateTime<Utc>,
    location_text: Option<String>,
    country: Option<String>,
    city: Option<String>,
    poster_urls: Option<Vec<String>>,
    tags_genres: Option<Vec<String>>,
    tags_artists: Option<Vec<String>>,
    tags_songs: Option<Vec<String>>,
    booking_kind: String,
    ticket_price: Option<f64>,
    pass_fee_to_user: Option<bool>,
    max_tickets: Option<i32>,
    max_reservations: Option<i32>,
}

#[derive(sqlx::FromRow)]
struct OrganizerRow {
    organizer_id: Uuid,
    venue_name: String,
    venue_image: Option<String>,
    seating_capacity: i32,
    unavailable_dates: Option<Vec<NaiveDate>>,
}

#[derive(sqlx::FromRow)]
struct OpeningHoursRow {
    weekday: i16,
    open_time: NaiveTime,
    close_time: NaiveTime,
}

fn parse_booking_kind(raw: &str) -> BookingKind {
    match raw {
        "TICKETED" => BookingKind::Ticketed,
        "RESERVATION" => BookingKind::Reservation,
        _ => BookingKind::InfoOnly,
    }
}

// Stored as 0 = Monday .. 6 = Sunday
fn weekday_from_index(index: i16) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            organizer_id: row.organizer_id,
            title: row.title,
            description: row.description,
            starts_at: row.starts_at,
            location_text: row.location_text,
            country: row.country,
            city: row.city,
            poster_urls: row.poster_urls.unwrap_or_default(),
            tags_genres: row.tags_genres.unwrap_or_default(),
            tags_artists: row.tags_artists.unwrap_or_default(),
            tags_songs: row.tags_songs.unwrap_or_default(),
            booking_kind: parse_booking_kind(&row.booking_kind),
            ticket_price: row.ticket_price,
            pass_fee_to_user: row.pass_fee_to_user.unwrap_or(true),
            max_tickets: row.max_tickets,
            max_reservations: row.max_reservations,
        }
    }
}

const EVENT_COLUMNS: &str = r#"
SELECT id, organizer_id, title, description, starts_at, location_text, country, city,
       poster_urls, tags_genres, tags_artists, tags_songs, booking_kind, ticket_price,
       pass_fee_to_user, max_tickets, max_reservations
"#;

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn upcoming_events(
        &self,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!(
            "{} FROM events WHERE starts_at > NOW() ORDER BY starts_at ASC",
            EVENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn event_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Event>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!("{} FROM events WHERE id = $1", EVENT_COLUMNS);
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Event::from))
    }

    async fn recommended_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!("{} FROM get_recommended_events_for_user($1)", EVENT_COLUMNS);
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn events_by_user_country(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Event>, Box<dyn std::error::Error + Send + Sync>> {
        let sql = format!("{} FROM get_events_by_user_country($1)", EVENT_COLUMNS);
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn organizer_schedule(
        &self,
        organizer_id: Uuid,
    ) -> Result<Option<OrganizerSchedule>, Box<dyn std::error::Error + Send + Sync>> {
        let organizer = sqlx::query_as::<_, OrganizerRow>(
            "SELECT organizer_id, venue_name, venue_image, seating_capacity, unavailable_dates \
             FROM organizers WHERE organizer_id = $1",
        )
        .bind(organizer_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(organizer) = organizer else {
            return Ok(None);
        };

        let hours = sqlx::query_as::<_, OpeningHoursRow>(
            "SELECT weekday, open_time, close_time FROM organizer_opening_hours \
             WHERE organizer_id = $1 ORDER BY weekday, open_time",
        )
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;

        let weekly_hours = hours
            .into_iter()
            .filter_map(|h| {
                weekday_from_index(h.weekday).map(|weekday| OpeningRange {
                    weekday,
                    open: h.open_time,
                    close: h.close_time,
                })
            })
            .collect();

        Ok(Some(OrganizerSchedule {
            organizer_id: organizer.organizer_id,
            venue_name: organizer.venue_name,
            venue_image: organizer.venue_image,
            seating_capacity: organizer.seating_capacity,
            weekly_hours,
            unavailable_dates: organizer.unavailable_dates.unwrap_or_default(),
        }))
    }

    async fn get_or_create_daily_reservation_event(
        &self,
        organizer_id: Uuid,
        date: NaiveDate,
        capacity: i32,
        name: &str,
        image: Option<&str>,
    ) -> Result<Event, EventRpcError> {
        let sql = format!(
            "{} FROM get_or_create_daily_reservation_event($1, $2, $3, $4, $5)",
            EVENT_COLUMNS
        );
        let result = sqlx::query_as::<_, EventRow>(&sql)
            .bind(organizer_id)
            .bind(date)
            .bind(capacity)
            .bind(name)
            .bind(image)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(err) => {
                if let sqlx::Error::Database(db_err) = &err {
                    // undefined_function: the migration carrying the function
                    // has not been applied on this database
                    if db_err.code().as_deref() == Some("42883") {
                        return Err(EventRpcError::BackendMissing);
                    }
                }
                Err(EventRpcError::Store(err.to_string()))
            }
        }
    }
}
