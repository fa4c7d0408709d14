use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingUsageEvent {
    pub event_id: Uuid,
    pub organizer_id: Option<Uuid>,
    pub booking_id: Uuid,
    pub quantity: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ImpressionUsageEvent {
    pub user_id: Option<Uuid>,
    pub event_ids: Vec<Uuid>,
    pub timestamp: i64,
}
