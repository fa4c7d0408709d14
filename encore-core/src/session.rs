use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated session identity, decoded from a bearer token upstream.
/// Booking flows require one; its absence rejects the attempt before any
/// remote call is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub role: String,
}

impl SessionUser {
    pub fn new(user_id: Uuid, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }
}
