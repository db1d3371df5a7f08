use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A client a user writes posts for. `client_id` also keys the in-memory
/// generation history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub name: String,
    pub industry: Option<String>,
    pub created_at: DateTime<Utc>,
}
