use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostRow {
    pub post_id: String,
    pub user_id: String,
    pub client_id: Option<String>,
    pub query: String,
    pub content: String,
    pub chosen: bool,
    pub created_at: DateTime<Utc>,
}
