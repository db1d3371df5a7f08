use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Subscription tier of a user. `Pro` is the only elevated tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Copywriter,
    Normal,
    Pro,
    #[default]
    Beginner,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Copywriter => "copywriter",
            UserType::Normal => "normal",
            UserType::Pro => "pro",
            UserType::Beginner => "beginner",
        }
    }

    /// Parses the stored column value. Unknown values degrade to `Beginner`.
    pub fn from_db(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "copywriter" => UserType::Copywriter,
            "normal" => UserType::Normal,
            "pro" => UserType::Pro,
            _ => UserType::Beginner,
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, UserType::Pro)
    }

    /// How many post variants one request produces for this tier.
    pub fn variant_count(&self) -> usize {
        if self.is_elevated() {
            3
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub user_type: String,
    pub post_count: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn tier(&self) -> UserType {
        UserType::from_db(&self.user_type)
    }
}
