use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ProfileId(pub String);

/// Base profile table model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: ProfileId,
    pub username: String,
    pub age: Option<i32>,
    pub verified: bool,
    /// Subscription tier; `0` is the free tier.
    pub subscription_rank: i32,
    pub created_at: NaiveDateTime,
}

impl From<String> for ProfileId {
    fn from(value: String) -> Self {
        ProfileId(value)
    }
}

impl From<&str> for ProfileId {
    fn from(value: &str) -> Self {
        ProfileId(value.to_string())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
