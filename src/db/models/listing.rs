use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::profile::ProfileId;

pub const STATUS_APPROVED: &str = "approved";

/// Base listing table model
///
/// Only the fields a leaderboard row displays are selected; the rest of the listing lives with
/// the classifieds side of the application.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub profile_id: ProfileId,
    pub status: String,
    pub photos: Vec<String>,
    pub location: String,
    pub video: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Listing {
    pub fn is_approved(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_APPROVED)
    }
}
