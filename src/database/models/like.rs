use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::likes;

/// One user's like on one blog; the `(blog_id, user_id)` key keeps it unique.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Like {
    pub blog_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(blog_id: Uuid, user_id: Uuid) -> Self {
        Self {
            blog_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}
