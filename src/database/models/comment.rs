use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::comments;

/// A comment embedded in its blog; it is never edited or deleted on its own.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub blog_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "text")]
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(blog_id: Uuid, user_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            blog_id,
            user_id,
            body,
            created_at: Utc::now(),
        }
    }
}
