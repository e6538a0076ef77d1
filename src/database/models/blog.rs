use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use super::{comment::Comment, user::AuthorSummary};
use crate::schema::blogs;

pub const DEFAULT_CATEGORY: &str = "General";

/// A `blogs` row, without likes and comments.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = blogs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlogRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub category: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blogs)]
pub struct NewBlog {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub category: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewBlog {
    pub fn new(author_id: Uuid, title: String, content: String, category: String, image: String) -> Self {
        let time = Utc::now();

        Self {
            id: Uuid::new_v4(),
            title,
            content,
            author_id,
            category,
            image,
            created_at: time,
            updated_at: time,
        }
    }

    pub fn into_row(self) -> BlogRow {
        BlogRow {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            category: self.category,
            image: self.image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Fields an edit may replace; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = blogs)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl BlogChanges {
    pub fn apply(self, row: &mut BlogRow) {
        if let Some(title) = self.title {
            row.title = title;
        }
        if let Some(content) = self.content {
            row.content = content;
        }
        if let Some(category) = self.category {
            row.category = category;
        }
        if let Some(image) = self.image {
            row.image = image;
        }
    }
}

/// The blog aggregate as clients see it: author joined, likes and comments embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: AuthorSummary,
    pub category: String,
    pub image: String,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    pub fn assemble(row: BlogRow, author: AuthorSummary, likes: Vec<Uuid>, comments: Vec<Comment>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            author,
            category: row.category,
            image: row.image,
            likes,
            comments,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }
}

/// Filters shared by the paginated and the admin listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogFilter {
    /// Exact match
    pub category: Option<String>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

impl BlogFilter {
    pub fn matches(&self, row: &BlogRow) -> bool {
        let category_ok = self
            .category
            .as_ref()
            .map_or(true, |category| &row.category == category);
        let search_ok = self.search.as_ref().map_or(true, |term| {
            row.title.to_lowercase().contains(&term.to_lowercase())
        });

        category_ok && search_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPage {
    pub blogs: Vec<Blog>,
    pub total_pages: i64,
}
