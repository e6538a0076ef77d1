//! Blog operations: validation and the author-or-admin rule sit here,
//! persistence goes through [`Store`].

use log::{debug, info};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app::AppError,
    auth::Caller,
    database::{
        models::{
            blog::DEFAULT_CATEGORY, Blog, BlogChanges, BlogFilter, BlogPage, Comment, LikeState,
            NewBlog, Window,
        },
        store::Store,
    },
};

/// Blogs per page of [`list`].
pub const PAGE_SIZE: i64 = 5;
const MIN_TITLE_LEN: usize = 3;

const NOT_FOUND: &str = "Blog not found";

/// Body of create and update requests; every field is optional on the wire.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BlogDraft {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Query string of the public listing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    /// Missing, unparsable or non-positive pages read as the first one.
    fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|page| page.trim().parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    fn filter(&self) -> BlogFilter {
        BlogFilter {
            category: non_blank(self.category.as_deref()),
            search: self
                .search
                .clone()
                .filter(|search| !search.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentDraft {
    pub text: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::NotFound(String::from(NOT_FOUND)))
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.chars().count() < MIN_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Blog title must be at least {MIN_TITLE_LEN} characters"
        )));
    }

    Ok(())
}

fn may_modify(blog: &Blog, caller: &Caller) -> bool {
    blog.author.id == caller.id || caller.is_admin
}

fn find(store: &dyn Store, id: Uuid) -> Result<Blog, AppError> {
    store
        .find_blog(id)?
        .ok_or_else(|| AppError::NotFound(String::from(NOT_FOUND)))
}

pub fn create(store: &dyn Store, caller: &Caller, draft: BlogDraft) -> Result<Blog, AppError> {
    let title = non_blank(draft.title.as_deref())
        .ok_or_else(|| AppError::Validation(String::from("Blog title is required")))?;
    validate_title(&title)?;
    let content = draft
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| AppError::Validation(String::from("Blog content is required")))?;
    let category =
        non_blank(draft.category.as_deref()).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let image = non_blank(draft.image.as_deref()).unwrap_or_default();

    let blog = store.insert_blog(NewBlog::new(caller.id, title, content, category, image))?;
    info!("{} created blog {}", caller.id, blog.id);

    Ok(blog)
}

pub fn list(store: &dyn Store, query: &ListQuery) -> Result<BlogPage, AppError> {
    let filter = query.filter();
    let offset = (query.page() - 1).saturating_mul(PAGE_SIZE);

    let total = store.count_blogs(&filter)?;
    let blogs = store.find_blogs(
        &filter,
        Some(Window {
            offset,
            limit: PAGE_SIZE,
        }),
    )?;

    Ok(BlogPage {
        blogs,
        total_pages: (total + PAGE_SIZE - 1) / PAGE_SIZE,
    })
}

pub fn get_by_id(store: &dyn Store, id: &str) -> Result<Blog, AppError> {
    find(store, parse_id(id)?)
}

pub fn update(store: &dyn Store, id: &str, caller: &Caller, draft: BlogDraft) -> Result<Blog, AppError> {
    let blog = find(store, parse_id(id)?)?;
    if !may_modify(&blog, caller) {
        return Err(AppError::Forbidden(String::from(
            "Unauthorized - not author or admin",
        )));
    }

    let changes = BlogChanges {
        title: non_blank(draft.title.as_deref()),
        content: draft.content.filter(|content| !content.trim().is_empty()),
        category: non_blank(draft.category.as_deref()),
        image: non_blank(draft.image.as_deref()),
    };
    if let Some(title) = &changes.title {
        validate_title(title)?;
    }

    let updated = store
        .update_blog(blog.id, changes)?
        .ok_or_else(|| AppError::NotFound(String::from(NOT_FOUND)))?;
    info!("{} updated blog {}", caller.id, updated.id);

    Ok(updated)
}

pub fn delete(store: &dyn Store, id: &str, caller: &Caller) -> Result<(), AppError> {
    let blog = find(store, parse_id(id)?)?;
    if !may_modify(&blog, caller) {
        return Err(AppError::Forbidden(String::from(
            "Unauthorized - cannot delete blog",
        )));
    }

    if !store.delete_blog(blog.id)? {
        return Err(AppError::NotFound(String::from(NOT_FOUND)));
    }
    info!("{} deleted blog {}", caller.id, blog.id);

    Ok(())
}

pub fn toggle_like(store: &dyn Store, id: &str, caller: &Caller) -> Result<LikeState, AppError> {
    let state = store
        .toggle_like(parse_id(id)?, caller.id)?
        .ok_or_else(|| AppError::NotFound(String::from(NOT_FOUND)))?;
    debug!("{} set like on {id} to {}", caller.id, state.liked);

    Ok(state)
}

pub fn add_comment(
    store: &dyn Store,
    id: &str,
    caller: &Caller,
    text: Option<String>,
) -> Result<Comment, AppError> {
    let blog_id = parse_id(id)?;
    let text = text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::Validation(String::from("Comment text is required")))?;

    let comment = store
        .push_comment(Comment::new(blog_id, caller.id, text))?
        .ok_or_else(|| AppError::NotFound(String::from(NOT_FOUND)))?;
    debug!("{} commented on {blog_id}", caller.id);

    Ok(comment)
}

/// Every blog, newest first, for the admin views.
pub fn list_all(store: &dyn Store) -> Result<Vec<Blog>, AppError> {
    store.find_blogs(&BlogFilter::default(), None)
}
