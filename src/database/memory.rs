use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use super::{
    models::{
        AuthorSummary, Blog, BlogChanges, BlogFilter, BlogRow, Comment, LikeState, NewBlog, NewUser,
        User, Window,
    },
    store::Store,
};
use crate::app::AppError;

struct StoredBlog {
    row: BlogRow,
    likes: Vec<Uuid>,
    comments: Vec<Comment>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    blogs: Vec<StoredBlog>,
}

impl MemoryState {
    fn assemble(&self, blog: &StoredBlog) -> Result<Blog, AppError> {
        let author = self
            .users
            .iter()
            .find(|user| user.id == blog.row.author_id)
            .map(AuthorSummary::from)
            .ok_or_else(|| AppError::Internal(String::from("blog author is missing")))?;

        Ok(Blog::assemble(
            blog.row.clone(),
            author,
            blog.likes.clone(),
            blog.comments.clone(),
        ))
    }

    fn blog_mut(&mut self, id: Uuid) -> Option<&mut StoredBlog> {
        self.blogs.iter_mut().find(|blog| blog.row.id == id)
    }
}

/// Process-local store, used when no database is configured.
///
/// A single lock guards everything, so every operation sees and leaves a
/// consistent aggregate.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::Internal(String::from("memory store lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::Internal(String::from("memory store lock poisoned")))
    }
}

impl Store for MemoryStore {
    fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.write()?;

        if state.users.iter().any(|existing| existing.email == user.email) {
            return Err(AppError::Validation(String::from("User already exists")));
        }

        let user = user.into_user();
        state.users.push(user.clone());
        Ok(user)
    }

    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.iter().find(|user| user.id == id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.read()?.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    fn insert_blog(&self, blog: NewBlog) -> Result<Blog, AppError> {
        let mut state = self.write()?;

        let stored = StoredBlog {
            row: blog.into_row(),
            likes: Vec::new(),
            comments: Vec::new(),
        };
        let blog = state.assemble(&stored)?;
        state.blogs.push(stored);

        Ok(blog)
    }

    fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, AppError> {
        let state = self.read()?;

        state
            .blogs
            .iter()
            .find(|blog| blog.row.id == id)
            .map(|blog| state.assemble(blog))
            .transpose()
    }

    fn find_blogs(&self, filter: &BlogFilter, window: Option<Window>) -> Result<Vec<Blog>, AppError> {
        let state = self.read()?;

        let mut matching: Vec<&StoredBlog> = state
            .blogs
            .iter()
            .filter(|blog| filter.matches(&blog.row))
            .collect();
        matching.sort_by(|a, b| {
            b.row
                .created_at
                .cmp(&a.row.created_at)
                .then(b.row.id.cmp(&a.row.id))
        });

        let (skip, take) = match window {
            Some(window) => (
                usize::try_from(window.offset).unwrap_or(usize::MAX),
                usize::try_from(window.limit).unwrap_or(0),
            ),
            None => (0, usize::MAX),
        };

        matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|blog| state.assemble(blog))
            .collect()
    }

    fn count_blogs(&self, filter: &BlogFilter) -> Result<i64, AppError> {
        let count = self
            .read()?
            .blogs
            .iter()
            .filter(|blog| filter.matches(&blog.row))
            .count();

        Ok(count as i64)
    }

    fn update_blog(&self, id: Uuid, changes: BlogChanges) -> Result<Option<Blog>, AppError> {
        let mut state = self.write()?;

        let Some(blog) = state.blog_mut(id) else {
            return Ok(None);
        };
        changes.apply(&mut blog.row);
        blog.row.updated_at = Utc::now();

        let state = &*state;
        state
            .blogs
            .iter()
            .find(|blog| blog.row.id == id)
            .map(|blog| state.assemble(blog))
            .transpose()
    }

    fn delete_blog(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.write()?;

        let before = state.blogs.len();
        state.blogs.retain(|blog| blog.row.id != id);
        Ok(state.blogs.len() < before)
    }

    fn toggle_like(&self, blog_id: Uuid, user_id: Uuid) -> Result<Option<LikeState>, AppError> {
        let mut state = self.write()?;

        let Some(blog) = state.blog_mut(blog_id) else {
            return Ok(None);
        };

        let liked = match blog.likes.iter().position(|id| *id == user_id) {
            Some(index) => {
                blog.likes.remove(index);
                false
            }
            None => {
                blog.likes.push(user_id);
                true
            }
        };
        blog.row.updated_at = Utc::now();

        Ok(Some(LikeState {
            liked,
            like_count: blog.likes.len() as i64,
        }))
    }

    fn push_comment(&self, comment: Comment) -> Result<Option<Comment>, AppError> {
        let mut state = self.write()?;

        let Some(blog) = state.blog_mut(comment.blog_id) else {
            return Ok(None);
        };
        blog.comments.push(comment.clone());
        blog.row.updated_at = Utc::now();

        Ok(Some(comment))
    }
}
