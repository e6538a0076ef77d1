use std::collections::HashMap;

use chrono::Utc;
use diesel::{
    pg::Pg,
    prelude::*,
    r2d2::{ConnectionManager, PooledConnection},
};
use uuid::Uuid;

use super::{
    db_utils::PgPool,
    models::{
        AuthorSummary, Blog, BlogChanges, BlogFilter, BlogRow, Comment, Like, LikeState, NewBlog,
        NewUser, User, Window,
    },
    store::Store,
};
use crate::{
    app::AppError,
    schema::{blogs, comments, likes, users},
};

/// Store backed by PostgreSQL. Blogs, likes and comments live in their own
/// tables and are put back together on every read.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, AppError> {
        Ok(self.pool.get()?)
    }
}

/// Escapes LIKE wildcards so the search term is matched literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');

    escaped
}

fn filtered(filter: &BlogFilter) -> blogs::BoxedQuery<'static, Pg> {
    let mut query = blogs::table.into_boxed();

    if let Some(category) = &filter.category {
        query = query.filter(blogs::category.eq(category.clone()));
    }
    if let Some(term) = &filter.search {
        query = query.filter(blogs::title.ilike(like_pattern(term)));
    }

    query
}

/// Joins authors, likes and comments onto the rows, keeping row order.
fn assemble(conn: &mut PgConnection, rows: Vec<BlogRow>) -> QueryResult<Vec<Blog>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let blog_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let author_ids: Vec<Uuid> = rows.iter().map(|row| row.author_id).collect();

    let authors: HashMap<Uuid, AuthorSummary> = users::table
        .filter(users::id.eq_any(author_ids))
        .select(AuthorSummary::as_select())
        .load(conn)?
        .into_iter()
        .map(|author| (author.id, author))
        .collect();

    let mut blog_likes: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for like in likes::table
        .filter(likes::blog_id.eq_any(blog_ids.clone()))
        .order((likes::created_at.asc(), likes::user_id.asc()))
        .select(Like::as_select())
        .load(conn)?
    {
        blog_likes.entry(like.blog_id).or_default().push(like.user_id);
    }

    let mut blog_comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for comment in comments::table
        .filter(comments::blog_id.eq_any(blog_ids))
        .order((comments::created_at.asc(), comments::id.asc()))
        .select(Comment::as_select())
        .load(conn)?
    {
        blog_comments.entry(comment.blog_id).or_default().push(comment);
    }

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let author = authors.get(&row.author_id)?.clone();
            let likes = blog_likes.remove(&row.id).unwrap_or_default();
            let comments = blog_comments.remove(&row.id).unwrap_or_default();
            Some(Blog::assemble(row, author, likes, comments))
        })
        .collect())
}

fn assemble_one(conn: &mut PgConnection, row: BlogRow) -> Result<Blog, AppError> {
    assemble(conn, vec![row])?
        .pop()
        .ok_or_else(|| AppError::Internal(String::from("blog author is missing")))
}

fn touch(conn: &mut PgConnection, blog_id: Uuid) -> QueryResult<usize> {
    diesel::update(blogs::table.find(blog_id))
        .set(blogs::updated_at.eq(Utc::now()))
        .execute(conn)
}

impl Store for PgStore {
    fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut conn = self.conn()?;

        diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .map_err(|err| match AppError::from(err) {
                AppError::Validation(_) => AppError::Validation(String::from("User already exists")),
                other => other,
            })
    }

    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut conn = self.conn()?;

        Ok(users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let mut conn = self.conn()?;

        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut conn = self.conn()?;

        Ok(users::table
            .order((users::created_at.desc(), users::id.desc()))
            .select(User::as_select())
            .load(&mut conn)?)
    }

    fn insert_blog(&self, blog: NewBlog) -> Result<Blog, AppError> {
        let mut conn = self.conn()?;

        let row = diesel::insert_into(blogs::table)
            .values(&blog)
            .returning(BlogRow::as_returning())
            .get_result(&mut conn)?;

        assemble_one(&mut conn, row)
    }

    fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, AppError> {
        let mut conn = self.conn()?;

        let row = blogs::table
            .find(id)
            .select(BlogRow::as_select())
            .first(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(Some(assemble_one(&mut conn, row)?)),
            None => Ok(None),
        }
    }

    fn find_blogs(&self, filter: &BlogFilter, window: Option<Window>) -> Result<Vec<Blog>, AppError> {
        let mut conn = self.conn()?;

        let mut query = filtered(filter).order((blogs::created_at.desc(), blogs::id.desc()));
        if let Some(window) = window {
            query = query.offset(window.offset).limit(window.limit);
        }
        let rows = query.select(BlogRow::as_select()).load(&mut conn)?;

        Ok(assemble(&mut conn, rows)?)
    }

    fn count_blogs(&self, filter: &BlogFilter) -> Result<i64, AppError> {
        let mut conn = self.conn()?;

        Ok(filtered(filter).count().get_result(&mut conn)?)
    }

    fn update_blog(&self, id: Uuid, changes: BlogChanges) -> Result<Option<Blog>, AppError> {
        let mut conn = self.conn()?;

        let row = diesel::update(blogs::table.find(id))
            .set((&changes, blogs::updated_at.eq(Utc::now())))
            .returning(BlogRow::as_returning())
            .get_result(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(Some(assemble_one(&mut conn, row)?)),
            None => Ok(None),
        }
    }

    fn delete_blog(&self, id: Uuid) -> Result<bool, AppError> {
        let mut conn = self.conn()?;

        // likes and comments go with it through ON DELETE CASCADE
        let deleted = diesel::delete(blogs::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn toggle_like(&self, blog_id: Uuid, user_id: Uuid) -> Result<Option<LikeState>, AppError> {
        let mut conn = self.conn()?;

        let state = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            // row lock serializes concurrent toggles on the same blog
            let exists = blogs::table
                .find(blog_id)
                .select(blogs::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?;
            if exists.is_none() {
                return Ok(None);
            }

            let removed = diesel::delete(likes::table.find((blog_id, user_id))).execute(conn)?;
            if removed == 0 {
                diesel::insert_into(likes::table)
                    .values(&Like::new(blog_id, user_id))
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }
            touch(conn, blog_id)?;

            let like_count = likes::table
                .filter(likes::blog_id.eq(blog_id))
                .count()
                .get_result::<i64>(conn)?;

            Ok(Some(LikeState {
                liked: removed == 0,
                like_count,
            }))
        })?;

        Ok(state)
    }

    fn push_comment(&self, comment: Comment) -> Result<Option<Comment>, AppError> {
        let mut conn = self.conn()?;

        let saved = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            if touch(conn, comment.blog_id)? == 0 {
                return Ok(None);
            }

            diesel::insert_into(comments::table)
                .values(&comment)
                .returning(Comment::as_returning())
                .get_result(conn)
                .map(Some)
        })?;

        Ok(saved)
    }
}
