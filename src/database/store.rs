use uuid::Uuid;

use crate::{
    app::AppError,
    database::models::{Blog, BlogChanges, BlogFilter, Comment, LikeState, NewBlog, NewUser, User, Window},
};

/// Persistence of users and blog aggregates.
///
/// Methods are blocking; callers on the async side go through `AppState::run`.
/// Lookups return `Ok(None)` for a missing record so the services decide
/// which error the caller sees.
pub trait Store: Send + Sync {
    /// Fails with `Validation` if the email is already taken.
    fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Newest first
    fn list_users(&self) -> Result<Vec<User>, AppError>;

    fn insert_blog(&self, blog: NewBlog) -> Result<Blog, AppError>;
    fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, AppError>;
    /// Newest first, ties broken by descending id. `None` returns every match.
    fn find_blogs(&self, filter: &BlogFilter, window: Option<Window>) -> Result<Vec<Blog>, AppError>;
    fn count_blogs(&self, filter: &BlogFilter) -> Result<i64, AppError>;
    fn update_blog(&self, id: Uuid, changes: BlogChanges) -> Result<Option<Blog>, AppError>;
    /// Removes the blog with its likes and comments; `false` if it did not exist.
    fn delete_blog(&self, id: Uuid) -> Result<bool, AppError>;
    /// Adds the like if absent, removes it otherwise. `None` if the blog does not exist.
    fn toggle_like(&self, blog_id: Uuid, user_id: Uuid) -> Result<Option<LikeState>, AppError>;
    /// Appends to the blog named by `comment.blog_id`. `None` if it does not exist.
    fn push_comment(&self, comment: Comment) -> Result<Option<Comment>, AppError>;
}

/// Behaviour every [`Store`] must show, run against each implementation.
///
/// Each check works on its own users and category, so it also holds on a
/// shared database that already has data in it.
#[cfg(test)]
pub mod contract {
    use super::*;

    fn author(store: &dyn Store) -> User {
        let email = format!("{}@blog.dev", Uuid::new_v4());
        store
            .insert_user(NewUser::new("Tester", &email, String::from("$argon2id$stub"), false))
            .unwrap()
    }

    fn blog(store: &dyn Store, author: &User, category: &str, title: &str) -> Blog {
        store
            .insert_blog(NewBlog::new(
                author.id,
                title.to_string(),
                String::from("<p>x</p>"),
                category.to_string(),
                String::new(),
            ))
            .unwrap()
    }

    fn in_category(category: &str) -> BlogFilter {
        BlogFilter {
            category: Some(category.to_string()),
            search: None,
        }
    }

    pub fn duplicate_email_rejected(store: &dyn Store) {
        let existing = author(store);
        let result = store.insert_user(NewUser::new("Other", &existing.email, String::new(), false));

        match result {
            Err(AppError::Validation(message)) => {
                pretty_assertions::assert_eq!(message, "User already exists")
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
        pretty_assertions::assert_eq!(
            store.find_user_by_email(&existing.email).unwrap().unwrap().id,
            existing.id
        );
    }

    pub fn aggregate_is_reassembled(store: &dyn Store) {
        let writer = author(store);
        let reader = author(store);
        let created = blog(store, &writer, &Uuid::new_v4().to_string(), "Hi There");

        store.toggle_like(created.id, reader.id).unwrap().unwrap();
        let first = store
            .push_comment(Comment::new(created.id, reader.id, String::from("first")))
            .unwrap()
            .unwrap();
        let second = store
            .push_comment(Comment::new(created.id, writer.id, String::from("second")))
            .unwrap()
            .unwrap();

        let fetched = store.find_blog(created.id).unwrap().unwrap();
        pretty_assertions::assert_eq!(fetched.author.id, writer.id);
        pretty_assertions::assert_eq!(fetched.author.email, writer.email);
        pretty_assertions::assert_eq!(fetched.likes, vec![reader.id]);
        let comment_ids: Vec<Uuid> = fetched.comments.iter().map(|comment| comment.id).collect();
        pretty_assertions::assert_eq!(comment_ids, vec![first.id, second.id]);
        pretty_assertions::assert_eq!(fetched.comments[0].user_id, reader.id);
        pretty_assertions::assert_eq!(fetched.comments[1].body, "second");
        assert!(store.find_blog(Uuid::new_v4()).unwrap().is_none());
    }

    pub fn toggle_like_alternates(store: &dyn Store) {
        let writer = author(store);
        let created = blog(store, &writer, &Uuid::new_v4().to_string(), "Hello");

        let first = store.toggle_like(created.id, writer.id).unwrap().unwrap();
        let second = store.toggle_like(created.id, writer.id).unwrap().unwrap();

        pretty_assertions::assert_eq!(first, LikeState { liked: true, like_count: 1 });
        pretty_assertions::assert_eq!(second, LikeState { liked: false, like_count: 0 });
        assert!(store.find_blog(created.id).unwrap().unwrap().likes.is_empty());
        assert!(store.toggle_like(Uuid::new_v4(), writer.id).unwrap().is_none());
    }

    pub fn concurrent_likes_all_land(store: &dyn Store) {
        let writer = author(store);
        let created = blog(store, &writer, &Uuid::new_v4().to_string(), "Popular");
        let readers: Vec<User> = (0..8).map(|_| author(store)).collect();

        std::thread::scope(|scope| {
            for reader in &readers {
                scope.spawn(move || store.toggle_like(created.id, reader.id).unwrap().unwrap());
            }
        });

        let fetched = store.find_blog(created.id).unwrap().unwrap();
        pretty_assertions::assert_eq!(fetched.likes.len(), readers.len());
        assert!(readers.iter().all(|reader| fetched.is_liked_by(reader.id)));
    }

    pub fn window_pages_newest_first(store: &dyn Store) {
        let writer = author(store);
        let category = Uuid::new_v4().to_string();
        for i in 0..7 {
            blog(store, &writer, &category, &format!("Post {i}"));
        }

        let filter = in_category(&category);
        let all = store.find_blogs(&filter, None).unwrap();
        let second = store
            .find_blogs(&filter, Some(Window { offset: 5, limit: 5 }))
            .unwrap();

        pretty_assertions::assert_eq!(store.count_blogs(&filter).unwrap(), 7);
        pretty_assertions::assert_eq!(all.len(), 7);
        pretty_assertions::assert_eq!(second.len(), 2);
        pretty_assertions::assert_eq!(second[0].id, all[5].id);
        assert!(all.windows(2).all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    pub fn search_is_literal_and_case_insensitive(store: &dyn Store) {
        let writer = author(store);
        let category = Uuid::new_v4().to_string();
        blog(store, &writer, &category, "All about FOOd");
        blog(store, &writer, &category, "100% pure");
        blog(store, &writer, &category, "Bars near me");

        let search = |term: &str| {
            let filter = BlogFilter {
                category: Some(category.clone()),
                search: Some(term.to_string()),
            };
            let titles: Vec<String> = store
                .find_blogs(&filter, None)
                .unwrap()
                .into_iter()
                .map(|blog| blog.title)
                .collect();
            pretty_assertions::assert_eq!(store.count_blogs(&filter).unwrap(), titles.len() as i64);
            titles
        };

        pretty_assertions::assert_eq!(search("foo"), vec![String::from("All about FOOd")]);
        pretty_assertions::assert_eq!(search("0%"), vec![String::from("100% pure")]);
        assert!(search("_").is_empty());
        assert!(search("a%d").is_empty());
    }

    pub fn update_applies_changes(store: &dyn Store) {
        let writer = author(store);
        let created = blog(store, &writer, &Uuid::new_v4().to_string(), "Original");

        let updated = store
            .update_blog(
                created.id,
                BlogChanges {
                    title: Some(String::from("Edited")),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        pretty_assertions::assert_eq!(updated.title, "Edited");
        pretty_assertions::assert_eq!(updated.content, created.content);
        pretty_assertions::assert_eq!(updated.category, created.category);
        pretty_assertions::assert_eq!(updated.author.id, writer.id);
        assert!(updated.updated_at >= created.updated_at);
        pretty_assertions::assert_eq!(store.find_blog(created.id).unwrap().unwrap().title, "Edited");
        assert!(store
            .update_blog(Uuid::new_v4(), BlogChanges::default())
            .unwrap()
            .is_none());
    }

    pub fn delete_drops_aggregate(store: &dyn Store) {
        let writer = author(store);
        let created = blog(store, &writer, &Uuid::new_v4().to_string(), "Hello");
        store.toggle_like(created.id, writer.id).unwrap().unwrap();
        store
            .push_comment(Comment::new(created.id, writer.id, String::from("first")))
            .unwrap()
            .unwrap();

        assert!(store.delete_blog(created.id).unwrap());
        assert!(!store.delete_blog(created.id).unwrap());
        assert!(store.find_blog(created.id).unwrap().is_none());
        assert!(store.toggle_like(created.id, writer.id).unwrap().is_none());
        assert!(store
            .push_comment(Comment::new(created.id, writer.id, String::from("late")))
            .unwrap()
            .is_none());
    }
}
