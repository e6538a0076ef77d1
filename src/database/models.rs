pub mod blog;
pub mod comment;
pub mod like;
pub mod user;

pub use blog::{Blog, BlogChanges, BlogFilter, BlogPage, BlogRow, NewBlog, Window};
pub use comment::Comment;
pub use like::{Like, LikeState};
pub use user::{AuthorSummary, NewUser, User};
