pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::{AdminCaller, Caller};
