mod feed_follows;
mod feeds;
mod schema;
mod types;
mod users;

pub use schema::Database;
pub use types::{DatabaseError, Feed, FeedFollowView, FeedWithCreator, User};
