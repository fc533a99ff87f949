//! gator: a command-line RSS feed aggregator.
//!
//! Users register and log in, add feeds (which they automatically follow),
//! follow and unfollow other users' feeds, and fetch a feed on demand.
//! State lives in a SQLite database; the logged-in user is remembered in
//! `~/.gatorconfig.json`.

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod feed;
pub mod service;
pub mod session;
pub mod storage;
pub mod util;

pub use app::App;
pub use error::CommandError;
