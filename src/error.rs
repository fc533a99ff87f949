use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::FetchError;
use crate::storage::DatabaseError;
use crate::util::UrlValidationError;

/// Every way a command can fail. Errors propagate unchanged to `main`,
/// which prints them as `err: <message>` and exits non-zero.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command not provided")]
    MissingCommand,

    #[error("command {0} not found")]
    UnknownCommand(String),

    #[error("command {command} expects {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },

    /// `None` when nobody has logged in, `Some(name)` when the configured
    /// user no longer exists.
    #[error("{}", unauthenticated_message(.0))]
    Unauthenticated(Option<String>),

    #[error("invalid username {0:?}: a username cannot be blank")]
    InvalidUsername(String),

    #[error("user {0} does not exist")]
    UserNotFound(String),

    #[error("no feed registered for {0}")]
    FeedNotFound(String),

    #[error("user {0} already exists")]
    DuplicateUser(String),

    #[error("a feed is already registered for {0}")]
    DuplicateFeedUrl(String),

    #[error("{user} already follows {url}")]
    AlreadyFollowing { user: String, url: String },

    #[error("cannot add feed {url}: {source}")]
    InvalidFeedUrl {
        url: String,
        #[source]
        source: UrlValidationError,
    },

    #[error(transparent)]
    Storage(#[from] DatabaseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

fn unauthenticated_message(name: &Option<String>) -> String {
    match name {
        None => "not logged in: run `login <username>` first".to_string(),
        Some(name) => format!("current user {name} no longer exists: log in again"),
    }
}
