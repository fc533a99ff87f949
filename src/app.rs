use std::io::Write;
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::command::{self, Authenticate};
use crate::error::CommandError;
use crate::feed::HttpFeedFetcher;
use crate::service::FeedFollowService;
use crate::session::Session;
use crate::storage::{Database, User};

/// State handed to every command handler: the service plus where output goes.
pub struct App {
    pub service: FeedFollowService,
    out: Box<dyn Write>,
}

impl App {
    /// Commands print to stdout.
    pub fn new(service: FeedFollowService) -> Self {
        Self::with_output(service, std::io::stdout())
    }

    pub fn with_output(service: FeedFollowService, out: impl Write + 'static) -> Self {
        Self {
            service,
            out: Box::new(out),
        }
    }

    pub fn out(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }
}

impl Authenticate for App {
    fn authenticate(&self) -> LocalBoxFuture<'_, Result<User, CommandError>> {
        self.service.current_user().boxed_local()
    }
}

/// Run one command line against the database named by `session`'s config.
///
/// The command name is checked before the database is opened, so a bare
/// `gator` never creates a database file.
///
/// # Errors
///
/// - [`CommandError::MissingCommand`] if `command` is `None`
/// - [`CommandError::Storage`] if the database cannot be opened
/// - whatever the dispatched command returns
pub async fn run(
    session: Session,
    command: Option<&str>,
    args: &[String],
    out: impl Write + 'static,
) -> Result<(), CommandError> {
    let name = command.ok_or(CommandError::MissingCommand)?;

    let db_url = session.config().database_url()?;
    let db = Database::open(&db_url).await?;
    let fetcher = HttpFeedFetcher::new()?;

    let service = FeedFollowService::new(db, session, Arc::new(fetcher));
    let mut app = App::with_output(service, out);
    command::registry().dispatch(&mut app, name, args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, MemoryConfigStore};
    use crate::storage::DatabaseError;

    fn session(db_url: &str) -> Session {
        Session::load(MemoryConfigStore::new(Config {
            db_url: db_url.to_string(),
            current_user_name: None,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_without_command() {
        let err = run(session("sqlite::memory:"), None, &[], std::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::MissingCommand));
        assert_eq!(err.to_string(), "command not provided");
    }

    #[tokio::test]
    async fn test_missing_command_checked_before_database() {
        // The URL would be rejected if the database were opened first
        let err = run(session("postgres://localhost/gator"), None, &[], std::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::MissingCommand));
    }

    #[tokio::test]
    async fn test_run_unknown_command() {
        let err = run(session("sqlite::memory:"), Some("frobnicate"), &[], std::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::UnknownCommand(ref n) if n == "frobnicate"));
    }

    #[tokio::test]
    async fn test_run_rejects_unsupported_database() {
        let err = run(session("postgres://localhost/gator"), Some("users"), &[], std::io::sink())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Storage(DatabaseError::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_run_dispatches_command() {
        let args = vec!["alice".to_string()];
        run(session("sqlite::memory:"), Some("register"), &args, std::io::sink())
            .await
            .unwrap();
    }
}
