use std::collections::HashMap;

use futures::future::LocalBoxFuture;

use crate::error::CommandError;
use crate::storage::User;

pub type CommandResult = Result<(), CommandError>;

/// Handler that runs for anyone.
pub type PublicHandler<S> = for<'a> fn(&'a mut S, &'a [String]) -> LocalBoxFuture<'a, CommandResult>;

/// Handler that needs a resolved current user.
pub type AuthenticatedHandler<S> =
    for<'a> fn(&'a mut S, &'a [String], User) -> LocalBoxFuture<'a, CommandResult>;

/// A command implementation, tagged with whether it needs a logged-in user.
///
/// The dispatcher resolves the user for `Authenticated` handlers before
/// calling them; a handler never sees an unauthenticated invocation.
pub enum Handler<S> {
    Public(PublicHandler<S>),
    Authenticated(AuthenticatedHandler<S>),
}

impl<S> Handler<S> {
    pub fn requires_auth(&self) -> bool {
        matches!(self, Handler::Authenticated(_))
    }
}

impl<S> Clone for Handler<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Handler<S> {}

impl<S> std::fmt::Debug for Handler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Public(_) => f.write_str("Handler::Public"),
            Handler::Authenticated(_) => f.write_str("Handler::Authenticated"),
        }
    }
}

/// Command state that can produce the current user.
pub trait Authenticate {
    fn authenticate(&self) -> LocalBoxFuture<'_, Result<User, CommandError>>;
}

/// Name → handler table.
pub struct CommandRegistry<S> {
    handlers: HashMap<String, Handler<S>>,
}

impl<S> Default for CommandRegistry<S> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<S: Authenticate> CommandRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handler` under `name`, replacing (and returning) any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler<S>) -> Option<Handler<S>> {
        self.handlers.insert(name.into(), handler)
    }

    pub fn get(&self, name: &str) -> Option<Handler<S>> {
        self.handlers.get(name).copied()
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler registered under `name`.
    ///
    /// The handler's result is returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`CommandError::UnknownCommand`] if nothing is registered under `name`
    /// - whatever [`Authenticate::authenticate`] returns, for an
    ///   authenticated handler when no user resolves (the handler is not run)
    pub async fn dispatch(&self, state: &mut S, name: &str, args: &[String]) -> CommandResult {
        let handler = self
            .get(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

        tracing::debug!(command = %name, args = args.len(), auth = handler.requires_auth(), "Dispatching");
        match handler {
            Handler::Public(run) => run(state, args).await,
            Handler::Authenticated(run) => {
                let user = state.authenticate().await?;
                run(state, args, user).await
            }
        }
    }
}
