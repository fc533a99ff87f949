//! Command dispatch.
//!
//! A [`CommandRegistry`] maps command names to [`Handler`]s. Handlers are
//! either `Public` or `Authenticated`; for the latter the registry resolves
//! the current user through [`Authenticate`] first and refuses to run the
//! handler when that fails.

mod handlers;
mod registry;

pub use handlers::{registry, AGG_DEFAULT_URL, COMMANDS};
pub use registry::{
    Authenticate, AuthenticatedHandler, CommandRegistry, CommandResult, Handler, PublicHandler,
};
