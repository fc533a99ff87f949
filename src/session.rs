//! The "who is logged in" pointer.
//!
//! A [`Session`] is read from its [`ConfigStore`] once at start-up and then
//! passed explicitly to whatever needs it. Changing the current user updates
//! the in-memory copy and rewrites the backing store.

use crate::config::{Config, ConfigError, ConfigStore};
use crate::error::CommandError;
use crate::storage::{Database, User};

pub struct Session {
    store: Box<dyn ConfigStore>,
    config: Config,
}

impl Session {
    /// Read the configuration from `store`.
    pub fn load(store: impl ConfigStore + 'static) -> Result<Self, ConfigError> {
        let config = store.read()?;
        Ok(Self {
            store: Box::new(store),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_user_name(&self) -> Option<&str> {
        self.config.current_user()
    }

    /// Persist `name` as the current user.
    ///
    /// The whole configuration is rewritten. On failure the in-memory value
    /// is left unchanged.
    pub fn set_current_user(&mut self, name: &str) -> Result<(), ConfigError> {
        let mut updated = self.config.clone();
        updated.current_user_name = Some(name.to_string());
        self.store.write(&updated)?;
        self.config = updated;
        tracing::debug!(user = %name, "Current user set");
        Ok(())
    }

    /// Resolve the current user against `db`.
    ///
    /// # Errors
    ///
    /// [`CommandError::Unauthenticated`] if no user is configured or the
    /// configured name has no matching row.
    pub async fn resolve_user(&self, db: &Database) -> Result<User, CommandError> {
        let Some(name) = self.current_user_name() else {
            return Err(CommandError::Unauthenticated(None));
        };

        match db.get_user_by_name(name).await? {
            Some(user) => Ok(user),
            None => {
                tracing::debug!(user = %name, "Configured user no longer exists");
                Err(CommandError::Unauthenticated(Some(name.to_string())))
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
