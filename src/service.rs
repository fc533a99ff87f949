//! Users, feeds and follow relationships.
//!
//! [`FeedFollowService`] owns the session, the database handle and the feed
//! fetcher, and exposes one method per user-facing operation. Operations
//! that touch more than one row or store are atomic: `create_feed` writes
//! the feed and the creator's follow in one transaction, and `register`
//! removes the new user again if it cannot be made current.

use std::sync::Arc;

use crate::error::CommandError;
use crate::feed::{FeedFetcher, RssFeed};
use crate::session::Session;
use crate::storage::{Database, DatabaseError, Feed, FeedFollowView, FeedWithCreator, User};
use crate::util::validate_feed_url;

/// A user as shown by `users`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub user: User,
    pub is_current: bool,
}

pub struct FeedFollowService {
    db: Database,
    session: Session,
    fetcher: Arc<dyn FeedFetcher>,
}

impl FeedFollowService {
    pub fn new(db: Database, session: Session, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            db,
            session,
            fetcher,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Resolve the logged-in user.
    pub async fn current_user(&self) -> Result<User, CommandError> {
        self.session.resolve_user(&self.db).await
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Make `username` the current user.
    ///
    /// # Errors
    ///
    /// - [`CommandError::InvalidUsername`] if `username` is blank
    /// - [`CommandError::UserNotFound`] if no such user is registered
    pub async fn login(&mut self, username: &str) -> Result<User, CommandError> {
        check_username(username)?;
        let user = self
            .db
            .get_user_by_name(username)
            .await?
            .ok_or_else(|| CommandError::UserNotFound(username.to_string()))?;

        self.session.set_current_user(&user.name)?;
        tracing::info!(user = %user.name, "Logged in");
        Ok(user)
    }

    /// Create a user and log in as them.
    ///
    /// If the new user cannot be persisted as current, the user row is
    /// deleted again before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`CommandError::InvalidUsername`] if `username` is blank
    /// - [`CommandError::DuplicateUser`] if the name is taken
    pub async fn register(&mut self, username: &str) -> Result<User, CommandError> {
        check_username(username)?;
        let user = self.db.create_user(username).await.map_err(|e| {
            if e.is_unique_violation() {
                CommandError::DuplicateUser(username.to_string())
            } else {
                CommandError::Storage(e)
            }
        })?;
        tracing::info!(user = %user.name, id = %user.id, "User registered");

        if let Err(e) = self.session.set_current_user(&user.name) {
            tracing::warn!(user = %user.name, error = %e, "Login after registration failed, removing user");
            if let Err(cleanup) = self.db.delete_user(user.id).await {
                tracing::warn!(user = %user.name, error = %cleanup, "Failed to remove user after failed login");
            }
            return Err(e.into());
        }

        Ok(user)
    }

    /// Delete every user, and with them every feed and follow.
    ///
    /// Returns the number of users removed. The configured current user is
    /// left as is; it simply stops resolving.
    pub async fn reset_all(&self) -> Result<u64, CommandError> {
        let removed = self.db.delete_all_users().await?;
        tracing::info!(users = removed, "Database reset");
        Ok(removed)
    }

    /// All users, flagging the one currently logged in.
    pub async fn list_users(&self) -> Result<Vec<UserEntry>, CommandError> {
        let current = self.session.current_user_name();
        let users = self.db.get_users().await?;
        Ok(users
            .into_iter()
            .map(|user| UserEntry {
                is_current: current == Some(user.name.as_str()),
                user,
            })
            .collect())
    }

    // ========================================================================
    // Feeds and follows
    // ========================================================================

    /// Register a feed owned by `user`, who follows it immediately.
    ///
    /// # Errors
    ///
    /// - [`CommandError::InvalidFeedUrl`] if `url` is not an http(s) URL
    /// - [`CommandError::DuplicateFeedUrl`] if `url` is already registered
    pub async fn create_feed(
        &self,
        user: &User,
        name: &str,
        url: &str,
    ) -> Result<(Feed, FeedFollowView), CommandError> {
        validate_feed_url(url).map_err(|source| CommandError::InvalidFeedUrl {
            url: url.to_string(),
            source,
        })?;

        let (feed, follow) = self
            .db
            .create_feed_with_follow(user.id, name, url)
            .await
            .map_err(|e| duplicate_or(e, || CommandError::DuplicateFeedUrl(url.to_string())))?;
        tracing::info!(user = %user.name, feed = %feed.name, url = %feed.url, "Feed created");
        Ok((feed, follow))
    }

    pub async fn list_feeds(&self) -> Result<Vec<FeedWithCreator>, CommandError> {
        Ok(self.db.get_feeds_with_creators().await?)
    }

    /// Follow the feed registered under `url`.
    ///
    /// # Errors
    ///
    /// - [`CommandError::FeedNotFound`] if no feed has this URL
    /// - [`CommandError::AlreadyFollowing`] if `user` already follows it
    pub async fn follow_feed(&self, user: &User, url: &str) -> Result<FeedFollowView, CommandError> {
        let feed = self.feed_by_url(url).await?;
        let follow = self
            .db
            .create_feed_follow(user.id, feed.id)
            .await
            .map_err(|e| {
                duplicate_or(e, || CommandError::AlreadyFollowing {
                    user: user.name.clone(),
                    url: url.to_string(),
                })
            })?;
        tracing::info!(user = %user.name, feed = %feed.name, "Feed followed");
        Ok(follow)
    }

    pub async fn list_following(&self, user: &User) -> Result<Vec<FeedFollowView>, CommandError> {
        Ok(self.db.get_feed_follows_for_user(user.id).await?)
    }

    /// Stop following the feed registered under `url`.
    ///
    /// Returns the feed and whether a follow was actually removed; not
    /// following it in the first place is not an error.
    ///
    /// # Errors
    ///
    /// [`CommandError::FeedNotFound`] if no feed has this URL.
    pub async fn unfollow_feed(&self, user: &User, url: &str) -> Result<(Feed, bool), CommandError> {
        let feed = self.feed_by_url(url).await?;
        let removed = self.db.delete_feed_follow(user.id, feed.id).await?;
        tracing::info!(user = %user.name, feed = %feed.name, removed, "Feed unfollowed");
        Ok((feed, removed))
    }

    /// Fetch and parse `url` once. Nothing is stored.
    pub async fn fetch_once(&self, url: &str) -> Result<RssFeed, CommandError> {
        Ok(self.fetcher.fetch(url).await?)
    }

    async fn feed_by_url(&self, url: &str) -> Result<Feed, CommandError> {
        self.db
            .get_feed_by_url(url)
            .await?
            .ok_or_else(|| CommandError::FeedNotFound(url.to_string()))
    }
}

/// A blank name could never be resolved as the current user.
fn check_username(username: &str) -> Result<(), CommandError> {
    if username.trim().is_empty() {
        return Err(CommandError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

/// Map a unique-constraint failure to the domain error from `duplicate`,
/// passing any other storage error through.
fn duplicate_or(err: DatabaseError, duplicate: impl FnOnce() -> CommandError) -> CommandError {
    if err.is_unique_violation() {
        duplicate()
    } else {
        CommandError::Storage(err)
    }
}
