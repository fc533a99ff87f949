//! Integration tests for users, feeds and follow relationships.
//!
//! Each test builds a service over its own in-memory SQLite database and an
//! in-memory config store, then drives it the way the commands do.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use gator::config::{Config, ConfigError, ConfigStore, MemoryConfigStore};
use gator::feed::{FeedFetcher, FetchError, RssFeed, RssItem};
use gator::service::FeedFollowService;
use gator::session::Session;
use gator::storage::Database;
use gator::CommandError;
use pretty_assertions::assert_eq;

/// Returns a canned feed for any URL.
struct CannedFetcher;

impl FeedFetcher for CannedFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RssFeed, FetchError>> {
        async move {
            Ok(RssFeed {
                title: "Canned".to_string(),
                link: Some(url.to_string()),
                description: None,
                items: vec![RssItem {
                    title: "Only item".to_string(),
                    link: None,
                    description: None,
                    pub_date: None,
                }],
            })
        }
        .boxed()
    }
}

async fn setup() -> (FeedFollowService, MemoryConfigStore) {
    let db = Database::open(":memory:").await.unwrap();
    let store = MemoryConfigStore::new(Config {
        db_url: "sqlite::memory:".to_string(),
        current_user_name: None,
    });
    let session = Session::load(store.clone()).unwrap();
    (
        FeedFollowService::new(db, session, Arc::new(CannedFetcher)),
        store,
    )
}

// ============================================================================
// Registration and login
// ============================================================================

#[tokio::test]
async fn test_register_then_login_sets_current_user() {
    let (mut svc, store) = setup().await;

    svc.register("alice").await.unwrap();
    svc.login("alice").await.unwrap();

    assert_eq!(store.snapshot().current_user(), Some("alice"));
}

#[tokio::test]
async fn test_register_twice_fails_second_time() {
    let (mut svc, _) = setup().await;

    svc.register("alice").await.unwrap();
    let err = svc.register("alice").await.unwrap_err();

    assert!(matches!(err, CommandError::DuplicateUser(ref name) if name == "alice"));
    assert_eq!(svc.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_username_rejected() {
    let (mut svc, store) = setup().await;

    for name in ["", "   ", "\t"] {
        let err = svc.register(name).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidUsername(ref n) if n == name));

        let err = svc.login(name).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidUsername(_)));
    }

    assert!(svc.list_users().await.unwrap().is_empty());
    assert_eq!(store.snapshot().current_user_name, None);
}

#[tokio::test]
async fn test_blank_login_keeps_current_user() {
    let (mut svc, store) = setup().await;
    svc.register("alice").await.unwrap();

    let err = svc.login("").await.unwrap_err();

    assert!(matches!(err, CommandError::InvalidUsername(_)));
    assert_eq!(store.snapshot().current_user(), Some("alice"));
    assert_eq!(svc.current_user().await.unwrap().name, "alice");
}

#[tokio::test]
async fn test_login_switches_between_users() {
    let (mut svc, store) = setup().await;
    svc.register("alice").await.unwrap();
    svc.register("bob").await.unwrap();
    assert_eq!(store.snapshot().current_user(), Some("bob"));

    svc.login("alice").await.unwrap();
    assert_eq!(store.snapshot().current_user(), Some("alice"));
    assert_eq!(svc.current_user().await.unwrap().name, "alice");
}

#[tokio::test]
async fn test_login_preserves_db_url() {
    let (mut svc, store) = setup().await;
    svc.register("alice").await.unwrap();

    assert_eq!(store.snapshot().db_url, "sqlite::memory:");
}

/// Config store that cannot be written, e.g. a read-only home directory.
struct ReadOnlyStore;

impl ConfigStore for ReadOnlyStore {
    fn read(&self) -> Result<Config, ConfigError> {
        Ok(Config::default())
    }

    fn write(&self, _config: &Config) -> Result<(), ConfigError> {
        Err(ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }
}

#[tokio::test]
async fn test_register_rolls_back_when_login_cannot_persist() {
    let db = Database::open(":memory:").await.unwrap();
    let session = Session::load(ReadOnlyStore).unwrap();
    let mut svc = FeedFollowService::new(db.clone(), session, Arc::new(CannedFetcher));

    let err = svc.register("alice").await.unwrap_err();

    assert!(matches!(err, CommandError::Config(_)));
    assert!(db.get_user_by_name("alice").await.unwrap().is_none());
}

// ============================================================================
// Feeds and follows
// ============================================================================

#[tokio::test]
async fn test_create_feed_auto_follows() {
    let (mut svc, _) = setup().await;
    let user = svc.register("u").await.unwrap();

    let (feed, _) = svc.create_feed(&user, "n", "http://x").await.unwrap();

    let following = svc.list_following(&user).await.unwrap();
    let for_feed: Vec<_> = following.iter().filter(|f| f.feed_id == feed.id).collect();
    assert_eq!(for_feed.len(), 1);
    assert_eq!(for_feed[0].feed_name, "n");
}

#[tokio::test]
async fn test_duplicate_feed_url_rejected() {
    let (mut svc, _) = setup().await;
    let alice = svc.register("alice").await.unwrap();
    let bob = svc.register("bob").await.unwrap();
    svc.create_feed(&alice, "a", "https://same.example/rss")
        .await
        .unwrap();

    let err = svc
        .create_feed(&bob, "b", "https://same.example/rss")
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::DuplicateFeedUrl(ref url) if url == "https://same.example/rss"));
    assert!(svc.list_following(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_follow_unknown_feed() {
    let (mut svc, _) = setup().await;
    let user = svc.register("alice").await.unwrap();

    let err = svc
        .follow_feed(&user, "https://nowhere.example/rss")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::FeedNotFound(_)));
}

#[tokio::test]
async fn test_follow_other_users_feed() {
    let (mut svc, _) = setup().await;
    let alice = svc.register("alice").await.unwrap();
    let bob = svc.register("bob").await.unwrap();
    svc.create_feed(&alice, "alice-blog", "https://alice.example/rss")
        .await
        .unwrap();

    let follow = svc
        .follow_feed(&bob, "https://alice.example/rss")
        .await
        .unwrap();

    assert_eq!(follow.feed_name, "alice-blog");
    assert_eq!(follow.user_name, "bob");
    assert_eq!(svc.list_following(&bob).await.unwrap().len(), 1);
    assert_eq!(svc.list_following(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_follow_rejected() {
    let (mut svc, _) = setup().await;
    let user = svc.register("alice").await.unwrap();
    svc.create_feed(&user, "blog", "https://a.example/rss")
        .await
        .unwrap();

    let err = svc
        .follow_feed(&user, "https://a.example/rss")
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::AlreadyFollowing { .. }));
    assert_eq!(svc.list_following(&user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_follow_then_unfollow_leaves_nothing() {
    let (mut svc, _) = setup().await;
    let owner = svc.register("owner").await.unwrap();
    let reader = svc.register("reader").await.unwrap();
    let url = "https://owner.example/rss";
    svc.create_feed(&owner, "owned", url).await.unwrap();

    svc.follow_feed(&reader, url).await.unwrap();
    let (_, removed) = svc.unfollow_feed(&reader, url).await.unwrap();
    assert!(removed);
    assert!(svc.list_following(&reader).await.unwrap().is_empty());

    // Second unfollow is a no-op
    let (feed, removed) = svc.unfollow_feed(&reader, url).await.unwrap();
    assert!(!removed);
    assert_eq!(feed.url, url);
}

#[tokio::test]
async fn test_unfollow_unknown_feed() {
    let (mut svc, _) = setup().await;
    let user = svc.register("alice").await.unwrap();

    let err = svc
        .unfollow_feed(&user, "https://nowhere.example/rss")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::FeedNotFound(_)));
}

#[tokio::test]
async fn test_unfollow_own_feed_keeps_feed() {
    let (mut svc, _) = setup().await;
    let user = svc.register("alice").await.unwrap();
    svc.create_feed(&user, "blog", "https://a.example/rss")
        .await
        .unwrap();

    svc.unfollow_feed(&user, "https://a.example/rss")
        .await
        .unwrap();

    assert!(svc.list_following(&user).await.unwrap().is_empty());
    assert_eq!(svc.list_feeds().await.unwrap().len(), 1);
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn test_reset_removes_everything() {
    let (mut svc, _) = setup().await;
    let user = svc.register("alice").await.unwrap();
    svc.create_feed(&user, "blog", "https://a.example/rss")
        .await
        .unwrap();

    let removed = svc.reset_all().await.unwrap();

    assert_eq!(removed, 1);
    assert!(svc.list_users().await.unwrap().is_empty());
    assert!(svc.list_feeds().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_invalidates_current_user() {
    let (mut svc, _) = setup().await;
    svc.register("alice").await.unwrap();

    svc.reset_all().await.unwrap();

    let err = svc.current_user().await.unwrap_err();
    assert!(matches!(err, CommandError::Unauthenticated(Some(ref name)) if name == "alice"));
    let err = svc.login("alice").await.unwrap_err();
    assert!(matches!(err, CommandError::UserNotFound(_)));
}

// ============================================================================
// Scenario
// ============================================================================

#[tokio::test]
async fn test_bob_adds_blog() {
    let (mut svc, _) = setup().await;
    svc.register("bob").await.unwrap();
    let bob = svc.current_user().await.unwrap();

    svc.create_feed(&bob, "blog", "http://b.example/feed.xml")
        .await
        .unwrap();

    let feeds = svc.list_feeds().await.unwrap();
    let rows: Vec<(&str, &str, &str)> = feeds
        .iter()
        .map(|f| (f.name.as_str(), f.url.as_str(), f.creator_name.as_str()))
        .collect();
    assert_eq!(rows, vec![("blog", "http://b.example/feed.xml", "bob")]);

    let following = svc.list_following(&bob).await.unwrap();
    let rows: Vec<(&str, &str)> = following
        .iter()
        .map(|f| (f.feed_name.as_str(), f.feed_url.as_str()))
        .collect();
    assert_eq!(rows, vec![("blog", "http://b.example/feed.xml")]);
}

#[tokio::test]
async fn test_fetch_once_stores_nothing() {
    let (svc, _) = setup().await;

    let feed = svc.fetch_once("https://any.example/rss").await.unwrap();

    assert_eq!(feed.title, "Canned");
    assert_eq!(feed.items.len(), 1);
    assert!(svc.list_feeds().await.unwrap().is_empty());
}
