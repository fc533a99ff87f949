use chrono::Utc;
use uuid::Uuid;

use super::feed_follows::insert_feed_follow;
use super::schema::Database;
use super::types::{DatabaseError, Feed, FeedFollowView, FeedWithCreator};

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Create a feed owned by `user_id` and make the owner follow it.
    ///
    /// Both rows are written in one transaction: if either insert fails the
    /// feed is not left behind unfollowed.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UniqueViolation`] if `url` is already registered.
    pub async fn create_feed_with_follow(
        &self,
        user_id: Uuid,
        name: &str,
        url: &str,
    ) -> Result<(Feed, FeedFollowView), DatabaseError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let feed: Feed = sqlx::query_as(
            r#"
            INSERT INTO feeds (id, created_at, updated_at, name, url, user_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, created_at, updated_at, name, url, user_id
        "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(now)
        .bind(name)
        .bind(url)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let follow = insert_feed_follow(&mut *tx, user_id, feed.id).await?;

        tx.commit().await?;
        Ok((feed, follow))
    }

    pub async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>, DatabaseError> {
        let feed = sqlx::query_as::<_, Feed>(
            "SELECT id, created_at, updated_at, name, url, user_id FROM feeds WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(feed)
    }

    /// All feeds with the name of the user who added each one.
    pub async fn get_feeds_with_creators(&self) -> Result<Vec<FeedWithCreator>, DatabaseError> {
        let feeds = sqlx::query_as::<_, FeedWithCreator>(
            r#"
                SELECT f.id, f.name, f.url, f.user_id, u.name AS creator_name
                FROM feeds f
                INNER JOIN users u ON u.id = f.user_id
                ORDER BY f.created_at, f.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }
}
