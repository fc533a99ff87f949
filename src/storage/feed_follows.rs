use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::schema::Database;
use super::types::{DatabaseError, FeedFollowView};

const FOLLOW_VIEW_SELECT: &str = r#"
    SELECT ff.id, ff.created_at, ff.updated_at, ff.user_id, ff.feed_id,
           f.name AS feed_name, f.url AS feed_url, u.name AS user_name
    FROM feed_follows ff
    INNER JOIN feeds f ON f.id = ff.feed_id
    INNER JOIN users u ON u.id = ff.user_id
"#;

/// Insert a follow edge on an open connection (usually a transaction) and
/// read it back joined with feed and user names.
pub(super) async fn insert_feed_follow(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    feed_id: Uuid,
) -> Result<FeedFollowView, DatabaseError> {
    let now = Utc::now();
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
        VALUES (?, ?, ?, ?, ?)
    "#,
    )
    .bind(id)
    .bind(now)
    .bind(now)
    .bind(user_id)
    .bind(feed_id)
    .execute(&mut *conn)
    .await?;

    let view = sqlx::query_as::<_, FeedFollowView>(&format!(
        "{FOLLOW_VIEW_SELECT} WHERE ff.id = ?"
    ))
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(view)
}

impl Database {
    // ========================================================================
    // Feed Follow Operations
    // ========================================================================

    /// Record that `user_id` follows `feed_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UniqueViolation`] if the user already follows the feed.
    pub async fn create_feed_follow(
        &self,
        user_id: Uuid,
        feed_id: Uuid,
    ) -> Result<FeedFollowView, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let view = insert_feed_follow(&mut *tx, user_id, feed_id).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Every feed `user_id` follows, oldest follow first.
    pub async fn get_feed_follows_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FeedFollowView>, DatabaseError> {
        let follows = sqlx::query_as::<_, FeedFollowView>(&format!(
            "{FOLLOW_VIEW_SELECT} WHERE ff.user_id = ? ORDER BY ff.created_at, f.name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(follows)
    }

    /// Remove the follow edge for `(user_id, feed_id)`.
    ///
    /// Deleting an edge that does not exist is not an error; the return value
    /// says whether a row was actually removed.
    pub async fn delete_feed_follow(
        &self,
        user_id: Uuid,
        feed_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
