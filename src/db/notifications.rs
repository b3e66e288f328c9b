use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{NotificationKind, NotificationRow, NotificationView};
use crate::db::users::UserRepository;
use crate::error::ApiError;

pub struct NotificationRepository;

impl NotificationRepository {
    /// Persist a notification addressed to `to_id`. Self-notifications are
    /// silently suppressed.
    pub async fn notify(
        pool: &Pool<Sqlite>,
        from_id: &str,
        to_id: &str,
        kind: NotificationKind,
    ) -> Result<(), ApiError> {
        if from_id == to_id {
            return Ok(());
        }

        sqlx::query(
            r#"
INSERT INTO notifications (id, from_id, to_id, kind, read, created_at)
VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(from_id)
        .bind(to_id)
        .bind(kind.as_str())
        .bind(chrono::Utc::now().timestamp())
        .execute(pool)
        .await?;

        tracing::debug!(from = %from_id, to = %to_id, kind = kind.as_str(), "notification stored");
        Ok(())
    }

    /// All notifications addressed to `user_id`, newest first, with the actor's
    /// public profile attached. Returned notifications are marked read.
    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<NotificationView>, ApiError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE to_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let actor_ids: Vec<String> = rows.iter().map(|n| n.from_id.clone()).collect();
        let profiles = UserRepository::public_profiles(pool, &actor_ids).await?;

        let views = rows
            .into_iter()
            .filter_map(|n| {
                profiles.get(&n.from_id).map(|actor| NotificationView {
                    id: n.id,
                    from: actor.clone(),
                    kind: n.kind,
                    read: n.read,
                    created_at: n.created_at,
                })
            })
            .collect();

        sqlx::query("UPDATE notifications SET read = 1 WHERE to_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(views)
    }

    /// Delete every notification addressed to `user_id`.
    pub async fn clear_for_user(pool: &Pool<Sqlite>, user_id: &str) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM notifications WHERE to_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    #[cfg(test)]
    pub async fn count_for_user(pool: &Pool<Sqlite>, user_id: &str) -> Result<i64, ApiError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE to_id = ?")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn seed_user(pool: &Pool<Sqlite>, name: &str) -> String {
        let user = UserRepository::create(
            pool,
            name.to_string(),
            format!("{}@example.com", name),
            name.to_string(),
            &[0u8; 32],
            &[0u8; 32],
        )
        .await
        .unwrap();
        user.id
    }

    #[tokio::test]
    async fn self_notification_is_suppressed() {
        let pool = test_pool().await;
        let a = seed_user(&pool, "ada").await;

        NotificationRepository::notify(&pool, &a, &a, NotificationKind::Like)
            .await
            .unwrap();

        assert_eq!(
            NotificationRepository::count_for_user(&pool, &a).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_marks_read() {
        let pool = test_pool().await;
        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;

        NotificationRepository::notify(&pool, &b, &a, NotificationKind::Follow)
            .await
            .unwrap();
        NotificationRepository::notify(&pool, &b, &a, NotificationKind::Like)
            .await
            .unwrap();

        let first = NotificationRepository::list_for_user(&pool, &a).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first[0].created_at >= first[1].created_at);
        assert!(first.iter().all(|n| !n.read));

        let second = NotificationRepository::list_for_user(&pool, &a).await.unwrap();
        assert!(second.iter().all(|n| n.read));
    }

    #[tokio::test]
    async fn clear_removes_only_recipients_rows() {
        let pool = test_pool().await;
        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;

        NotificationRepository::notify(&pool, &b, &a, NotificationKind::Follow)
            .await
            .unwrap();
        NotificationRepository::notify(&pool, &a, &b, NotificationKind::Follow)
            .await
            .unwrap();

        let removed = NotificationRepository::clear_for_user(&pool, &a).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            NotificationRepository::count_for_user(&pool, &b).await.unwrap(),
            1
        );
    }
}
