use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{ConversationRow, ConversationView, MessageRow};
use crate::db::users::UserRepository;
use crate::error::ApiError;

/// Canonical storage order for a participant pair; uniqueness of the
/// (user_a, user_b) column pair then gives one conversation per pair.
fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

pub struct ConversationRepository;

impl ConversationRepository {
    /// Find the conversation for an unordered pair, creating it on first use.
    pub async fn get_or_create(
        pool: &Pool<Sqlite>,
        user_id: &str,
        other_id: &str,
    ) -> Result<ConversationRow, ApiError> {
        let (a, b) = canonical_pair(user_id, other_id);

        if let Some(existing) = sqlx::query_as::<_, ConversationRow>(
            "SELECT * FROM conversations WHERE user_a = ? AND user_b = ?",
        )
        .bind(a)
        .bind(b)
        .fetch_optional(pool)
        .await?
        {
            return Ok(existing);
        }

        let now = chrono::Utc::now().timestamp();
        let conversation = sqlx::query_as::<_, ConversationRow>(
            r#"
INSERT INTO conversations (id, user_a, user_b, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(a)
        .bind(b)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(conversation)
    }

    pub async fn get(pool: &Pool<Sqlite>, id: &str) -> Result<Option<ConversationRow>, ApiError> {
        let conversation =
            sqlx::query_as::<_, ConversationRow>("SELECT * FROM conversations WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(conversation)
    }

    /// Append a message and bump the conversation's recency.
    pub async fn append_message(
        pool: &Pool<Sqlite>,
        conversation_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<MessageRow, ApiError> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
INSERT INTO messages (id, conversation_id, sender_id, text, created_at)
VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(text)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let message = sqlx::query_as::<_, MessageRow>(
            r#"
SELECT m.id, m.conversation_id, m.sender_id, u.username AS sender_username, m.text, m.created_at
FROM messages m
JOIN users u ON m.sender_id = u.id
WHERE m.id = ?
            "#,
        )
        .bind(&id)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// Messages of a conversation, oldest first.
    pub async fn messages(
        pool: &Pool<Sqlite>,
        conversation_id: &str,
    ) -> Result<Vec<MessageRow>, ApiError> {
        let messages = sqlx::query_as::<_, MessageRow>(
            r#"
SELECT m.id, m.conversation_id, m.sender_id, u.username AS sender_username, m.text, m.created_at
FROM messages m
JOIN users u ON m.sender_id = u.id
WHERE m.conversation_id = ?
ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    /// Conversations the user participates in, most recently updated first,
    /// with participant profiles attached.
    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<ConversationView>, ApiError> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            r#"
SELECT * FROM conversations
WHERE user_a = ? OR user_b = ?
ORDER BY updated_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let mut participant_ids = Vec::with_capacity(rows.len() * 2);
        for row in &rows {
            participant_ids.push(row.user_a.clone());
            participant_ids.push(row.user_b.clone());
        }
        let profiles = UserRepository::public_profiles(pool, &participant_ids).await?;

        let views = rows
            .into_iter()
            .map(|row| {
                let participants = row
                    .participant_ids()
                    .iter()
                    .filter_map(|id| profiles.get(*id).cloned())
                    .collect();
                ConversationView {
                    id: row.id,
                    participants,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                }
            })
            .collect();

        Ok(views)
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
    async fn one_conversation_per_pair_regardless_of_order() {
        let pool = test_pool().await;
        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;

        let first = ConversationRepository::get_or_create(&pool, &a, &b).await.unwrap();
        let second = ConversationRepository::get_or_create(&pool, &b, &a).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn messages_are_append_only_and_ordered() {
        let pool = test_pool().await;
        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;

        let conv = ConversationRepository::get_or_create(&pool, &a, &b).await.unwrap();
        ConversationRepository::append_message(&pool, &conv.id, &a, "hello")
            .await
            .unwrap();
        ConversationRepository::append_message(&pool, &conv.id, &b, "hey")
            .await
            .unwrap();

        let messages = ConversationRepository::messages(&pool, &conv.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[1].text, "hey");
        assert_eq!(messages[0].sender_username, "ada");
    }

    #[tokio::test]
    async fn list_attaches_participants_and_orders_by_recency() {
        let pool = test_pool().await;
        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;
        let c = seed_user(&pool, "cal").await;

        let with_b = ConversationRepository::get_or_create(&pool, &a, &b).await.unwrap();
        let with_c = ConversationRepository::get_or_create(&pool, &a, &c).await.unwrap();

        // Bump the older conversation so it sorts first again.
        sqlx::query("UPDATE conversations SET updated_at = updated_at + 10 WHERE id = ?")
            .bind(&with_b.id)
            .execute(&pool)
            .await
            .unwrap();

        let list = ConversationRepository::list_for_user(&pool, &a).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, with_b.id);
        assert_eq!(list[1].id, with_c.id);
        assert_eq!(list[0].participants.len(), 2);
    }
}
