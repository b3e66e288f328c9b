use std::collections::HashMap;

use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{ProfileView, PublicProfile, UserRow};
use crate::error::ApiError;

pub struct UserRepository;

impl UserRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        username: String,
        email: String,
        full_name: String,
        password_hash: &[u8; 32],
        password_salt: &[u8; 32],
    ) -> Result<UserRow, ApiError> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, UserRow>(
            r#"
INSERT INTO users (id, username, email, full_name, password_hash, password_salt, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&username)
        .bind(&email)
        .bind(&full_name)
        .bind(password_hash.as_slice())
        .bind(password_salt.as_slice())
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: &str) -> Result<Option<UserRow>, ApiError> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_username(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Option<UserRow>, ApiError> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_email(
        pool: &Pool<Sqlite>,
        email: &str,
    ) -> Result<Option<UserRow>, ApiError> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Persist a modified account row. Identity (id) and timestamps of creation
    /// are immutable; everything else is written as-is.
    pub async fn update(pool: &Pool<Sqlite>, user: &UserRow) -> Result<UserRow, ApiError> {
        let now = chrono::Utc::now().timestamp();

        let updated = sqlx::query_as::<_, UserRow>(
            r#"
UPDATE users
SET username = ?, email = ?, full_name = ?, password_hash = ?, password_salt = ?,
    bio = ?, link = ?, profile_img = ?, cover_img = ?, updated_at = ?
WHERE id = ?
RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(&user.password_salt)
        .bind(&user.bio)
        .bind(&user.link)
        .bind(&user.profile_img)
        .bind(&user.cover_img)
        .bind(now)
        .bind(&user.id)
        .fetch_one(pool)
        .await?;

        Ok(updated)
    }

    pub async fn exists(pool: &Pool<Sqlite>, id: &str) -> Result<bool, ApiError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.is_some())
    }

    pub async fn is_following(
        pool: &Pool<Sqlite>,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, ApiError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?")
                .bind(follower_id)
                .bind(followee_id)
                .fetch_optional(pool)
                .await?;

        Ok(row.is_some())
    }

    pub async fn follow(
        pool: &Pool<Sqlite>,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)")
            .bind(follower_id)
            .bind(followee_id)
            .bind(chrono::Utc::now().timestamp())
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn unfollow(
        pool: &Pool<Sqlite>,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn follower_ids(pool: &Pool<Sqlite>, user_id: &str) -> Result<Vec<String>, ApiError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT follower_id FROM follows WHERE followee_id = ?")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn following_ids(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT followee_id FROM follows WHERE follower_id = ?")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Post ids in one of the viewer-side interaction sets, newest first.
    /// `table` is one of the fixed interaction relation names.
    async fn interaction_post_ids(
        pool: &Pool<Sqlite>,
        table: &str,
        user_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        let sql = format!(
            "SELECT post_id FROM {} WHERE user_id = ? ORDER BY created_at DESC",
            table
        );
        let rows: Vec<(String,)> = sqlx::query_as(&sql).bind(user_id).fetch_all(pool).await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn liked_post_ids(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        Self::interaction_post_ids(pool, "post_likes", user_id).await
    }

    pub async fn bookmarked_post_ids(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        Self::interaction_post_ids(pool, "post_bookmarks", user_id).await
    }

    pub async fn reposted_post_ids(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        Self::interaction_post_ids(pool, "post_reposts", user_id).await
    }

    /// Assemble the profile plus all derived relationship/interaction sets.
    pub async fn profile_view(pool: &Pool<Sqlite>, user: &UserRow) -> Result<ProfileView, ApiError> {
        Ok(ProfileView {
            profile: user.public(),
            followers: Self::follower_ids(pool, &user.id).await?,
            following: Self::following_ids(pool, &user.id).await?,
            liked_posts: Self::liked_post_ids(pool, &user.id).await?,
            bookmarked_posts: Self::bookmarked_post_ids(pool, &user.id).await?,
            retweeted_posts: Self::reposted_post_ids(pool, &user.id).await?,
        })
    }

    /// A handful of users the viewer does not follow yet, excluding the viewer.
    pub async fn suggested(
        pool: &Pool<Sqlite>,
        viewer_id: &str,
        limit: i64,
    ) -> Result<Vec<UserRow>, ApiError> {
        let users = sqlx::query_as::<_, UserRow>(
            r#"
SELECT * FROM users
WHERE id != ?
  AND id NOT IN (SELECT followee_id FROM follows WHERE follower_id = ?)
ORDER BY RANDOM()
LIMIT ?
            "#,
        )
        .bind(viewer_id)
        .bind(viewer_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Resolve public profiles for a batch of user ids. Ids that no longer
    /// resolve are skipped rather than failing the whole read.
    pub async fn public_profiles(
        pool: &Pool<Sqlite>,
        ids: &[String],
    ) -> Result<HashMap<String, PublicProfile>, ApiError> {
        let mut profiles = HashMap::with_capacity(ids.len());
        for id in ids {
            if profiles.contains_key(id) {
                continue;
            }
            if let Some(user) = Self::get_by_id(pool, id).await? {
                profiles.insert(id.clone(), user.public());
            }
        }
        Ok(profiles)
    }
}
