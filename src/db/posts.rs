use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{CommentRow, CommentView, PostRow, PostView};
use crate::db::users::UserRepository;
use crate::error::ApiError;

/// The three per-post interaction relations a user can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Like,
    Bookmark,
    Repost,
}

impl Interaction {
    fn table(&self) -> &'static str {
        match self {
            Interaction::Like => "post_likes",
            Interaction::Bookmark => "post_bookmarks",
            Interaction::Repost => "post_reposts",
        }
    }
}

/// Result of flipping an interaction: whether the actor was added to the set,
/// and who authored the post (for notification fan-out).
#[derive(Debug)]
pub struct ToggleOutcome {
    pub added: bool,
    pub author_id: String,
}

pub struct PostRepository;

impl PostRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: &str,
        text: Option<String>,
        img: Option<String>,
    ) -> Result<PostRow, ApiError> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        let post = sqlx::query_as::<_, PostRow>(
            r#"
INSERT INTO posts (id, user_id, text, img, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&text)
        .bind(&img)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(post)
    }

    pub async fn get(pool: &Pool<Sqlite>, id: &str) -> Result<Option<PostRow>, ApiError> {
        let post = sqlx::query_as::<_, PostRow>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(post)
    }

    /// Remove a post and everything hanging off it in one transaction.
    pub async fn delete(pool: &Pool<Sqlite>, id: &str) -> Result<(), ApiError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM post_comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_likes WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_bookmarks WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_reposts WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn add_comment(
        pool: &Pool<Sqlite>,
        post_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<CommentRow, ApiError> {
        let id = Uuid::new_v4().to_string();

        let comment = sqlx::query_as::<_, CommentRow>(
            r#"
INSERT INTO post_comments (id, post_id, user_id, text, created_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .bind(chrono::Utc::now().timestamp())
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    pub async fn comments(pool: &Pool<Sqlite>, post_id: &str) -> Result<Vec<CommentRow>, ApiError> {
        let comments = sqlx::query_as::<_, CommentRow>(
            "SELECT * FROM post_comments WHERE post_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// User ids currently in the post's interaction set.
    pub async fn interaction_member_ids(
        pool: &Pool<Sqlite>,
        interaction: Interaction,
        post_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        let sql = format!(
            "SELECT user_id FROM {} WHERE post_id = ? ORDER BY created_at ASC",
            interaction.table()
        );
        let rows: Vec<(String,)> = sqlx::query_as(&sql).bind(post_id).fetch_all(pool).await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Flip the actor's membership in the post's interaction set.
    /// NotFound if the post is gone. The flip is a single row insert or delete,
    /// so concurrent actors commute; a racing double-flip from the same actor
    /// flips twice, which is the documented toggle contract.
    pub async fn toggle_interaction(
        pool: &Pool<Sqlite>,
        interaction: Interaction,
        post_id: &str,
        user_id: &str,
    ) -> Result<ToggleOutcome, ApiError> {
        let post = Self::get(pool, post_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

        let table = interaction.table();
        let sql = format!("SELECT 1 FROM {} WHERE post_id = ? AND user_id = ?", table);
        let member: Option<(i64,)> = sqlx::query_as(&sql)
            .bind(post_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        let added = if member.is_some() {
            let sql = format!("DELETE FROM {} WHERE post_id = ? AND user_id = ?", table);
            sqlx::query(&sql)
                .bind(post_id)
                .bind(user_id)
                .execute(pool)
                .await?;
            false
        } else {
            let sql = format!(
                "INSERT INTO {} (post_id, user_id, created_at) VALUES (?, ?, ?)",
                table
            );
            sqlx::query(&sql)
                .bind(post_id)
                .bind(user_id)
                .bind(chrono::Utc::now().timestamp())
                .execute(pool)
                .await?;
            true
        };

        Ok(ToggleOutcome {
            added,
            author_id: post.user_id,
        })
    }

    pub async fn global_feed(
        pool: &Pool<Sqlite>,
        page: i64,
        limit: i64,
    ) -> Result<Vec<PostRow>, ApiError> {
        let posts = sqlx::query_as::<_, PostRow>(
            "SELECT * FROM posts ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(pool)
        .await?;

        Ok(posts)
    }

    pub async fn following_feed(
        pool: &Pool<Sqlite>,
        viewer_id: &str,
        page: i64,
        limit: i64,
    ) -> Result<Vec<PostRow>, ApiError> {
        let posts = sqlx::query_as::<_, PostRow>(
            r#"
SELECT * FROM posts
WHERE user_id IN (SELECT followee_id FROM follows WHERE follower_id = ?)
ORDER BY created_at DESC, id DESC
LIMIT ? OFFSET ?
            "#,
        )
        .bind(viewer_id)
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(pool)
        .await?;

        Ok(posts)
    }

    pub async fn user_feed(
        pool: &Pool<Sqlite>,
        author_id: &str,
        page: i64,
        limit: i64,
    ) -> Result<Vec<PostRow>, ApiError> {
        let posts = sqlx::query_as::<_, PostRow>(
            "SELECT * FROM posts WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(author_id)
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(pool)
        .await?;

        Ok(posts)
    }

    /// Posts in one of a user's interaction sets, newest post first.
    pub async fn interaction_feed(
        pool: &Pool<Sqlite>,
        interaction: Interaction,
        user_id: &str,
        page: i64,
        limit: i64,
    ) -> Result<Vec<PostRow>, ApiError> {
        let sql = format!(
            r#"
SELECT p.* FROM posts p
JOIN {} i ON i.post_id = p.id
WHERE i.user_id = ?
ORDER BY p.created_at DESC, p.id DESC
LIMIT ? OFFSET ?
            "#,
            interaction.table()
        );
        let posts = sqlx::query_as::<_, PostRow>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind((page - 1) * limit)
            .fetch_all(pool)
            .await?;

        Ok(posts)
    }

    /// Resolve rows into feed views: author profile, comment author profiles,
    /// like and repost membership. Posts whose author row has vanished are
    /// dropped from the result rather than failing the page.
    pub async fn hydrate(pool: &Pool<Sqlite>, rows: Vec<PostRow>) -> Result<Vec<PostView>, ApiError> {
        let mut views = Vec::with_capacity(rows.len());

        for post in rows {
            let comments = Self::comments(pool, &post.id).await?;

            let mut ids: Vec<String> = comments.iter().map(|c| c.user_id.clone()).collect();
            ids.push(post.user_id.clone());
            let profiles = UserRepository::public_profiles(pool, &ids).await?;

            let Some(author) = profiles.get(&post.user_id) else {
                tracing::warn!(post_id = %post.id, "dropping post with missing author");
                continue;
            };

            let comment_views = comments
                .into_iter()
                .filter_map(|c| {
                    profiles.get(&c.user_id).map(|profile| CommentView {
                        id: c.id,
                        user: profile.clone(),
                        text: c.text,
                        created_at: c.created_at,
                    })
                })
                .collect();

            views.push(PostView {
                likes: Self::interaction_member_ids(pool, Interaction::Like, &post.id).await?,
                reposts: Self::interaction_member_ids(pool, Interaction::Repost, &post.id).await?,
                comments: comment_views,
                id: post.id,
                user: author.clone(),
                text: post.text,
                img: post.img,
                created_at: post.created_at,
                updated_at: post.updated_at,
            });
        }

        Ok(views)
    }
}
