use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full account row. Never serialized directly; responses go through
/// [`PublicProfile`] so credential material cannot leak.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
    pub bio: String,
    pub link: String,
    pub profile_img: String,
    pub cover_img: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserRow {
    pub fn public(&self) -> PublicProfile {
        PublicProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            link: self.link.clone(),
            profile_img: self.profile_img.clone(),
            cover_img: self.cover_img.clone(),
            created_at: self.created_at,
        }
    }
}

/// Profile fields safe to attach to any response. No password hash, no email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub link: String,
    pub profile_img: String,
    pub cover_img: String,
    pub created_at: i64,
}

/// A profile plus its derived relationship and interaction sets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub liked_posts: Vec<String>,
    pub bookmarked_posts: Vec<String>,
    pub retweeted_posts: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: String,
    pub user_id: String,
    pub text: Option<String>,
    pub img: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: i64,
}

/// Post resolved for the feed: author and comment authors hydrated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub user: PublicProfile,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<String>,
    pub reposts: Vec<String>,
    pub comments: Vec<CommentView>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub user: PublicProfile,
    pub text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Follow,
    Like,
    Repost,
    Bookmark,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::Like => "like",
            NotificationKind::Repost => "repost",
            NotificationKind::Bookmark => "bookmark",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub kind: String,
    pub read: bool,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    pub from: PublicProfile,
    #[serde(rename = "type")]
    pub kind: String,
    pub read: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRow {
    pub id: String,
    pub user_a: String,
    pub user_b: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ConversationRow {
    pub fn participant_ids(&self) -> [&str; 2] {
        [&self.user_a, &self.user_b]
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub participants: Vec<PublicProfile>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Message with sender username joined in, chronological within a conversation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub text: String,
    pub created_at: i64,
}
