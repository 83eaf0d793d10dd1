use serde::{Deserialize, Serialize};

/// A messageboard grouping related topics.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Messageboard {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub topics_count: i64,
    pub posts_count: i64,
    pub created_at: String,
}

/// A discussion topic within a messageboard.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: i64,
    pub messageboard_id: i64,
    pub slug: String,
    pub title: String,
    pub locked: bool,
    pub sticky: bool,
    pub posts_count: i64,
    pub last_post_at: Option<String>,
    pub user_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// A single post within a topic.
///
/// `user_id` refers to the host application's user and is nulled when that
/// user is removed; `author_name` is denormalized so old posts keep a byline.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub topic_id: i64,
    pub user_id: Option<i64>,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
}

/// Per-user marker of how far into a topic that user has read.
///
/// At most one row exists per (user, topic). `read_at` is an RFC 3339 UTC
/// timestamp; it never moves backward on a view event. The explicit
/// mark-unread operation is the only thing that rewinds it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserTopicReadState {
    pub user_id: i64,
    pub topic_id: i64,
    pub read_at: String,
    pub page: i64,
}

/// Per-user subscription marker for a topic. Existence implies following.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserTopicFollow {
    pub user_id: i64,
    pub topic_id: i64,
    pub reason: Option<String>,
    pub created_at: String,
}

impl UserTopicFollow {
    #[must_use]
    pub fn reason_enum(&self) -> Option<FollowReason> {
        self.reason.as_deref().and_then(FollowReason::from_str)
    }
}

/// Why a user follows a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowReason {
    /// The user followed the topic explicitly.
    Manual,
    /// The user was subscribed automatically after posting in the topic.
    Posted,
}

impl FollowReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Posted => "posted",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "posted" => Some(Self::Posted),
            _ => None,
        }
    }
}

/// Data for creating a new messageboard.
#[derive(Debug, Clone)]
pub struct NewMessageboard {
    pub name: String,
    pub description: Option<String>,
}

/// Data for creating a new topic together with its first post.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub messageboard_id: i64,
    pub title: String,
    pub user_id: Option<i64>,
    pub author_name: String,
    pub content: String,
}

/// Data for inserting a new post into an existing topic.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub topic_id: i64,
    pub user_id: Option<i64>,
    pub author_name: String,
    pub content: String,
}
