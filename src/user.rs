//! Viewer identity supplied by the host application.
//!
//! The forum does not authenticate anyone. The embedding application owns
//! users, sessions, and passwords; it injects a [`ForumUser`] into request
//! extensions for signed-in requests and the forum takes it from there.

use serde::{Deserialize, Serialize};

/// A signed-in forum viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumUser {
    /// The host application's user ID. Read states and follows key on it.
    pub id: i64,
    /// Display name used as the byline on new posts.
    pub name: String,
    pub moderator: bool,
    pub admin: bool,
}
