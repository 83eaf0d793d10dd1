//! Authorization for moderation actions.
//!
//! A deliberately narrow capability: one question, "may this user moderate
//! this topic". Handlers ask the policy once and pass the answer down to the
//! presentation layer as a plain bool; nothing below the handlers ever
//! consults authorization state.

use crate::db::Topic;
use crate::user::ForumUser;

/// Decides whether a user may moderate (lock, stick, delete) a topic.
pub trait ModerationPolicy: Send + Sync {
    fn can_moderate(&self, user: &ForumUser, topic: &Topic) -> bool;
}

/// Default policy: moderators and admins may moderate everything.
///
/// Hosts with finer-grained rules (per-board moderators, topic owners)
/// implement [`ModerationPolicy`] themselves and install it on the router
/// state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleModerationPolicy;

impl ModerationPolicy for RoleModerationPolicy {
    fn can_moderate(&self, user: &ForumUser, _topic: &Topic) -> bool {
        user.moderator || user.admin
    }
}
