//! The topic view model: which badges a topic row shows for the current
//! viewer, and which post its link should deep-link to.

use crate::db::{FollowReason, Post, Topic, UserTopicFollow, UserTopicReadState};

/// A post reference carried for unread tracking and deep links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub id: i64,
    pub created_at: String,
}

impl From<&Post> for PostRef {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            created_at: post.created_at.clone(),
        }
    }
}

/// Read-only projection of a topic with exactly the fields presentation
/// needs. The read-state store computes `first_unread_post` (it folds
/// explicit mark-unread actions into it); this layer only consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSnapshot {
    pub locked: bool,
    pub sticky: bool,
    pub first_unread_post: Option<PostRef>,
    pub last_post: Option<PostRef>,
}

impl TopicSnapshot {
    /// Build a snapshot from a topic row and its resolved post references.
    #[must_use]
    pub fn of(topic: &Topic, first_unread_post: Option<PostRef>, last_post: Option<PostRef>) -> Self {
        Self {
            locked: topic.locked,
            sticky: topic.sticky,
            first_unread_post,
            last_post,
        }
    }
}

/// Projection of a viewer's read state for one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStateView {
    pub read_at: String,
    pub page: i64,
}

impl From<&UserTopicReadState> for ReadStateView {
    fn from(rs: &UserTopicReadState) -> Self {
        Self {
            read_at: rs.read_at.clone(),
            page: rs.page,
        }
    }
}

/// Projection of a viewer's follow record for one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowView {
    pub reason: Option<FollowReason>,
}

impl From<&UserTopicFollow> for FollowView {
    fn from(follow: &UserTopicFollow) -> Self {
        Self {
            reason: follow.reason_enum(),
        }
    }
}

/// Everything known about the current viewer relative to one topic.
///
/// Read state and follow live inside the viewer, so "state data for an
/// absent user" cannot be expressed at all. `can_moderate` is answered by
/// the policy up in the handler; this layer just carries the bool through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewerState {
    pub read_state: Option<ReadStateView>,
    pub follow: Option<FollowView>,
    pub can_moderate: bool,
}

/// A descriptive state tag for a topic, rendered as a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicState {
    Read,
    Unread,
    Locked,
    Sticky,
    Following,
    NotFollowing,
}

impl TopicState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Unread => "unread",
            Self::Locked => "locked",
            Self::Sticky => "sticky",
            Self::Following => "following",
            Self::NotFollowing => "notfollowing",
        }
    }

    /// CSS class used on topic rows and badges.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Read => "topic-read",
            Self::Unread => "topic-unread",
            Self::Locked => "topic-locked",
            Self::Sticky => "topic-sticky",
            Self::Following => "topic-following",
            Self::NotFollowing => "topic-notfollowing",
        }
    }
}

/// Per-viewer presentation of one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicView {
    /// Ordered tags: read/unread first (signed-in only), then locked, then
    /// sticky, then following/notfollowing (signed-in only).
    pub states: Vec<TopicState>,
    /// 1-based page the topic link should open.
    pub page: i64,
    /// Post id the topic link should scroll to, if the topic has any posts.
    pub anchor: Option<i64>,
    pub can_moderate: bool,
}

impl TopicView {
    /// Compute the presentation of `topic` for the given viewer (`None` for
    /// anonymous). Pure: same inputs, same output, nothing touched.
    #[must_use]
    pub fn resolve(topic: &TopicSnapshot, viewer: Option<&ViewerState>) -> Self {
        let mut states = Vec::with_capacity(4);

        if let Some(viewer) = viewer {
            // Read means: a read state exists and the store found nothing
            // unread past it. A viewer with no read state has read nothing.
            let read = viewer.read_state.is_some() && topic.first_unread_post.is_none();
            states.push(if read {
                TopicState::Read
            } else {
                TopicState::Unread
            });
        }

        if topic.locked {
            states.push(TopicState::Locked);
        }
        if topic.sticky {
            states.push(TopicState::Sticky);
        }

        if let Some(viewer) = viewer {
            states.push(if viewer.follow.is_some() {
                TopicState::Following
            } else {
                TopicState::NotFollowing
            });
        }

        // Deep link to the first unread post when there is one, otherwise to
        // the latest post; an empty topic gets a plain topic link.
        let anchor = topic
            .first_unread_post
            .as_ref()
            .or(topic.last_post.as_ref())
            .map(|post| post.id);

        let page = viewer
            .and_then(|v| v.read_state.as_ref())
            .map_or(1, |rs| rs.page);

        Self {
            states,
            page,
            anchor,
            can_moderate: viewer.is_some_and(|v| v.can_moderate),
        }
    }

    /// Whether the topic is fully read by this viewer.
    #[must_use]
    pub fn read(&self) -> bool {
        self.states.first() == Some(&TopicState::Read)
    }

    /// Whether the viewer follows this topic.
    #[must_use]
    pub fn followed(&self) -> bool {
        self.states.contains(&TopicState::Following)
    }

    /// Space-separated CSS classes for the topic row.
    #[must_use]
    pub fn css_class(&self) -> String {
        self.states
            .iter()
            .map(TopicState::css_class)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_ref(id: i64, created_at: &str) -> PostRef {
        PostRef {
            id,
            created_at: created_at.to_string(),
        }
    }

    fn plain_topic() -> TopicSnapshot {
        TopicSnapshot {
            locked: false,
            sticky: false,
            first_unread_post: None,
            last_post: Some(post_ref(3, "2024-01-15 12:02:00.000")),
        }
    }

    fn read_state(read_at: &str, page: i64) -> ReadStateView {
        ReadStateView {
            read_at: read_at.to_string(),
            page,
        }
    }

    fn viewer() -> ViewerState {
        ViewerState::default()
    }

    #[test]
    fn test_anonymous_plain_topic_has_no_states() {
        let view = TopicView::resolve(&plain_topic(), None);
        assert!(view.states.is_empty());
        assert!(!view.can_moderate);
    }

    #[test]
    fn test_anonymous_locked_sticky_topic() {
        let topic = TopicSnapshot {
            locked: true,
            sticky: true,
            ..plain_topic()
        };
        let view = TopicView::resolve(&topic, None);
        assert_eq!(view.states, vec![TopicState::Locked, TopicState::Sticky]);
    }

    #[test]
    fn test_locked_state_present_regardless_of_viewer() {
        let topic = TopicSnapshot {
            locked: true,
            ..plain_topic()
        };
        let anon = TopicView::resolve(&topic, None);
        let signed_in = TopicView::resolve(&topic, Some(&viewer()));
        assert!(anon.states.contains(&TopicState::Locked));
        assert!(signed_in.states.contains(&TopicState::Locked));
    }

    #[test]
    fn test_sticky_state_present() {
        let topic = TopicSnapshot {
            sticky: true,
            ..plain_topic()
        };
        let view = TopicView::resolve(&topic, Some(&viewer()));
        assert!(view.states.contains(&TopicState::Sticky));
    }

    #[test]
    fn test_viewer_gets_exactly_one_follow_state() {
        let unfollowed = TopicView::resolve(&plain_topic(), Some(&viewer()));
        assert!(unfollowed.states.contains(&TopicState::NotFollowing));
        assert!(!unfollowed.states.contains(&TopicState::Following));

        let following = ViewerState {
            follow: Some(FollowView {
                reason: Some(FollowReason::Manual),
            }),
            ..viewer()
        };
        let followed = TopicView::resolve(&plain_topic(), Some(&following));
        assert!(followed.states.contains(&TopicState::Following));
        assert!(!followed.states.contains(&TopicState::NotFollowing));
        assert!(followed.followed());
    }

    #[test]
    fn test_read_is_first_state_when_caught_up() {
        let topic = TopicSnapshot {
            locked: true,
            sticky: true,
            ..plain_topic()
        };
        let caught_up = ViewerState {
            read_state: Some(read_state("2024-01-15 12:02:00.000", 4)),
            ..viewer()
        };
        let view = TopicView::resolve(&topic, Some(&caught_up));
        assert_eq!(view.states[0], TopicState::Read);
        assert!(!view.states.contains(&TopicState::Unread));
        assert!(view.read());
        assert_eq!(view.page, 4);
    }

    #[test]
    fn test_unread_is_first_state_without_read_state() {
        let view = TopicView::resolve(&plain_topic(), Some(&viewer()));
        assert_eq!(view.states[0], TopicState::Unread);
        assert_eq!(view.states, vec![TopicState::Unread, TopicState::NotFollowing]);
        assert_eq!(view.page, 1);
    }

    #[test]
    fn test_unread_is_first_state_with_unread_post() {
        let topic = TopicSnapshot {
            first_unread_post: Some(post_ref(2, "2024-01-15 12:01:00.000")),
            ..plain_topic()
        };
        let behind = ViewerState {
            read_state: Some(read_state("2024-01-15 12:00:30.000", 1)),
            ..viewer()
        };
        let view = TopicView::resolve(&topic, Some(&behind));
        assert_eq!(view.states[0], TopicState::Unread);
        assert!(!view.read());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let topic = TopicSnapshot {
            locked: true,
            first_unread_post: Some(post_ref(2, "2024-01-15 12:01:00.000")),
            ..plain_topic()
        };
        let state = ViewerState {
            read_state: Some(read_state("2024-01-15 12:00:30.000", 2)),
            follow: Some(FollowView {
                reason: Some(FollowReason::Posted),
            }),
            can_moderate: true,
        };
        let first = TopicView::resolve(&topic, Some(&state));
        let second = TopicView::resolve(&topic, Some(&state));
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_topic_has_no_anchor() {
        let topic = TopicSnapshot {
            locked: false,
            sticky: false,
            first_unread_post: None,
            last_post: None,
        };
        let view = TopicView::resolve(&topic, Some(&viewer()));
        assert_eq!(view.anchor, None);
    }

    #[test]
    fn test_anchor_falls_back_to_last_post() {
        let view = TopicView::resolve(&plain_topic(), Some(&viewer()));
        assert_eq!(view.anchor, Some(3));
    }

    #[test]
    fn test_first_unread_post_wins_over_newer_last_post() {
        let topic = TopicSnapshot {
            first_unread_post: Some(post_ref(2, "2024-01-15 12:01:00.000")),
            ..plain_topic()
        };
        let view = TopicView::resolve(&topic, Some(&viewer()));
        assert_eq!(view.anchor, Some(2));
    }

    #[test]
    fn test_post_marked_unread_resets_presentation() {
        // Three posts; the viewer had read through post 2, then post 2 was
        // marked unread, so the store reports it as the first unread post.
        let topic = TopicSnapshot {
            locked: false,
            sticky: false,
            first_unread_post: Some(post_ref(2, "2024-01-15 12:01:00.000")),
            last_post: Some(post_ref(3, "2024-01-15 12:02:00.000")),
        };
        let state = ViewerState {
            read_state: Some(read_state("2024-01-15 12:00:00.000", 1)),
            ..viewer()
        };
        let view = TopicView::resolve(&topic, Some(&state));
        assert_eq!(view.states[0], TopicState::Unread);
        assert_eq!(view.anchor, Some(2));
    }

    #[test]
    fn test_can_moderate_passthrough() {
        let moderator = ViewerState {
            can_moderate: true,
            ..viewer()
        };
        assert!(TopicView::resolve(&plain_topic(), Some(&moderator)).can_moderate);
        assert!(!TopicView::resolve(&plain_topic(), None).can_moderate);
    }

    #[test]
    fn test_css_class_joins_states() {
        let topic = TopicSnapshot {
            locked: true,
            ..plain_topic()
        };
        let view = TopicView::resolve(&topic, Some(&viewer()));
        assert_eq!(view.css_class(), "topic-unread topic-locked topic-notfollowing");
    }
}
