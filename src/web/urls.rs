//! Forum URL construction.
//!
//! All paths are relative to wherever the host application nests the forum
//! router, so the builders emit root-relative paths and the host's nesting
//! prefix (if any) is prepended by the browser-visible mount point.

use urlencoding::encode;

use crate::constants::POST_ANCHOR_PREFIX;

/// Path to a messageboard's topic list.
#[must_use]
pub fn messageboard_path(board_slug: &str) -> String {
    format!("/{}", encode(board_slug))
}

/// Path to a topic, including the page to open and the post to scroll to.
///
/// Page 1 is the bare path; the anchor is omitted for empty topics.
#[must_use]
pub fn topic_path(board_slug: &str, topic_slug: &str, page: i64, anchor: Option<i64>) -> String {
    let mut path = format!("/{}/{}", encode(board_slug), encode(topic_slug));
    if page > 1 {
        path.push_str(&format!("?page={page}"));
    }
    if let Some(post_id) = anchor {
        path.push_str(&format!("#{POST_ANCHOR_PREFIX}{post_id}"));
    }
    path
}

/// Path for creating a topic in a messageboard.
#[must_use]
pub fn new_topic_path(board_slug: &str) -> String {
    format!("/{}/topics", encode(board_slug))
}

/// Path for replying to a topic.
#[must_use]
pub fn new_post_path(board_slug: &str, topic_slug: &str) -> String {
    format!("/{}/{}/posts", encode(board_slug), encode(topic_slug))
}

/// Path for following a topic.
#[must_use]
pub fn follow_path(board_slug: &str, topic_slug: &str) -> String {
    format!("/{}/{}/follow", encode(board_slug), encode(topic_slug))
}

/// Path for unfollowing a topic.
#[must_use]
pub fn unfollow_path(board_slug: &str, topic_slug: &str) -> String {
    format!("/{}/{}/unfollow", encode(board_slug), encode(topic_slug))
}

/// Path for marking a post as unread.
#[must_use]
pub fn mark_unread_path(board_slug: &str, topic_slug: &str, post_id: i64) -> String {
    format!(
        "/{}/{}/posts/{post_id}/unread",
        encode(board_slug),
        encode(topic_slug)
    )
}

/// Path for a moderation action (`lock`, `unlock`, `stick`, `unstick`,
/// `delete`).
#[must_use]
pub fn moderation_path(board_slug: &str, topic_slug: &str, action: &str) -> String {
    format!("/{}/{}/{action}", encode(board_slug), encode(topic_slug))
}

/// Anchor id attribute value for a post (`post_42`).
#[must_use]
pub fn post_anchor(post_id: i64) -> String {
    format!("{POST_ANCHOR_PREFIX}{post_id}")
}
