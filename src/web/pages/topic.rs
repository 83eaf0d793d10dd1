//! Topic detail page templates using maud.

use maud::{html, Markup, Render};

use crate::components::{BaseLayout, Pagination, TopicStateBadges};
use crate::db::{Messageboard, Post, Topic};
use crate::user::ForumUser;
use crate::views::TopicView;
use crate::web::pages::topics::format_datetime;
use crate::web::urls;

/// A single post within a topic page.
///
/// The article carries the `post_<id>` anchor that topic links deep-link to.
#[derive(Debug, Clone)]
pub struct PostCard<'a> {
    pub board: &'a Messageboard,
    pub topic: &'a Topic,
    pub post: &'a Post,
    /// Whether to offer the mark-unread control (signed-in viewers only).
    pub can_mark_unread: bool,
}

impl Render for PostCard<'_> {
    fn render(&self) -> Markup {
        let post = self.post;
        html! {
            article id=(urls::post_anchor(post.id)) class="post" {
                header class="post-meta" {
                    strong { (post.author_name) }
                    " \u{00b7} "
                    time { (format_datetime(&post.created_at)) }
                }
                div class="post-content" {
                    @for paragraph in post.content.split("\n\n") {
                        p { (paragraph) }
                    }
                }
                @if self.can_mark_unread {
                    footer {
                        form method="post"
                             action=(urls::mark_unread_path(&self.board.slug, &self.topic.slug, post.id)) {
                            button type="submit" class="outline mark-unread" { "Mark unread from here" }
                        }
                    }
                }
            }
        }
    }
}

/// Follow or unfollow button, keyed off the viewer's current follow state.
#[derive(Debug, Clone)]
pub struct FollowButton<'a> {
    pub board: &'a Messageboard,
    pub topic: &'a Topic,
    pub followed: bool,
}

impl Render for FollowButton<'_> {
    fn render(&self) -> Markup {
        if self.followed {
            html! {
                form method="post" action=(urls::unfollow_path(&self.board.slug, &self.topic.slug)) {
                    button type="submit" class="outline" { "Unfollow" }
                }
            }
        } else {
            html! {
                form method="post" action=(urls::follow_path(&self.board.slug, &self.topic.slug)) {
                    button type="submit" { "Follow" }
                }
            }
        }
    }
}

/// Moderation controls for lock/stick/delete, shown when the policy allows.
#[derive(Debug, Clone)]
pub struct ModerationControls<'a> {
    pub board: &'a Messageboard,
    pub topic: &'a Topic,
}

impl Render for ModerationControls<'_> {
    fn render(&self) -> Markup {
        let board = &self.board.slug;
        let topic = &self.topic.slug;
        let lock_action = if self.topic.locked { "unlock" } else { "lock" };
        let lock_label = if self.topic.locked { "Unlock" } else { "Lock" };
        let stick_action = if self.topic.sticky { "unstick" } else { "stick" };
        let stick_label = if self.topic.sticky { "Unstick" } else { "Stick" };

        html! {
            div class="moderation-controls" {
                form method="post" action=(urls::moderation_path(board, topic, lock_action)) {
                    button type="submit" class="outline" { (lock_label) }
                }
                form method="post" action=(urls::moderation_path(board, topic, stick_action)) {
                    button type="submit" class="outline" { (stick_label) }
                }
                form method="post" action=(urls::moderation_path(board, topic, "delete")) {
                    button type="submit" class="outline danger" { "Delete topic" }
                }
            }
        }
    }
}

/// Parameters for the topic detail page.
#[derive(Debug, Clone)]
pub struct TopicPageParams<'a> {
    pub board: &'a Messageboard,
    pub topic: &'a Topic,
    pub view: &'a TopicView,
    pub posts: &'a [Post],
    pub page: i64,
    pub total_pages: i64,
    pub viewer: Option<&'a ForumUser>,
    /// Follower count, already gated by configuration: `None` hides it.
    pub follower_count: Option<i64>,
}

/// Render the topic detail page.
#[must_use]
pub fn render_topic_page(params: &TopicPageParams<'_>) -> Markup {
    let board = params.board;
    let topic = params.topic;
    let signed_in = params.viewer.is_some();
    let can_reply = signed_in && (!topic.locked || params.view.can_moderate);

    let content = html! {
        nav class="breadcrumbs" {
            a href="/" { "Messageboards" }
            " / "
            a href=(urls::messageboard_path(&board.slug)) { (board.name) }
        }

        header class="topic-header" {
            h1 {
                (topic.title)
                " "
                (TopicStateBadges::new(&params.view.states))
            }
            @if let Some(count) = params.follower_count {
                p class="meta" { (count) " follower" @if count != 1 { "s" } }
            }
            @if signed_in {
                (FollowButton { board, topic, followed: params.view.followed() })
            }
            @if params.view.can_moderate {
                (ModerationControls { board, topic })
            }
        }

        section class="posts" {
            @for post in params.posts {
                (PostCard { board, topic, post, can_mark_unread: signed_in })
            }
        }

        (Pagination::new(params.page, params.total_pages, &urls::topic_path(&board.slug, &topic.slug, 1, None)))

        @if can_reply {
            section class="reply" {
                h2 { "Reply" }
                form method="post" action=(urls::new_post_path(&board.slug, &topic.slug)) {
                    textarea name="content" rows="6" required {}
                    button type="submit" { "Post reply" }
                }
            }
        } @else if topic.locked {
            p class="locked-notice" { "This topic is locked." }
        }
    };

    BaseLayout::new(&topic.title, params.viewer).render(content)
}
