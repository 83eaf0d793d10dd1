//! Topic list page templates using maud.

use chrono::NaiveDateTime;
use maud::{html, Markup, Render};

use crate::components::{BaseLayout, Pagination, TopicStateBadges};
use crate::db::{Messageboard, Topic};
use crate::user::ForumUser;
use crate::views::TopicView;
use crate::web::urls;

/// Format a stored datetime string into a more readable format.
/// Input: "2024-01-15 12:34:56.789"
/// Output: "Jan 15, 2024 12:34"
pub(crate) fn format_datetime(datetime_str: &str) -> String {
    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map_or_else(
            || datetime_str.to_string(),
            |dt| dt.format("%b %d, %Y %H:%M").to_string(),
        )
}

/// A single row in the topic list.
///
/// The row's link target comes from the per-viewer presentation: it opens the
/// viewer's last read page and jumps to the first unread post (or the latest
/// post when the viewer is caught up).
#[derive(Debug, Clone)]
pub struct TopicRow<'a> {
    pub board: &'a Messageboard,
    pub topic: &'a Topic,
    pub view: &'a TopicView,
}

impl<'a> TopicRow<'a> {
    #[must_use]
    pub const fn new(board: &'a Messageboard, topic: &'a Topic, view: &'a TopicView) -> Self {
        Self { board, topic, view }
    }
}

impl Render for TopicRow<'_> {
    fn render(&self) -> Markup {
        let href = urls::topic_path(
            &self.board.slug,
            &self.topic.slug,
            self.view.page,
            self.view.anchor,
        );
        let last_activity = self
            .topic
            .last_post_at
            .as_deref()
            .map_or_else(|| "-".to_string(), format_datetime);

        html! {
            tr class=(self.view.css_class()) {
                td class="topic-title" {
                    a href=(href) { (self.topic.title) }
                    " "
                    (TopicStateBadges::new(&self.view.states))
                }
                td class="topic-posts" { (self.topic.posts_count) }
                td class="topic-activity" { (last_activity) }
            }
        }
    }
}

/// Parameters for the topic list page.
#[derive(Debug, Clone)]
pub struct TopicListParams<'a> {
    pub board: &'a Messageboard,
    /// Topics paired with their per-viewer presentation, in display order.
    pub rows: &'a [(Topic, TopicView)],
    pub page: i64,
    pub total_pages: i64,
    pub viewer: Option<&'a ForumUser>,
}

/// Render a messageboard's topic list page.
#[must_use]
pub fn render_topic_list_page(params: &TopicListParams<'_>) -> Markup {
    let content = html! {
        h1 { (params.board.name) }
        @if let Some(description) = &params.board.description {
            p class="board-description" { (description) }
        }

        @if params.rows.is_empty() {
            p class="empty-state" { "No topics yet." }
        } @else {
            table class="topic-list" {
                thead {
                    tr {
                        th { "Topic" }
                        th { "Posts" }
                        th { "Last activity" }
                    }
                }
                tbody {
                    @for (topic, view) in params.rows {
                        (TopicRow::new(params.board, topic, view))
                    }
                }
            }

            (Pagination::new(params.page, params.total_pages, &urls::messageboard_path(&params.board.slug)))
        }

        @if params.viewer.is_some() {
            section class="new-topic" {
                h2 { "New topic" }
                form method="post" action=(urls::new_topic_path(&params.board.slug)) {
                    label { "Title"
                        input type="text" name="title" required;
                    }
                    label { "Post"
                        textarea name="content" rows="6" required {}
                    }
                    button type="submit" { "Create topic" }
                }
            }
        }
    };

    BaseLayout::new(&params.board.name, params.viewer).render(content)
}
