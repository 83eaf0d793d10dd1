//! Messageboard index page templates using maud.

use maud::{html, Markup, Render};

use crate::components::BaseLayout;
use crate::db::Messageboard;
use crate::user::ForumUser;
use crate::web::urls;

/// A card component for displaying a messageboard summary.
#[derive(Debug, Clone)]
pub struct MessageboardCard<'a> {
    pub board: &'a Messageboard,
}

impl<'a> MessageboardCard<'a> {
    #[must_use]
    pub const fn new(board: &'a Messageboard) -> Self {
        Self { board }
    }
}

impl Render for MessageboardCard<'_> {
    fn render(&self) -> Markup {
        let board = self.board;
        html! {
            article class="messageboard-card" {
                header {
                    h3 {
                        a href=(urls::messageboard_path(&board.slug)) { (board.name) }
                    }
                }
                @if let Some(description) = &board.description {
                    p { (description) }
                }
                footer class="meta" {
                    span { (board.topics_count) " topics" }
                    " \u{00b7} "
                    span { (board.posts_count) " posts" }
                }
            }
        }
    }
}

/// Parameters for the messageboard index page.
#[derive(Debug, Clone)]
pub struct IndexParams<'a> {
    pub boards: &'a [Messageboard],
    pub viewer: Option<&'a ForumUser>,
}

/// Render the messageboard index page.
#[must_use]
pub fn render_index_page(params: &IndexParams<'_>) -> Markup {
    let content = html! {
        h1 { "Messageboards" }

        @if params.boards.is_empty() {
            p class="empty-state" { "No messageboards yet." }
        } @else {
            div class="messageboard-grid" {
                @for board in params.boards {
                    (MessageboardCard::new(board))
                }
            }
        }

        // Only admins may create messageboards
        @if params.viewer.is_some_and(|u| u.admin) {
            section class="new-messageboard" {
                h2 { "New messageboard" }
                form method="post" action="/messageboards" {
                    label { "Name"
                        input type="text" name="name" required;
                    }
                    label { "Description"
                        input type="text" name="description";
                    }
                    button type="submit" { "Create" }
                }
            }
        }
    };

    BaseLayout::new("Messageboards", params.viewer).render(content)
}
