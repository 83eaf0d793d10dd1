//! Base layout components for the forum pages.
//!
//! This module provides the main page layout structure including
//! the HTML skeleton, navigation, and footer.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::user::ForumUser;

/// Critical theme initialization script that runs in <head> to prevent flash
/// of wrong theme. Must be inline (not external) to execute before body
/// renders.
const THEME_INIT_SCRIPT: &str = r#"(function() {
    var theme = localStorage.getItem('theme');
    if (theme) {
        document.documentElement.setAttribute('data-theme', theme);
    } else if (window.matchMedia('(prefers-color-scheme: dark)').matches) {
        document.documentElement.setAttribute('data-theme', 'dark');
    }
})();"#;

/// Base page layout builder.
///
/// The viewer parameter is required so signed-in state is always explicitly
/// handled. Pass `None` for anonymous viewers or `Some(&user)` for signed-in
/// viewers.
#[derive(Debug, Clone)]
pub struct BaseLayout<'a> {
    title: &'a str,
    viewer: Option<&'a ForumUser>,
}

impl<'a> BaseLayout<'a> {
    /// Create a new base layout with the given page title and viewer.
    #[must_use]
    pub fn new(title: &'a str, viewer: Option<&'a ForumUser>) -> Self {
        Self { title, viewer }
    }

    /// Render the complete HTML page with the given content.
    ///
    /// The content will be placed inside the `<main class="container">`
    /// element.
    #[must_use]
    pub fn render(self, content: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" data-theme="light" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    meta name="color-scheme" content="light dark";
                    title { (self.title) " - Forum" }

                    link rel="stylesheet" href="/static/css/forum.css";
                    // Inline critical script to prevent theme flicker
                    script { (PreEscaped(THEME_INIT_SCRIPT)) }
                }
                body {
                    (self.render_header())
                    main class="container" {
                        (content)
                    }
                    (Self::render_footer())
                }
            }
        }
    }

    /// Render the page header with navigation.
    fn render_header(&self) -> Markup {
        html! {
            header class="container" {
                nav {
                    ul {
                        li {
                            a href="/" {
                                strong class="site-logo" { "Forum" }
                            }
                        }
                    }
                    ul {
                        li { a href="/" { "Messageboards" } }
                        (self.render_viewer_nav())
                    }
                }
            }
        }
    }

    /// Render viewer-related navigation items. Sign-in belongs to the host
    /// application, so there is no login link to offer here.
    fn render_viewer_nav(&self) -> Markup {
        match self.viewer {
            Some(u) => html! {
                li { span class="viewer-name" { (u.name) } }
            },
            None => html! {},
        }
    }

    /// Render the page footer.
    fn render_footer() -> Markup {
        html! {
            footer class="container" {
                small { "Powered by forum-engine" }
            }
        }
    }
}
