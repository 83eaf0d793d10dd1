//! Badge components for topic state indicators.
//!
//! This module provides maud components for rendering the read/unread,
//! locked, sticky, and follow badges shown on topic rows and topic pages.

use maud::{html, Markup, Render};

use crate::views::TopicState;

/// Display metadata for a topic state tag.
trait TopicStateDisplay {
    fn label(&self) -> &'static str;
    fn title(&self) -> &'static str;
}

impl TopicStateDisplay for TopicState {
    fn label(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Unread => "unread",
            Self::Locked => "locked",
            Self::Sticky => "sticky",
            Self::Following => "following",
            Self::NotFollowing => "not following",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Read => "You have read every post in this topic",
            Self::Unread => "This topic has posts you have not read",
            Self::Locked => "This topic is locked; no new posts can be added",
            Self::Sticky => "This topic is pinned to the top of the board",
            Self::Following => "You are notified about new posts in this topic",
            Self::NotFollowing => "You are not following this topic",
        }
    }
}

/// A badge for a single topic state tag.
#[derive(Debug, Clone, Copy)]
pub struct TopicStateBadge {
    pub state: TopicState,
}

impl TopicStateBadge {
    #[must_use]
    pub const fn new(state: TopicState) -> Self {
        Self { state }
    }
}

impl Render for TopicStateBadge {
    fn render(&self) -> Markup {
        html! {
            span class=(format!("topic-badge {}", self.state.css_class())) title=(self.state.title()) {
                (self.state.label())
            }
        }
    }
}

/// The full row of state badges for a topic.
///
/// The not-following tag is carried in the state list so the follow button can
/// key off it, but it is not rendered as a badge; an absent "following" badge
/// says the same thing with less noise.
#[derive(Debug, Clone)]
pub struct TopicStateBadges<'a> {
    pub states: &'a [TopicState],
}

impl<'a> TopicStateBadges<'a> {
    #[must_use]
    pub const fn new(states: &'a [TopicState]) -> Self {
        Self { states }
    }
}

impl Render for TopicStateBadges<'_> {
    fn render(&self) -> Markup {
        html! {
            @for state in self.states {
                @if *state != TopicState::NotFollowing {
                    (TopicStateBadge::new(*state))
                    " "
                }
            }
        }
    }
}

/// A generic badge component with custom class and content.
#[derive(Debug, Clone)]
pub struct Badge<'a> {
    pub content: &'a str,
    pub class: &'a str,
}

impl<'a> Badge<'a> {
    #[must_use]
    pub const fn new(content: &'a str, class: &'a str) -> Self {
        Self { content, class }
    }
}

impl Render for Badge<'_> {
    fn render(&self) -> Markup {
        html! {
            span class=(self.class) {
                (self.content)
            }
        }
    }
}
