//! Pagination component for navigating through multi-page content.
//!
//! This module provides a reusable pagination component that renders
//! navigation controls with first, previous, page numbers, next, and last
//! links.

use maud::{html, Markup, Render};

/// Pagination component for topic lists and post pages.
///
/// Displays: Prev, current-2, current-1, current, current+1, current+2, Next.
/// Automatically hides if there's only 1 page. Pages are 1-based, matching
/// the `?page=` query parameter.
#[derive(Debug, Clone)]
pub struct Pagination {
    /// Current page number (1-based)
    pub current_page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Base URL for page links (the page query param will be appended)
    pub base_url: String,
}

impl Pagination {
    /// Create a new pagination component.
    #[must_use]
    pub fn new(current_page: i64, total_pages: i64, base_url: &str) -> Self {
        Self {
            current_page: current_page.max(1),
            total_pages: total_pages.max(1),
            base_url: base_url.to_string(),
        }
    }

    /// Build URL for a specific page number. Page 1 links to the bare URL.
    fn build_url(&self, page_num: i64) -> String {
        if page_num <= 1 {
            self.base_url.clone()
        } else {
            format!("{}?page={page_num}", self.base_url)
        }
    }

    /// Check if pagination should be displayed.
    #[must_use]
    pub fn should_display(&self) -> bool {
        self.total_pages > 1
    }
}

impl Render for Pagination {
    fn render(&self) -> Markup {
        // Don't render anything if only one page
        if !self.should_display() {
            return html! {};
        }

        let current = self.current_page;
        let total = self.total_pages;

        // Calculate the range of page numbers to display
        let start = (current - 2).max(1);
        let end = (current + 2).min(total);

        html! {
            nav class="pagination" {
                // Previous button
                @if current > 1 {
                    a href=(self.build_url(current - 1)) { "\u{00ab} Previous" }
                } @else {
                    span class="disabled" { "\u{00ab} Previous" }
                }

                // First page and ellipsis if needed
                @if start > 1 {
                    a href=(self.build_url(1)) { "1" }
                    @if start > 2 {
                        span { "..." }
                    }
                }

                // Page numbers around current page
                @for page_num in start..=end {
                    @if page_num == current {
                        span class="current" { (page_num) }
                    } @else {
                        a href=(self.build_url(page_num)) { (page_num) }
                    }
                }

                // Ellipsis and last page if needed
                @if end < total {
                    @if end < total - 1 {
                        span { "..." }
                    }
                    a href=(self.build_url(total)) { (total) }
                }

                // Next button
                @if current < total {
                    a href=(self.build_url(current + 1)) { "Next \u{00bb}" }
                } @else {
                    span class="disabled" { "Next \u{00bb}" }
                }
            }
        }
    }
}
