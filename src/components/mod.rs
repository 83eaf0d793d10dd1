//! Maud HTML template components for the forum UI.
//!
//! This module provides reusable maud components for generating HTML.
//! Components are organized into submodules by functionality:
//!
//! - `layout`: Base page layout and navigation
//! - `badge`: Topic state badges (read/unread, locked, sticky, following)
//! - `pagination`: Page navigation controls

pub mod badge;
pub mod layout;
pub mod pagination;

// Re-export layout components
pub use layout::BaseLayout;

// Re-export badge components
pub use badge::{Badge, TopicStateBadge, TopicStateBadges};

// Re-export pagination components
pub use pagination::Pagination;
