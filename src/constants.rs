//! Shared constants used across the forum engine.

/// Default number of posts shown per topic page.
pub const POSTS_PER_PAGE: i64 = 25;

/// Default number of topics shown per messageboard page.
pub const TOPICS_PER_PAGE: i64 = 50;

/// Anchor id prefix for deep-linking to a post within a topic page.
///
/// A post with id 42 renders as `<article id="post_42">` and deep links use
/// the `#post_42` fragment.
pub const POST_ANCHOR_PREFIX: &str = "post_";

/// Maximum length of a generated slug, in bytes.
pub const MAX_SLUG_LEN: usize = 80;
