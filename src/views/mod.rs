//! Per-user presentation state, computed from records the web layer has
//! already loaded. Everything in here is pure: no queries, no clocks, no
//! mutation.

pub mod topic_view;

pub use topic_view::{
    FollowView, PostRef, ReadStateView, TopicSnapshot, TopicState, TopicView, ViewerState,
};
