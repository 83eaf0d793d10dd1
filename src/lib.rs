//! Forum engine library.
//!
//! An embeddable discussion forum for axum applications: messageboards,
//! topics, posts, per-user read/follow state, and moderation, persisted in
//! SQLite. The host application owns authentication and mounts the forum
//! router under a path of its choosing.

pub mod components;
pub mod config;
pub mod constants;
pub mod db;
pub mod policy;
pub mod user;
pub mod views;
pub mod web;
