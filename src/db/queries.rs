use anyhow::{bail, Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{
    FollowReason, Messageboard, NewMessageboard, NewPost, NewTopic, Post, Topic, UserTopicFollow,
    UserTopicReadState,
};
use crate::constants::MAX_SLUG_LEN;

/// Current UTC time in the same `%Y-%m-%d %H:%M:%f` format SQLite's strftime
/// defaults use, so Rust-side and database-side timestamps stay comparable.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Derive a URL-safe slug from a title.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "topic".to_string()
    } else {
        slug
    }
}

// ========== Messageboards ==========

/// Create a messageboard, returning its ID. The slug is derived from the name
/// and suffixed with a counter when taken.
pub async fn create_messageboard(pool: &SqlitePool, board: &NewMessageboard) -> Result<i64> {
    let slug = free_messageboard_slug(pool, &slugify(&board.name)).await?;

    let result = sqlx::query(
        r"
        INSERT INTO messageboards (slug, name, description)
        VALUES (?, ?, ?)
        ",
    )
    .bind(&slug)
    .bind(&board.name)
    .bind(&board.description)
    .execute(pool)
    .await
    .context("Failed to insert messageboard")?;

    Ok(result.last_insert_rowid())
}

async fn free_messageboard_slug(pool: &SqlitePool, base: &str) -> Result<String> {
    let mut candidate = base.to_string();
    let mut n = 1;
    loop {
        let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM messageboards WHERE slug = ?")
            .bind(&candidate)
            .fetch_optional(pool)
            .await
            .context("Failed to check messageboard slug")?;
        if taken.is_none() {
            return Ok(candidate);
        }
        n += 1;
        candidate = format!("{base}-{n}");
    }
}

/// List all messageboards, ordered by name.
pub async fn list_messageboards(pool: &SqlitePool) -> Result<Vec<Messageboard>> {
    sqlx::query_as("SELECT * FROM messageboards ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list messageboards")
}

/// Get a messageboard by its slug.
pub async fn get_messageboard_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<Messageboard>> {
    sqlx::query_as("SELECT * FROM messageboards WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch messageboard by slug")
}

/// Get a messageboard by ID.
pub async fn get_messageboard(pool: &SqlitePool, id: i64) -> Result<Option<Messageboard>> {
    sqlx::query_as("SELECT * FROM messageboards WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch messageboard")
}

/// Delete a messageboard. Topics, posts, read states, and follows go with it
/// via foreign-key cascades.
pub async fn delete_messageboard(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM messageboards WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete messageboard")?;
    Ok(())
}

// ========== Topics ==========

/// Create a topic together with its first post, maintaining the counter
/// caches on the topic and its messageboard. Returns the new topic's ID.
pub async fn create_topic(pool: &SqlitePool, topic: &NewTopic) -> Result<i64> {
    let slug = free_topic_slug(pool, topic.messageboard_id, &slugify(&topic.title)).await?;
    let now = now_timestamp();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r"
        INSERT INTO topics (messageboard_id, slug, title, user_id, posts_count, last_post_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?, ?)
        ",
    )
    .bind(topic.messageboard_id)
    .bind(&slug)
    .bind(&topic.title)
    .bind(topic.user_id)
    .bind(&now)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .context("Failed to insert topic")?;

    let topic_id = result.last_insert_rowid();

    sqlx::query(
        r"
        INSERT INTO posts (topic_id, user_id, author_name, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(topic_id)
    .bind(topic.user_id)
    .bind(&topic.author_name)
    .bind(&topic.content)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .context("Failed to insert first post")?;

    sqlx::query(
        r"
        UPDATE messageboards
        SET topics_count = topics_count + 1, posts_count = posts_count + 1
        WHERE id = ?
        ",
    )
    .bind(topic.messageboard_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update messageboard counters")?;

    tx.commit().await.context("Failed to commit new topic")?;

    Ok(topic_id)
}

async fn free_topic_slug(pool: &SqlitePool, messageboard_id: i64, base: &str) -> Result<String> {
    let mut candidate = base.to_string();
    let mut n = 1;
    loop {
        let taken: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM topics WHERE messageboard_id = ? AND slug = ?")
                .bind(messageboard_id)
                .bind(&candidate)
                .fetch_optional(pool)
                .await
                .context("Failed to check topic slug")?;
        if taken.is_none() {
            return Ok(candidate);
        }
        n += 1;
        candidate = format!("{base}-{n}");
    }
}

/// Get a topic by ID.
pub async fn get_topic(pool: &SqlitePool, id: i64) -> Result<Option<Topic>> {
    sqlx::query_as("SELECT * FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch topic")
}

/// Get a topic by its slug within a messageboard.
pub async fn get_topic_by_slug(
    pool: &SqlitePool,
    messageboard_id: i64,
    slug: &str,
) -> Result<Option<Topic>> {
    sqlx::query_as("SELECT * FROM topics WHERE messageboard_id = ? AND slug = ?")
        .bind(messageboard_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch topic by slug")
}

/// List topics in a messageboard: stickies first, then by latest activity.
pub async fn list_topics(
    pool: &SqlitePool,
    messageboard_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Topic>> {
    sqlx::query_as(
        r"
        SELECT * FROM topics
        WHERE messageboard_id = ?
        ORDER BY sticky DESC, last_post_at DESC, id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(messageboard_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list topics")
}

/// Count topics in a messageboard.
pub async fn count_topics(pool: &SqlitePool, messageboard_id: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE messageboard_id = ?")
        .bind(messageboard_id)
        .fetch_one(pool)
        .await
        .context("Failed to count topics")?;
    Ok(count)
}

/// Lock or unlock a topic.
pub async fn set_topic_locked(pool: &SqlitePool, topic_id: i64, locked: bool) -> Result<()> {
    sqlx::query("UPDATE topics SET locked = ?, updated_at = ? WHERE id = ?")
        .bind(locked)
        .bind(now_timestamp())
        .bind(topic_id)
        .execute(pool)
        .await
        .context("Failed to set topic locked flag")?;
    Ok(())
}

/// Stick or unstick a topic.
pub async fn set_topic_sticky(pool: &SqlitePool, topic_id: i64, sticky: bool) -> Result<()> {
    sqlx::query("UPDATE topics SET sticky = ?, updated_at = ? WHERE id = ?")
        .bind(sticky)
        .bind(now_timestamp())
        .bind(topic_id)
        .execute(pool)
        .await
        .context("Failed to set topic sticky flag")?;
    Ok(())
}

/// Delete a topic, adjusting the messageboard counter caches. Posts, read
/// states, and follows are removed by foreign-key cascades.
pub async fn delete_topic(pool: &SqlitePool, topic_id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let topic: Option<Topic> = sqlx::query_as("SELECT * FROM topics WHERE id = ?")
        .bind(topic_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch topic for deletion")?;

    let Some(topic) = topic else {
        return Ok(());
    };

    sqlx::query(
        r"
        UPDATE messageboards
        SET topics_count = topics_count - 1, posts_count = posts_count - ?
        WHERE id = ?
        ",
    )
    .bind(topic.posts_count)
    .bind(topic.messageboard_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update messageboard counters")?;

    sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(topic_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete topic")?;

    tx.commit().await.context("Failed to commit topic deletion")?;
    Ok(())
}

// ========== Posts ==========

/// Insert a post into an existing topic, maintaining the counter caches.
/// Returns the new post's ID.
pub async fn insert_post(pool: &SqlitePool, post: &NewPost) -> Result<i64> {
    let now = now_timestamp();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let topic: Option<(i64,)> = sqlx::query_as("SELECT messageboard_id FROM topics WHERE id = ?")
        .bind(post.topic_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch topic for post")?;

    let Some((messageboard_id,)) = topic else {
        bail!("topic {} does not exist", post.topic_id);
    };

    let result = sqlx::query(
        r"
        INSERT INTO posts (topic_id, user_id, author_name, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(post.topic_id)
    .bind(post.user_id)
    .bind(&post.author_name)
    .bind(&post.content)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .context("Failed to insert post")?;

    sqlx::query(
        r"
        UPDATE topics
        SET posts_count = posts_count + 1, last_post_at = ?, updated_at = ?
        WHERE id = ?
        ",
    )
    .bind(&now)
    .bind(&now)
    .bind(post.topic_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update topic counters")?;

    sqlx::query("UPDATE messageboards SET posts_count = posts_count + 1 WHERE id = ?")
        .bind(messageboard_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update messageboard counters")?;

    tx.commit().await.context("Failed to commit new post")?;

    Ok(result.last_insert_rowid())
}

/// Get a post by ID.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")
}

/// List one page of a topic's posts in creation order. `page` is 1-based.
pub async fn list_posts_page(
    pool: &SqlitePool,
    topic_id: i64,
    page: i64,
    per_page: i64,
) -> Result<Vec<Post>> {
    let offset = (page.max(1) - 1) * per_page;
    sqlx::query_as(
        r"
        SELECT * FROM posts
        WHERE topic_id = ?
        ORDER BY created_at, id
        LIMIT ? OFFSET ?
        ",
    )
    .bind(topic_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list posts")
}

/// Count posts in a topic.
pub async fn count_posts(pool: &SqlitePool, topic_id: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE topic_id = ?")
        .bind(topic_id)
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    Ok(count)
}

/// The most recent post in a topic, if any.
pub async fn topic_last_post(pool: &SqlitePool, topic_id: i64) -> Result<Option<Post>> {
    sqlx::query_as(
        r"
        SELECT * FROM posts
        WHERE topic_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        ",
    )
    .bind(topic_id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch last post")
}

// ========== Read states ==========

/// Get a user's read state for a topic, if one exists.
pub async fn find_read_state(
    pool: &SqlitePool,
    user_id: i64,
    topic_id: i64,
) -> Result<Option<UserTopicReadState>> {
    sqlx::query_as("SELECT * FROM user_topic_read_states WHERE user_id = ? AND topic_id = ?")
        .bind(user_id)
        .bind(topic_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch read state")
}

/// Record that a user viewed a topic up to `read_at` on `page`.
///
/// Creates the row on first view. On subsequent views `read_at` only moves
/// forward (timestamps are lexicographically ordered text, so MAX picks the
/// later one); `page` always tracks the page just viewed.
pub async fn upsert_read_state(
    pool: &SqlitePool,
    user_id: i64,
    topic_id: i64,
    read_at: &str,
    page: i64,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO user_topic_read_states (user_id, topic_id, read_at, page)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, topic_id) DO UPDATE SET
            read_at = MAX(read_at, excluded.read_at),
            page = excluded.page
        ",
    )
    .bind(user_id)
    .bind(topic_id)
    .bind(read_at)
    .bind(page)
    .execute(pool)
    .await
    .context("Failed to upsert read state")?;
    Ok(())
}

/// Mark a post as unread for a user: rewind the read position to just before
/// the target post, so the target becomes the first unread post.
///
/// When the target is the earliest post of the topic, the read state row is
/// deleted, returning the user to the never-viewed state.
pub async fn mark_unread(
    pool: &SqlitePool,
    user_id: i64,
    topic_id: i64,
    post_id: i64,
    page: i64,
) -> Result<()> {
    let target: Option<Post> = sqlx::query_as("SELECT * FROM posts WHERE id = ? AND topic_id = ?")
        .bind(post_id)
        .bind(topic_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post to mark unread")?;

    let Some(target) = target else {
        bail!("post {post_id} does not belong to topic {topic_id}");
    };

    // The newest post strictly before the target, in (created_at, id) order.
    let previous: Option<Post> = sqlx::query_as(
        r"
        SELECT * FROM posts
        WHERE topic_id = ?
          AND (created_at < ? OR (created_at = ? AND id < ?))
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        ",
    )
    .bind(topic_id)
    .bind(&target.created_at)
    .bind(&target.created_at)
    .bind(target.id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch preceding post")?;

    match previous {
        Some(previous) => {
            sqlx::query(
                r"
                INSERT INTO user_topic_read_states (user_id, topic_id, read_at, page)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (user_id, topic_id) DO UPDATE SET
                    read_at = excluded.read_at,
                    page = excluded.page
                ",
            )
            .bind(user_id)
            .bind(topic_id)
            .bind(&previous.created_at)
            .bind(page)
            .execute(pool)
            .await
            .context("Failed to rewind read state")?;
        }
        None => {
            sqlx::query("DELETE FROM user_topic_read_states WHERE user_id = ? AND topic_id = ?")
                .bind(user_id)
                .bind(topic_id)
                .execute(pool)
                .await
                .context("Failed to delete read state")?;
        }
    }

    Ok(())
}

/// The earliest post the user has not read yet: the first post created
/// strictly after the user's `read_at`. A post created exactly at `read_at`
/// counts as read. Returns `None` when the user has no read state for the
/// topic (nothing to measure against) or has read everything.
pub async fn first_unread_post(
    pool: &SqlitePool,
    user_id: i64,
    topic_id: i64,
) -> Result<Option<Post>> {
    sqlx::query_as(
        r"
        SELECT p.* FROM posts p
        JOIN user_topic_read_states rs
          ON rs.topic_id = p.topic_id AND rs.user_id = ?
        WHERE p.topic_id = ? AND p.created_at > rs.read_at
        ORDER BY p.created_at, p.id
        LIMIT 1
        ",
    )
    .bind(user_id)
    .bind(topic_id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch first unread post")
}

// ========== Follows ==========

/// Get a user's follow record for a topic, if one exists.
pub async fn find_follow(
    pool: &SqlitePool,
    user_id: i64,
    topic_id: i64,
) -> Result<Option<UserTopicFollow>> {
    sqlx::query_as("SELECT * FROM user_topic_follows WHERE user_id = ? AND topic_id = ?")
        .bind(user_id)
        .bind(topic_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch follow")
}

/// Follow a topic. Idempotent: an existing follow keeps its original reason,
/// so an explicit manual follow is not downgraded by a later auto-follow.
pub async fn follow_topic(
    pool: &SqlitePool,
    user_id: i64,
    topic_id: i64,
    reason: FollowReason,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO user_topic_follows (user_id, topic_id, reason)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id, topic_id) DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(topic_id)
    .bind(reason.as_str())
    .execute(pool)
    .await
    .context("Failed to follow topic")?;
    Ok(())
}

/// Stop following a topic. Idempotent.
pub async fn unfollow_topic(pool: &SqlitePool, user_id: i64, topic_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM user_topic_follows WHERE user_id = ? AND topic_id = ?")
        .bind(user_id)
        .bind(topic_id)
        .execute(pool)
        .await
        .context("Failed to unfollow topic")?;
    Ok(())
}

/// Count a topic's followers.
pub async fn count_followers(pool: &SqlitePool, topic_id: i64) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM user_topic_follows WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_one(pool)
            .await
            .context("Failed to count followers")?;
    Ok(count)
}
