use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if current_version < 2 {
        debug!("Running migration v2");
        run_migration_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    if current_version < 3 {
        debug!("Running migration v3");
        run_migration_v3(pool).await?;
        set_schema_version(pool, 3).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating initial forum schema");

    // All timestamp columns use the `%Y-%m-%d %H:%M:%f` strftime format so
    // lexicographic comparison equals chronological comparison, including the
    // read_at vs created_at comparisons in the read-state queries.

    // Messageboards table
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS messageboards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            topics_count INTEGER NOT NULL DEFAULT 0,
            posts_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create messageboards table")?;

    // Topics table
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            messageboard_id INTEGER NOT NULL REFERENCES messageboards(id) ON DELETE CASCADE,
            slug TEXT NOT NULL,
            title TEXT NOT NULL,
            locked INTEGER NOT NULL DEFAULT 0,
            sticky INTEGER NOT NULL DEFAULT 0,
            posts_count INTEGER NOT NULL DEFAULT 0,
            last_post_at TEXT,
            user_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
            UNIQUE (messageboard_id, slug)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create topics table")?;

    // Posts table
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
            user_id INTEGER,
            author_name TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create posts table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_topic_created ON posts(topic_id, created_at, id)")
        .execute(pool)
        .await
        .context("Failed to create posts index")?;

    // Read states: at most one row per (user, topic)
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS user_topic_read_states (
            user_id INTEGER NOT NULL,
            topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
            read_at TEXT NOT NULL,
            page INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (user_id, topic_id)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create user_topic_read_states table")?;

    // Follows: at most one row per (user, topic); existence implies following
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS user_topic_follows (
            user_id INTEGER NOT NULL,
            topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
            PRIMARY KEY (user_id, topic_id)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create user_topic_follows table")?;

    Ok(())
}

async fn run_migration_v2(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v2: follow reason");

    sqlx::query("ALTER TABLE user_topic_follows ADD COLUMN reason TEXT")
        .execute(pool)
        .await
        .context("Failed to add reason column to user_topic_follows")?;

    Ok(())
}

async fn run_migration_v3(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v3: topic list index");

    // Topic listings sort stickies first, then by latest activity.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_topics_board_sticky_activity
         ON topics(messageboard_id, sticky, last_post_at)",
    )
    .execute(pool)
    .await
    .context("Failed to create topics listing index")?;

    Ok(())
}
