//! Integration tests for the forum web routes: reading topics, follow state,
//! mark-unread, and moderation, exercised through the mounted router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use forum_engine::config::Config;
use forum_engine::db::{
    create_messageboard, create_topic, find_follow, find_read_state, first_unread_post,
    get_topic, insert_post, list_posts_page, upsert_read_state, Database, FollowReason,
    NewMessageboard, NewPost, NewTopic,
};
use forum_engine::user::ForumUser;
use forum_engine::web::{forum, ForumState};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup() -> (Router, Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");

    let config = Config::from_env().expect("Failed to create config");
    let app = forum(ForumState::new(db.clone(), config));

    (app, db, temp_dir)
}

async fn seed_topic(db: &Database) -> (i64, i64) {
    let board_id = create_messageboard(
        db.pool(),
        &NewMessageboard {
            name: "General".to_string(),
            description: None,
        },
    )
    .await
    .expect("Failed to create messageboard");

    let topic_id = create_topic(
        db.pool(),
        &NewTopic {
            messageboard_id: board_id,
            title: "Hello world".to_string(),
            user_id: Some(1),
            author_name: "alex".to_string(),
            content: "First!".to_string(),
        },
    )
    .await
    .expect("Failed to create topic");

    (board_id, topic_id)
}

fn user(id: i64) -> ForumUser {
    ForumUser {
        id,
        name: format!("user-{id}"),
        moderator: false,
        admin: false,
    }
}

fn moderator(id: i64) -> ForumUser {
    ForumUser {
        moderator: true,
        ..user(id)
    }
}

/// Build a GET request, optionally as a signed-in viewer (the host app's
/// middleware would normally inject the extension).
fn get_as(uri: &str, viewer: Option<ForumUser>) -> Request<Body> {
    let mut request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request");
    if let Some(viewer) = viewer {
        request.extensions_mut().insert(viewer);
    }
    request
}

/// Build a form POST request, optionally as a signed-in viewer.
fn post_as(uri: &str, form_body: &str, viewer: Option<ForumUser>) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form_body.to_string()))
        .expect("Failed to build request");
    if let Some(viewer) = viewer {
        request.extensions_mut().insert(viewer);
    }
    request
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

#[tokio::test]
async fn test_health() {
    let (app, _db, _temp_dir) = setup().await;

    let response = app.oneshot(get_as("/healthz", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_index_lists_messageboards() {
    let (app, db, _temp_dir) = setup().await;
    seed_topic(&db).await;

    let response = app.oneshot(get_as("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("General"));
    assert!(body.contains("href=\"/general\""));
}

#[tokio::test]
async fn test_unknown_board_and_topic_are_404() {
    let (app, _db, _temp_dir) = setup().await;

    let response = app
        .clone()
        .oneshot(get_as("/nowhere", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get_as("/nowhere/nothing", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_topic_list_has_only_locked_sticky_badges() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, topic_id) = seed_topic(&db).await;
    forum_engine::db::set_topic_locked(db.pool(), topic_id, true)
        .await
        .unwrap();
    forum_engine::db::set_topic_sticky(db.pool(), topic_id, true)
        .await
        .unwrap();

    let body = body_string(app.oneshot(get_as("/general", None)).await.unwrap()).await;

    assert!(body.contains("topic-locked"));
    assert!(body.contains("topic-sticky"));
    assert!(!body.contains("topic-unread"));
    assert!(!body.contains("topic-read"));
    assert!(!body.contains("topic-following"));
}

#[tokio::test]
async fn test_viewing_a_topic_marks_it_read() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, topic_id) = seed_topic(&db).await;

    // Before viewing: the topic row shows unread and links to the last post.
    let body = body_string(
        app.clone()
            .oneshot(get_as("/general", Some(user(7))))
            .await
            .unwrap(),
    )
    .await;
    assert!(body.contains("topic-unread"));
    assert!(body.contains("#post_"));

    // View the topic.
    let response = app
        .clone()
        .oneshot(get_as("/general/hello-world", Some(user(7))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let state = find_read_state(db.pool(), 7, topic_id).await.unwrap().unwrap();
    assert_eq!(state.page, 1);

    // After viewing: read badge, no unread post left.
    let body = body_string(app.oneshot(get_as("/general", Some(user(7)))).await.unwrap()).await;
    assert!(body.contains("topic-read"));
    assert!(!body.contains("topic-unread"));
    assert!(first_unread_post(db.pool(), 7, topic_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_anonymous_view_records_nothing() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, _topic_id) = seed_topic(&db).await;

    let response = app.oneshot(get_as("/general/hello-world", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No viewer, no read state row for anyone.
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_topic_read_states")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn test_follow_and_unfollow_flow() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, topic_id) = seed_topic(&db).await;

    let response = app
        .clone()
        .oneshot(post_as("/general/hello-world/follow", "", Some(user(7))))
        .await
        .unwrap();
    assert!(response.status().is_redirection());

    let follow = find_follow(db.pool(), 7, topic_id).await.unwrap().unwrap();
    assert_eq!(follow.reason_enum(), Some(FollowReason::Manual));

    let body = body_string(
        app.clone()
            .oneshot(get_as("/general", Some(user(7))))
            .await
            .unwrap(),
    )
    .await;
    assert!(body.contains("topic-following"));

    let response = app
        .clone()
        .oneshot(post_as("/general/hello-world/unfollow", "", Some(user(7))))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert!(find_follow(db.pool(), 7, topic_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_follow_requires_viewer() {
    let (app, _db, _temp_dir) = setup().await;

    let response = app
        .oneshot(post_as("/general/hello-world/follow", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reply_auto_follows_without_downgrading_manual() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, topic_id) = seed_topic(&db).await;

    // Reply as a fresh user: auto-follow with the posted reason.
    let response = app
        .clone()
        .oneshot(post_as(
            "/general/hello-world/posts",
            "content=Nice+thread",
            Some(user(8)),
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());

    let follow = find_follow(db.pool(), 8, topic_id).await.unwrap().unwrap();
    assert_eq!(follow.reason_enum(), Some(FollowReason::Posted));

    // A manual follower who replies keeps the manual reason.
    forum_engine::db::follow_topic(db.pool(), 9, topic_id, FollowReason::Manual)
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(post_as(
            "/general/hello-world/posts",
            "content=Me+too",
            Some(user(9)),
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());

    let follow = find_follow(db.pool(), 9, topic_id).await.unwrap().unwrap();
    assert_eq!(follow.reason_enum(), Some(FollowReason::Manual));

    // The author's own post doesn't count as unread for them.
    assert!(first_unread_post(db.pool(), 9, topic_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_mark_unread_resets_badge_and_anchor() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, topic_id) = seed_topic(&db).await;

    // Pin three posts a day apart.
    let first = list_posts_page(db.pool(), topic_id, 1, 25).await.unwrap()[0].id;
    sqlx::query("UPDATE posts SET created_at = '2024-01-15 12:00:00.000' WHERE id = ?")
        .bind(first)
        .execute(db.pool())
        .await
        .unwrap();
    let second = insert_post(
        db.pool(),
        &NewPost {
            topic_id,
            user_id: Some(2),
            author_name: "beth".to_string(),
            content: "Second".to_string(),
        },
    )
    .await
    .unwrap();
    sqlx::query("UPDATE posts SET created_at = '2024-01-16 12:00:00.000' WHERE id = ?")
        .bind(second)
        .execute(db.pool())
        .await
        .unwrap();
    let third = insert_post(
        db.pool(),
        &NewPost {
            topic_id,
            user_id: Some(3),
            author_name: "carl".to_string(),
            content: "Third".to_string(),
        },
    )
    .await
    .unwrap();
    sqlx::query("UPDATE posts SET created_at = '2024-01-17 12:00:00.000' WHERE id = ?")
        .bind(third)
        .execute(db.pool())
        .await
        .unwrap();

    // Caught up entirely.
    upsert_read_state(db.pool(), 7, topic_id, "2024-01-17 12:00:00.000", 1)
        .await
        .unwrap();

    // Mark the second post unread.
    let response = app
        .clone()
        .oneshot(post_as(
            &format!("/general/hello-world/posts/{second}/unread"),
            "page=1",
            Some(user(7)),
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());

    // The topic row is unread again and deep-links to the marked post, even
    // though a newer post exists.
    let body = body_string(app.oneshot(get_as("/general", Some(user(7)))).await.unwrap()).await;
    assert!(body.contains("topic-unread"));
    assert!(body.contains(&format!("#post_{second}")));
    assert!(!body.contains(&format!("#post_{third}")));
}

#[tokio::test]
async fn test_locked_topic_rejects_replies_from_non_moderators() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, topic_id) = seed_topic(&db).await;
    forum_engine::db::set_topic_locked(db.pool(), topic_id, true)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_as(
            "/general/hello-world/posts",
            "content=Let+me+in",
            Some(user(7)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Moderators can still reply.
    let response = app
        .oneshot(post_as(
            "/general/hello-world/posts",
            "content=Moderator+note",
            Some(moderator(5)),
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
}

#[tokio::test]
async fn test_moderation_requires_policy_approval() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, topic_id) = seed_topic(&db).await;

    let response = app
        .clone()
        .oneshot(post_as("/general/hello-world/lock", "", Some(user(7))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!get_topic(db.pool(), topic_id).await.unwrap().unwrap().locked);

    let response = app
        .clone()
        .oneshot(post_as("/general/hello-world/lock", "", Some(moderator(5))))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert!(get_topic(db.pool(), topic_id).await.unwrap().unwrap().locked);

    let response = app
        .oneshot(post_as("/general/hello-world/unlock", "", Some(moderator(5))))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert!(!get_topic(db.pool(), topic_id).await.unwrap().unwrap().locked);
}

#[tokio::test]
async fn test_create_topic_flow() {
    let (app, db, _temp_dir) = setup().await;
    create_messageboard(
        db.pool(),
        &NewMessageboard {
            name: "General".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    let response = app
        .clone()
        .oneshot(post_as(
            "/general/topics",
            "title=Brand+new&content=Opening+post",
            Some(user(7)),
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());

    let body = body_string(app.oneshot(get_as("/general", Some(user(7)))).await.unwrap()).await;
    assert!(body.contains("Brand new"));

    // The creator auto-follows their topic.
    let board = forum_engine::db::get_messageboard_by_slug(db.pool(), "general")
        .await
        .unwrap()
        .unwrap();
    let topic = forum_engine::db::get_topic_by_slug(db.pool(), board.id, "brand-new")
        .await
        .unwrap()
        .unwrap();
    let follow = find_follow(db.pool(), 7, topic.id).await.unwrap().unwrap();
    assert_eq!(follow.reason_enum(), Some(FollowReason::Posted));
}

#[tokio::test]
async fn test_api_topics_reports_states_and_path() {
    let (app, db, _temp_dir) = setup().await;
    let (_board_id, topic_id) = seed_topic(&db).await;
    forum_engine::db::set_topic_locked(db.pool(), topic_id, true)
        .await
        .unwrap();

    let response = app
        .oneshot(get_as("/api/general/topics", Some(user(7))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(json["count"], 1);
    let topic = &json["data"][0];
    assert_eq!(topic["slug"], "hello-world");
    let states: Vec<&str> = topic["states"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["unread", "locked", "notfollowing"]);
    assert!(topic["path"].as_str().unwrap().starts_with("/general/hello-world#post_"));
}

#[tokio::test]
async fn test_create_messageboard_is_admin_only() {
    let (app, db, _temp_dir) = setup().await;

    let response = app
        .clone()
        .oneshot(post_as("/messageboards", "name=Lounge", Some(user(7))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = ForumUser {
        admin: true,
        ..user(1)
    };
    let response = app
        .oneshot(post_as("/messageboards", "name=Lounge", Some(admin)))
        .await
        .unwrap();
    assert!(response.status().is_redirection());

    assert!(forum_engine::db::get_messageboard_by_slug(db.pool(), "lounge")
        .await
        .unwrap()
        .is_some());
}
