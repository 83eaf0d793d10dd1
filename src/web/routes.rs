use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Form;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use super::pages::messageboards::{render_index_page, IndexParams};
use super::pages::topic::{render_topic_page, TopicPageParams};
use super::pages::topics::{render_topic_list_page, TopicListParams};
use super::urls;
use super::viewer::{MaybeViewer, RequireViewer};
use super::ForumState;
use crate::db::{
    count_followers, count_posts, count_topics, create_messageboard, create_topic, delete_topic,
    find_follow, find_read_state, first_unread_post, follow_topic, get_messageboard_by_slug,
    get_topic_by_slug, insert_post, list_messageboards, list_posts_page, list_topics, mark_unread,
    set_topic_locked, set_topic_sticky, unfollow_topic, upsert_read_state, FollowReason,
    Messageboard, NewMessageboard, NewPost, NewTopic, Topic,
};
use crate::user::ForumUser;
use crate::views::{FollowView, PostRef, ReadStateView, TopicSnapshot, TopicView, ViewerState};

/// Create the router with all forum routes.
pub fn router() -> Router<ForumState> {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(health))
        .route("/messageboards", post(create_messageboard_handler))
        .route("/api/:board/topics", get(api_topics))
        .route("/:board", get(topic_list))
        .route("/:board/topics", post(create_topic_handler))
        .route("/:board/:topic", get(topic_show))
        .route("/:board/:topic/posts", post(create_post_handler))
        .route("/:board/:topic/follow", post(follow))
        .route("/:board/:topic/unfollow", post(unfollow))
        .route("/:board/:topic/posts/:post_id/unread", post(mark_unread_handler))
        .route("/:board/:topic/lock", post(lock))
        .route("/:board/:topic/unlock", post(unlock))
        .route("/:board/:topic/stick", post(stick))
        .route("/:board/:topic/unstick", post(unstick))
        .route("/:board/:topic/delete", post(delete_topic_handler))
}

// ========== Shared lookups ==========

/// Load a messageboard and one of its topics by slug, or produce the
/// response that ends the request (404 or 500).
async fn load_board_topic(
    state: &ForumState,
    board_slug: &str,
    topic_slug: &str,
) -> Result<(Messageboard, Topic), Response> {
    let board = match get_messageboard_by_slug(state.db.pool(), board_slug).await {
        Ok(Some(b)) => b,
        Ok(None) => return Err((StatusCode::NOT_FOUND, "Messageboard not found").into_response()),
        Err(e) => {
            tracing::error!("Failed to fetch messageboard: {e}");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response());
        }
    };

    let topic = match get_topic_by_slug(state.db.pool(), board.id, topic_slug).await {
        Ok(Some(t)) => t,
        Ok(None) => return Err((StatusCode::NOT_FOUND, "Topic not found").into_response()),
        Err(e) => {
            tracing::error!("Failed to fetch topic: {e}");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response());
        }
    };

    Ok((board, topic))
}

/// Resolve the per-viewer presentation of a topic: snapshot the topic's
/// unread/last post references, load the viewer's read state and follow, ask
/// the policy about moderation, and hand everything to the pure view model.
async fn resolve_topic_view(
    state: &ForumState,
    topic: &Topic,
    viewer: Option<&ForumUser>,
) -> anyhow::Result<TopicView> {
    let pool = state.db.pool();

    let last_post = crate::db::topic_last_post(pool, topic.id).await?;

    let viewer_state = match viewer {
        Some(user) => {
            let read_state = find_read_state(pool, user.id, topic.id).await?;
            let follow = find_follow(pool, user.id, topic.id).await?;
            Some(ViewerState {
                read_state: read_state.as_ref().map(ReadStateView::from),
                follow: follow.as_ref().map(FollowView::from),
                can_moderate: state.policy.can_moderate(user, topic),
            })
        }
        None => None,
    };

    let first_unread = match viewer {
        Some(user) => first_unread_post(pool, user.id, topic.id).await?,
        None => None,
    };

    let snapshot = TopicSnapshot::of(
        topic,
        first_unread.as_ref().map(PostRef::from),
        last_post.as_ref().map(PostRef::from),
    );

    Ok(TopicView::resolve(&snapshot, viewer_state.as_ref()))
}

fn pages_for(count: i64, per_page: i64) -> i64 {
    ((count + per_page - 1) / per_page).max(1)
}

// ========== HTML routes ==========

async fn index(State(state): State<ForumState>, MaybeViewer(viewer): MaybeViewer) -> Response {
    let boards = match list_messageboards(state.db.pool()).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("Failed to list messageboards: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    render_index_page(&IndexParams {
        boards: &boards,
        viewer: viewer.as_ref(),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<i64>,
}

async fn topic_list(
    State(state): State<ForumState>,
    Path(board_slug): Path<String>,
    Query(params): Query<PageParams>,
    MaybeViewer(viewer): MaybeViewer,
) -> Response {
    let board = match get_messageboard_by_slug(state.db.pool(), &board_slug).await {
        Ok(Some(b)) => b,
        Ok(None) => return (StatusCode::NOT_FOUND, "Messageboard not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch messageboard: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let page = params.page.unwrap_or(1).max(1);
    let per_page = state.config.topics_per_page;
    let offset = (page - 1) * per_page;

    let topics = match list_topics(state.db.pool(), board.id, per_page, offset).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to list topics: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let total = match count_topics(state.db.pool(), board.id).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to count topics: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let mut rows = Vec::with_capacity(topics.len());
    for topic in topics {
        match resolve_topic_view(&state, &topic, viewer.as_ref()).await {
            Ok(view) => rows.push((topic, view)),
            Err(e) => {
                tracing::error!(topic_id = topic.id, "Failed to resolve topic view: {e}");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
            }
        }
    }

    render_topic_list_page(&TopicListParams {
        board: &board,
        rows: &rows,
        page,
        total_pages: pages_for(total, per_page),
        viewer: viewer.as_ref(),
    })
    .into_response()
}

async fn topic_show(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    Query(params): Query<PageParams>,
    MaybeViewer(viewer): MaybeViewer,
) -> Response {
    let (board, topic) = match load_board_topic(&state, &board_slug, &topic_slug).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    let page = params.page.unwrap_or(1).max(1);
    let per_page = state.config.posts_per_page;

    let posts = match list_posts_page(state.db.pool(), topic.id, page, per_page).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to list posts: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let total = match count_posts(state.db.pool(), topic.id).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to count posts: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    // Presentation reflects the state at arrival: badges and the deep link
    // are computed before this visit is recorded.
    let view = match resolve_topic_view(&state, &topic, viewer.as_ref()).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Failed to resolve topic view: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    // Record the view: the viewer has now seen everything up to the newest
    // post on this page. The upsert never moves read_at backward.
    if let Some(user) = &viewer {
        if let Some(newest) = posts.last() {
            if let Err(e) =
                upsert_read_state(state.db.pool(), user.id, topic.id, &newest.created_at, page)
                    .await
            {
                tracing::error!("Failed to record read state: {e}");
            }
        }
    }

    let follower_count = if state.config.show_followers {
        match count_followers(state.db.pool(), topic.id).await {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::error!("Failed to count followers: {e}");
                None
            }
        }
    } else {
        None
    };

    render_topic_page(&TopicPageParams {
        board: &board,
        topic: &topic,
        view: &view,
        posts: &posts,
        page,
        total_pages: pages_for(total, per_page),
        viewer: viewer.as_ref(),
        follower_count,
    })
    .into_response()
}

/// JSON topic listing for the board, with per-viewer states and deep links.
async fn api_topics(
    State(state): State<ForumState>,
    Path(board_slug): Path<String>,
    Query(params): Query<PageParams>,
    MaybeViewer(viewer): MaybeViewer,
) -> Response {
    let board = match get_messageboard_by_slug(state.db.pool(), &board_slug).await {
        Ok(Some(b)) => b,
        Ok(None) => return (StatusCode::NOT_FOUND, "Messageboard not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch messageboard: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let page = params.page.unwrap_or(1).max(1);
    let per_page = state.config.topics_per_page;

    let topics = match list_topics(state.db.pool(), board.id, per_page, (page - 1) * per_page).await
    {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to list topics: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let mut data = Vec::with_capacity(topics.len());
    for topic in topics {
        let view = match resolve_topic_view(&state, &topic, viewer.as_ref()).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(topic_id = topic.id, "Failed to resolve topic view: {e}");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
            }
        };
        data.push(serde_json::json!({
            "id": topic.id,
            "slug": topic.slug,
            "title": topic.title,
            "posts_count": topic.posts_count,
            "last_post_at": topic.last_post_at,
            "states": view.states.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            "path": urls::topic_path(&board.slug, &topic.slug, view.page, view.anchor),
        }));
    }

    let count = data.len();
    let response = serde_json::json!({
        "data": data,
        "page": page,
        "per_page": per_page,
        "count": count,
    });

    Json(response).into_response()
}

// ========== Forms ==========

#[derive(Debug, Deserialize)]
struct NewMessageboardForm {
    name: String,
    description: Option<String>,
}

async fn create_messageboard_handler(
    State(state): State<ForumState>,
    RequireViewer(user): RequireViewer,
    Form(form): Form<NewMessageboardForm>,
) -> Response {
    if !user.admin {
        return (StatusCode::FORBIDDEN, "Only admins can create messageboards").into_response();
    }
    if form.name.trim().is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, "Name is required").into_response();
    }

    let board = NewMessageboard {
        name: form.name.trim().to_string(),
        description: form
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    };

    match create_messageboard(state.db.pool(), &board).await {
        Ok(id) => {
            tracing::info!(messageboard_id = id, "Messageboard created");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create messageboard: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewTopicForm {
    title: String,
    content: String,
}

async fn create_topic_handler(
    State(state): State<ForumState>,
    Path(board_slug): Path<String>,
    RequireViewer(user): RequireViewer,
    Form(form): Form<NewTopicForm>,
) -> Response {
    let board = match get_messageboard_by_slug(state.db.pool(), &board_slug).await {
        Ok(Some(b)) => b,
        Ok(None) => return (StatusCode::NOT_FOUND, "Messageboard not found").into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch messageboard: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    if form.title.trim().is_empty() || form.content.trim().is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, "Title and post are required").into_response();
    }

    let topic = NewTopic {
        messageboard_id: board.id,
        title: form.title.trim().to_string(),
        user_id: Some(user.id),
        author_name: user.name.clone(),
        content: form.content.trim().to_string(),
    };

    let topic_id = match create_topic(state.db.pool(), &topic).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to create topic: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    if state.config.auto_follow_on_post {
        if let Err(e) =
            follow_topic(state.db.pool(), user.id, topic_id, FollowReason::Posted).await
        {
            tracing::error!("Failed to auto-follow new topic: {e}");
        }
    }

    tracing::info!(topic_id, messageboard_id = board.id, "Topic created");

    let created = match crate::db::get_topic(state.db.pool(), topic_id).await {
        Ok(Some(t)) => t,
        _ => return Redirect::to(&urls::messageboard_path(&board.slug)).into_response(),
    };
    Redirect::to(&urls::topic_path(&board.slug, &created.slug, 1, None)).into_response()
}

#[derive(Debug, Deserialize)]
struct NewPostForm {
    content: String,
}

async fn create_post_handler(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    RequireViewer(user): RequireViewer,
    Form(form): Form<NewPostForm>,
) -> Response {
    let (board, topic) = match load_board_topic(&state, &board_slug, &topic_slug).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    if topic.locked && !state.policy.can_moderate(&user, &topic) {
        return (StatusCode::FORBIDDEN, "This topic is locked").into_response();
    }
    if form.content.trim().is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, "Post content is required").into_response();
    }

    let post = NewPost {
        topic_id: topic.id,
        user_id: Some(user.id),
        author_name: user.name.clone(),
        content: form.content.trim().to_string(),
    };

    let post_id = match insert_post(state.db.pool(), &post).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to insert post: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    // The author has read their own post; move their read position forward
    // so the topic doesn't show as unread to them.
    let last_page = pages_for(topic.posts_count + 1, state.config.posts_per_page);
    if let Ok(Some(created)) = crate::db::get_post(state.db.pool(), post_id).await {
        if let Err(e) = upsert_read_state(
            state.db.pool(),
            user.id,
            topic.id,
            &created.created_at,
            last_page,
        )
        .await
        {
            tracing::error!("Failed to record read state for author: {e}");
        }
    }

    if state.config.auto_follow_on_post {
        if let Err(e) =
            follow_topic(state.db.pool(), user.id, topic.id, FollowReason::Posted).await
        {
            tracing::error!("Failed to auto-follow topic: {e}");
        }
    }

    Redirect::to(&urls::topic_path(&board.slug, &topic.slug, last_page, Some(post_id)))
        .into_response()
}

// ========== Follow / read-state actions ==========

async fn follow(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    RequireViewer(user): RequireViewer,
) -> Response {
    let (board, topic) = match load_board_topic(&state, &board_slug, &topic_slug).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    if let Err(e) = follow_topic(state.db.pool(), user.id, topic.id, FollowReason::Manual).await {
        tracing::error!("Failed to follow topic: {e}");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
    }

    Redirect::to(&urls::topic_path(&board.slug, &topic.slug, 1, None)).into_response()
}

async fn unfollow(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    RequireViewer(user): RequireViewer,
) -> Response {
    let (board, topic) = match load_board_topic(&state, &board_slug, &topic_slug).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    if let Err(e) = unfollow_topic(state.db.pool(), user.id, topic.id).await {
        tracing::error!("Failed to unfollow topic: {e}");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
    }

    Redirect::to(&urls::topic_path(&board.slug, &topic.slug, 1, None)).into_response()
}

#[derive(Debug, Deserialize)]
struct MarkUnreadForm {
    page: Option<i64>,
}

async fn mark_unread_handler(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug, post_id)): Path<(String, String, i64)>,
    RequireViewer(user): RequireViewer,
    Form(form): Form<MarkUnreadForm>,
) -> Response {
    let (board, topic) = match load_board_topic(&state, &board_slug, &topic_slug).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    let page = form.page.unwrap_or(1).max(1);
    if let Err(e) = mark_unread(state.db.pool(), user.id, topic.id, post_id, page).await {
        tracing::error!("Failed to mark post unread: {e}");
        return (StatusCode::UNPROCESSABLE_ENTITY, "Could not mark post unread").into_response();
    }

    // Back to the board so the topic row shows its fresh unread badge.
    Redirect::to(&urls::messageboard_path(&board.slug)).into_response()
}

// ========== Moderation ==========

async fn moderate(
    state: &ForumState,
    board_slug: &str,
    topic_slug: &str,
    user: &ForumUser,
    action: ModerationAction,
) -> Response {
    let (board, topic) = match load_board_topic(state, board_slug, topic_slug).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    if !state.policy.can_moderate(user, &topic) {
        return (StatusCode::FORBIDDEN, "Moderators only").into_response();
    }

    let result = match action {
        ModerationAction::Lock(locked) => set_topic_locked(state.db.pool(), topic.id, locked).await,
        ModerationAction::Stick(sticky) => {
            set_topic_sticky(state.db.pool(), topic.id, sticky).await
        }
        ModerationAction::Delete => delete_topic(state.db.pool(), topic.id).await,
    };

    if let Err(e) = result {
        tracing::error!(topic_id = topic.id, "Moderation action failed: {e}");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
    }

    tracing::info!(topic_id = topic.id, moderator = user.id, "Moderation action applied");

    Redirect::to(&urls::messageboard_path(&board.slug)).into_response()
}

enum ModerationAction {
    Lock(bool),
    Stick(bool),
    Delete,
}

async fn lock(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    RequireViewer(user): RequireViewer,
) -> Response {
    moderate(&state, &board_slug, &topic_slug, &user, ModerationAction::Lock(true)).await
}

async fn unlock(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    RequireViewer(user): RequireViewer,
) -> Response {
    moderate(&state, &board_slug, &topic_slug, &user, ModerationAction::Lock(false)).await
}

async fn stick(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    RequireViewer(user): RequireViewer,
) -> Response {
    moderate(&state, &board_slug, &topic_slug, &user, ModerationAction::Stick(true)).await
}

async fn unstick(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    RequireViewer(user): RequireViewer,
) -> Response {
    moderate(&state, &board_slug, &topic_slug, &user, ModerationAction::Stick(false)).await
}

async fn delete_topic_handler(
    State(state): State<ForumState>,
    Path((board_slug, topic_slug)): Path<(String, String)>,
    RequireViewer(user): RequireViewer,
) -> Response {
    moderate(&state, &board_slug, &topic_slug, &user, ModerationAction::Delete).await
}

// ========== Misc ==========

async fn health() -> &'static str {
    "OK"
}
