use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};

use crate::user::ForumUser;

/// Current forum viewer (if any).
/// Use this extractor when signed-in state is optional.
///
/// The host application authenticates the request however it likes and
/// inserts a [`ForumUser`] into the request extensions before the router
/// sees it. No extension means an anonymous viewer.
#[derive(Debug, Clone)]
pub struct MaybeViewer(pub Option<ForumUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeViewer
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<ForumUser>().cloned()))
    }
}

/// Current forum viewer (required).
/// Use this extractor for actions that need an identity to record against.
/// Returns 401 Unauthorized when the host supplied none.
#[derive(Debug, Clone)]
pub struct RequireViewer(pub ForumUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireViewer
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeViewer(viewer) = MaybeViewer::from_request_parts(parts, state).await?;

        match viewer {
            Some(u) => Ok(Self(u)),
            None => Err((StatusCode::UNAUTHORIZED, "Sign in to do that").into_response()),
        }
    }
}
