//! Posts API Endpoints
//!
//! Reads are open to everyone; premium bodies are withheld from callers the
//! policy does not allow. Writes need an access token and go through the
//! ownership rule.

use crate::app::AppState;
use crate::auth::middleware::{auth_middleware, optional_auth_middleware};
use crate::auth::models::{Identity, Role};
use crate::auth::policy::{authorize, enforce, require_role, Action, Decision, Resource};
use crate::error::ApiError;
use crate::posts::models::{CreatePostRequest, Post, PostView, UpdatePostRequest};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

pub fn posts_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/:id", get(get_post))
        .route_layer(middleware::from_fn_with_state(
            state.codec.clone(),
            optional_auth_middleware,
        ));

    let protected = Router::new()
        .route("/api/posts", post(create_post))
        .route("/api/posts/:id", put(update_post).delete(delete_post))
        .route("/api/posts/creator/my-posts", get(my_posts))
        .route_layer(middleware::from_fn_with_state(
            state.codec.clone(),
            auth_middleware,
        ));

    public.merge(protected)
}

fn view_for(identity: Option<&Identity>, post: Post) -> PostView {
    let resource = Resource::authored(&post.author_id, post.is_paid);
    match authorize(identity, &resource, Action::Read) {
        Decision::Allow => PostView::full(post),
        Decision::Redact | Decision::Deny => PostView::redacted(post),
    }
}

/// GET /api/posts
pub async fn list_posts(
    State(state): State<AppState>,
    identity: Option<Identity>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let posts = state.posts.list_all()?;
    let views = posts
        .into_iter()
        .map(|post| view_for(identity.as_ref(), post))
        .collect();
    Ok(Json(views))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    identity: Option<Identity>,
    Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    let post = state.posts.find_by_id(&id)?.ok_or(ApiError::NotFound("Post"))?;
    Ok(Json(view_for(identity.as_ref(), post)))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let Json(payload) = payload?;
    enforce(authorize(
        Some(&identity),
        &Resource::unowned(),
        Action::Create,
    ))?;

    let title = payload.title.as_deref().map(str::trim).unwrap_or_default();
    let content = payload.content.as_deref().unwrap_or_default();
    if title.is_empty() || content.trim().is_empty() {
        return Err(ApiError::bad_request("title and content are required"));
    }

    let post = state
        .posts
        .create(&identity.id, title, content, payload.is_paid_content)?;

    Ok((StatusCode::CREATED, Json(PostView::full(post))))
}

/// PUT /api/posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<PostView>, ApiError> {
    let Json(payload) = payload?;
    let post = state.posts.find_by_id(&id)?.ok_or(ApiError::NotFound("Post"))?;
    enforce(authorize(
        Some(&identity),
        &Resource::authored(&post.author_id, post.is_paid),
        Action::Update,
    ))?;

    if payload.is_empty() {
        return Ok(Json(PostView::full(post)));
    }
    if payload.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::bad_request("title cannot be empty"));
    }
    if payload.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
        return Err(ApiError::bad_request("content cannot be empty"));
    }

    let updated = state
        .posts
        .update(&id, &payload)?
        .ok_or(ApiError::NotFound("Post"))?;

    info!("✏️ Post {} updated by {}", id, identity.id);
    Ok(Json(PostView::full(updated)))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let post = state.posts.find_by_id(&id)?.ok_or(ApiError::NotFound("Post"))?;
    enforce(authorize(
        Some(&identity),
        &Resource::authored(&post.author_id, post.is_paid),
        Action::Delete,
    ))?;

    if !state.posts.delete(&id)? {
        return Err(ApiError::NotFound("Post"));
    }

    Ok(Json(json!({ "message": "Post deleted" })))
}

/// GET /api/posts/creator/my-posts
pub async fn my_posts(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<PostView>>, ApiError> {
    require_role(&identity, &[Role::Creator])?;

    let posts = state.posts.list_by_author(&identity.id)?;
    Ok(Json(posts.into_iter().map(PostView::full).collect()))
}
