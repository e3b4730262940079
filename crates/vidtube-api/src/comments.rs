use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};

use vidtube_types::api::{Claims, ContentRequest, DeleteConfirmation};
use vidtube_types::query::{Page, PageQuery};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, QueryParams};
use crate::validate::{parse_id, required};
use crate::{created, ok, run_blocking};

pub async fn video_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let page = Page::new(query.page, query.limit);
    let comments = run_blocking(&state, move |db| db.video_comments(video_id, page)).await?;
    Ok(ok(comments, "Video comments fetched successfully"))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let content = required("content", &req.content)?;
    let comment = run_blocking(&state, move |db| {
        db.create_comment(claims.sub, video_id, &content)
    })
    .await?;
    Ok(created(comment, "Comment added successfully"))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = parse_id("comment", &comment_id)?;
    let content = required("content", &req.content)?;
    let comment = run_blocking(&state, move |db| {
        db.update_comment(comment_id, claims.sub, Some(&content))
    })
    .await?;
    Ok(ok(comment, "Comment updated successfully"))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id("comment", &comment_id)?;
    run_blocking(&state, move |db| db.delete_comment(id, claims.sub)).await?;
    Ok(ok(DeleteConfirmation { id, deleted: true }, "Comment deleted successfully"))
}
