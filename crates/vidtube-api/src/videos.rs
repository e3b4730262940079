use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use vidtube_db::models::{NewVideo, VideoChanges};
use vidtube_types::api::{Claims, DeleteConfirmation, PublishVideoRequest, UpdateVideoRequest};
use vidtube_types::query::VideoListQuery;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, QueryParams};
use crate::validate::{media_asset, optional, parse_id, required};
use crate::{created, ok, run_blocking};

pub async fn list_videos(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<VideoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let videos = run_blocking(&state, move |db| db.list_videos(&query)).await?;
    Ok(ok(videos, "Videos fetched successfully"))
}

/// Create a video record from descriptors the media service already returned.
pub async fn publish_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<PublishVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !req.duration.is_finite() || req.duration < 0.0 {
        return Err(ApiError::Validation("Duration must be a non-negative number".into()));
    }
    let new = NewVideo {
        title: required("title", &req.title)?,
        description: required("description", &req.description)?,
        video_file: media_asset("videoFile", &req.video_file)?,
        thumbnail: media_asset("thumbnail", &req.thumbnail)?,
        duration: req.duration,
        is_published: req.is_published,
    };

    let video = run_blocking(&state, move |db| db.insert_video(claims.sub, new)).await?;
    info!("Video {} published by {}", video.id, video.owner_id);
    Ok(created(video, "Video published successfully"))
}

/// Fetch a video, counting the view and adding it to the caller's watch history.
/// Unpublished videos are only visible to their owner.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let viewer = claims.sub;

    let video = run_blocking(&state, move |db| db.record_view(video_id, viewer))
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".into()))?;

    Ok(ok(video, "Video fetched successfully"))
}

pub async fn update_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<UpdateVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let changes = VideoChanges {
        title: optional("title", req.title.as_deref())?,
        description: optional("description", req.description.as_deref())?,
        thumbnail: req
            .thumbnail
            .as_ref()
            .map(|t| media_asset("thumbnail", t))
            .transpose()?,
    };
    if changes.title.is_none() && changes.description.is_none() && changes.thumbnail.is_none() {
        return Err(ApiError::Validation("At least one field to update is required".into()));
    }

    let (video, replaced) =
        run_blocking(&state, move |db| db.update_video(video_id, claims.sub, changes)).await?;

    if let Some(old_thumbnail) = replaced {
        state.media.release(&[old_thumbnail]).await;
    }
    Ok(ok(video, "Video updated successfully"))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id("video", &video_id)?;
    let video = run_blocking(&state, move |db| db.delete_video(id, claims.sub)).await?;

    state.media.release(&[video.video_file, video.thumbnail]).await;
    info!("Video {} deleted by {}", id, claims.sub);
    Ok(ok(DeleteConfirmation { id, deleted: true }, "Video deleted successfully"))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let video = run_blocking(&state, move |db| db.toggle_publish(video_id, claims.sub)).await?;
    Ok(ok(video, "Video publish status updated"))
}
