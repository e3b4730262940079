use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use vidtube_types::api::{Claims, CreatePlaylistRequest, DeleteConfirmation, UpdatePlaylistRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::validate::{optional, parse_id, required};
use crate::{created, ok, run_blocking};

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreatePlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = required("name", &req.name)?;
    let description = optional("description", req.description.as_deref())?.unwrap_or_default();

    let playlist = run_blocking(&state, move |db| {
        db.create_playlist(claims.sub, &name, &description)
    })
    .await?;

    info!("Playlist {} created by {}", playlist.id, playlist.owner_id);
    Ok(created(playlist, "Playlist created successfully"))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist_id = parse_id("playlist", &playlist_id)?;
    let playlist = run_blocking(&state, move |db| db.get_playlist(playlist_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Playlist not found".into()))?;
    Ok(ok(playlist, "Playlist fetched successfully"))
}

pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id("user", &user_id)?;
    let playlists = run_blocking(&state, move |db| db.user_playlists(user_id)).await?;
    Ok(ok(playlists, "Playlists fetched successfully"))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<UpdatePlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist_id = parse_id("playlist", &playlist_id)?;
    let name = optional("name", req.name.as_deref())?;
    let description = optional("description", req.description.as_deref())?;
    if name.is_none() && description.is_none() {
        return Err(ApiError::Validation("Name or description is required".into()));
    }

    let playlist = run_blocking(&state, move |db| {
        db.update_playlist(playlist_id, claims.sub, name.as_deref(), description.as_deref())
    })
    .await?;
    Ok(ok(playlist, "Playlist updated successfully"))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id("playlist", &playlist_id)?;
    run_blocking(&state, move |db| db.delete_playlist(id, claims.sub)).await?;
    Ok(ok(DeleteConfirmation { id, deleted: true }, "Playlist deleted successfully"))
}

pub async fn add_video(
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let playlist_id = parse_id("playlist", &playlist_id)?;
    let playlist = run_blocking(&state, move |db| {
        db.add_playlist_video(playlist_id, video_id, claims.sub)
    })
    .await?;
    Ok(ok(playlist, "Video added to playlist successfully"))
}

pub async fn remove_video(
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = parse_id("video", &video_id)?;
    let playlist_id = parse_id("playlist", &playlist_id)?;
    let playlist = run_blocking(&state, move |db| {
        db.remove_playlist_video(playlist_id, video_id, claims.sub)
    })
    .await?;
    Ok(ok(playlist, "Video removed from playlist successfully"))
}
