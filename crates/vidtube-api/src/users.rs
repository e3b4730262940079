use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use vidtube_db::StoreError;
use vidtube_types::api::{ChangePasswordRequest, Claims, UpdateAccountRequest};
use vidtube_types::models::Profile;

use crate::auth::{AppState, check_password, hash_password, password_matches};
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::{ok, run_blocking};
use crate::validate::{optional, required};

/// Channel page for `username` as seen by the caller.
pub async fn channel_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let username = required("username", &username)?.to_lowercase();
    let viewer = claims.sub;
    let profile = run_blocking(&state, move |db| db.channel_profile(&username, viewer)).await?;
    Ok(ok(profile, "User channel fetched successfully"))
}

pub async fn watch_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let history = run_blocking(&state, move |db| {
        db.watch_history(claims.sub).map_err(|e| match e {
            StoreError::NotFound(_) => StoreError::InvalidSubject,
            other => other,
        })
    })
    .await?;
    Ok(ok(history, "Watch history fetched successfully"))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let full_name = optional("fullName", req.full_name.as_deref())?;
    let avatar = optional("avatar", req.avatar.as_deref())?;
    if full_name.is_none() && avatar.is_none() {
        return Err(ApiError::Validation("fullName or avatar is required".into()));
    }

    let user = run_blocking(&state, move |db| {
        db.update_account(claims.sub, full_name.as_deref(), avatar.as_deref())
    })
    .await?;
    Ok(ok(Profile::from(user), "Account details updated successfully"))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_password(&req.new_password)?;
    let user_id = claims.sub;

    let stored = run_blocking(&state, move |db| db.password_hash(user_id))
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    if !password_matches(user_id, &req.old_password, &stored)? {
        return Err(ApiError::Validation("Invalid old password".into()));
    }

    let new_hash = hash_password(&req.new_password)?;
    run_blocking(&state, move |db| db.set_password(user_id, &new_hash)).await?;

    info!("Password changed for {}", user_id);
    Ok(ok(serde_json::json!({}), "Password changed successfully"))
}
