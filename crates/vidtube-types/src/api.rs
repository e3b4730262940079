use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::MediaAsset;

// -- JWT Claims --

/// Claims issued at login and trusted verbatim by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Response envelope --

/// Every handler answers with this envelope: status, payload and a human message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(status_code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data,
            message: message.into(),
            success: status_code < 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfirmation {
    pub id: Uuid,
    pub deleted: bool,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Playlists --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// -- Tweets & comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentRequest {
    pub content: String,
}

// -- Videos --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublishVideoRequest {
    pub title: String,
    pub description: String,
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    #[serde(default)]
    pub duration: f64,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaAsset>,
}
