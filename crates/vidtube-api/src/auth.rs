use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, extract::State, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use vidtube_db::Database;
use vidtube_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest};
use vidtube_types::models::Profile;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::media::MediaClient;
use crate::validate::{optional, required};
use crate::{created, ok, run_blocking};

const MIN_PASSWORD_LEN: usize = 8;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub media: MediaClient,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = required("username", &req.username)?.to_lowercase();
    let full_name = required("fullName", &req.full_name)?;
    let avatar = optional("avatar", req.avatar.as_deref())?;

    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::Validation("Username must be 3-32 characters".into()));
    }
    check_password(&req.password)?;
    let password_hash = hash_password(&req.password)?;

    let user = run_blocking(&state, move |db| {
        db.create_user(&username, &full_name, avatar.as_deref(), &password_hash)
    })
    .await?;

    info!("Registered user {} ({})", user.username, user.id);
    Ok(created(Profile::from(user), "User registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = required("username", &req.username)?.to_lowercase();

    let (user, password_hash) = run_blocking(&state, move |db| db.get_user_credentials(&username))
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !password_matches(user.id, &req.password, &password_hash)? {
        return Err(ApiError::Unauthenticated);
    }

    let token = create_token(&state.jwt_secret, state.token_ttl_days, user.id, &user.username)
        .map_err(|e| {
            error!("Token encoding failed: {}", e);
            ApiError::Dependency("Failed to issue token".into())
        })?;

    Ok(ok(
        LoginResponse {
            user_id: user.id,
            username: user.username,
            token,
        },
        "User logged in successfully",
    ))
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |db| db.get_user(claims.sub))
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(ok(Profile::from(user), "Current user fetched successfully"))
}

pub(crate) fn check_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh salt.
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Dependency("Failed to hash password".into())
        })?;
    Ok(hash.to_string())
}

pub(crate) fn password_matches(
    user_id: Uuid,
    password: &str,
    stored_hash: &str,
) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Corrupt password hash for {}: {}", user_id, e);
        ApiError::Dependency("Failed to verify credentials".into())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_token(
    secret: &str,
    ttl_days: i64,
    user_id: Uuid,
    username: &str,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
